//! Effect filter expressions.
//!
//! Pure builders from effect parameters to ffmpeg filter-graph strings.

use freepoop_project_model::CosmeticFilter;

/// Bounds of the `atempo` primitive.
pub const ATEMPO_MIN: f64 = 0.5;
pub const ATEMPO_MAX: f64 = 2.0;

/// Tremolo decoration: ~8 Hz, depth 0.55.
pub const TREMOLO_FILTER: &str = "tremolo=f=8:d=0.55";

/// Per-clip probability of the tremolo decoration.
pub const TREMOLO_PROBABILITY: f64 = 0.12;

/// Loudness boost gain.
pub const EARRAPE_GAIN: u32 = 6;

const PIXELATE_FACTOR: u32 = 16;
const EMBOSS_KERNEL: &str = "-2 -1 0 -1 1 1 0 1 2";

/// Frequency ratio for a shift of `semitones`.
pub fn pitch_ratio(semitones: i32) -> f64 {
    2f64.powf(f64::from(semitones) / 12.0)
}

/// Split a tempo factor into a chain of `atempo`-legal factors.
///
/// Emits 2.0 or 0.5 steps until the remainder fits the band, then the
/// remainder rounded to 6 decimals. A factor of exactly 1 yields an empty
/// chain. Non-finite or non-positive input yields an empty chain.
pub fn tempo_factors(factor: f64) -> Vec<f64> {
    let mut factors = Vec::new();
    if !factor.is_finite() || factor <= 0.0 {
        return factors;
    }

    let mut remaining = factor;
    while remaining > ATEMPO_MAX {
        factors.push(ATEMPO_MAX);
        remaining /= ATEMPO_MAX;
    }
    while remaining < ATEMPO_MIN {
        factors.push(ATEMPO_MIN);
        remaining /= ATEMPO_MIN;
    }

    let residual = round6(remaining).clamp(ATEMPO_MIN, ATEMPO_MAX);
    if (residual - 1.0).abs() > f64::EPSILON {
        factors.push(residual);
    }
    factors
}

/// Pitch-shift chain, or `None` for zero semitones.
///
/// `asetrate` shifts pitch and speed together; with `preserve_speed` a tempo
/// chain of `1/ratio` restores the original duration.
pub fn pitch_filter(semitones: i32, preserve_speed: bool, sample_rate: u32) -> Option<String> {
    if semitones == 0 {
        return None;
    }

    let ratio = pitch_ratio(semitones);
    let shifted_rate = (f64::from(sample_rate) * ratio).round() as u64;
    let mut stages = vec![
        format!("aresample={sample_rate}"),
        format!("asetrate={shifted_rate}"),
        format!("aresample={sample_rate}"),
    ];

    if preserve_speed {
        // Correct against the rate actually applied, not the ideal ratio.
        let effective = shifted_rate as f64 / f64::from(sample_rate);
        stages.extend(
            tempo_factors(1.0 / effective)
                .into_iter()
                .map(|f| format!("atempo={}", format_factor(f))),
        );
    }

    Some(stages.join(","))
}

/// Full per-clip audio chain in fixed order: pitch, tremolo, loudness.
pub fn audio_chain(
    semitones: i32,
    preserve_speed: bool,
    tremolo: bool,
    earrape: bool,
    sample_rate: u32,
) -> Option<String> {
    let mut stages = Vec::new();
    if let Some(pitch) = pitch_filter(semitones, preserve_speed, sample_rate) {
        stages.push(pitch);
    }
    if tremolo {
        stages.push(TREMOLO_FILTER.to_string());
    }
    if earrape {
        stages.push(format!("volume={EARRAPE_GAIN}"));
    }

    if stages.is_empty() {
        None
    } else {
        Some(stages.join(","))
    }
}

/// Filter-graph fragment for a cosmetic video filter.
///
/// The mirror filters use internal labels and must sit inside a
/// `-filter_complex` chain.
pub fn cosmetic_filter(filter: CosmeticFilter) -> String {
    match filter {
        CosmeticFilter::Pixelate => format!(
            "scale=iw/{f}:ih/{f}:flags=neighbor,scale=iw*{f}:ih*{f}:flags=neighbor",
            f = PIXELATE_FACTOR
        ),
        CosmeticFilter::Degrade => "noise=alls=40:allf=t+u,hue=s=0.35".to_string(),
        CosmeticFilter::Emboss => {
            let planes = vec![EMBOSS_KERNEL; 4].join(":");
            format!("convolution={planes}")
        }
        CosmeticFilter::MirrorHorizontal => "split[mirror_a][mirror_b];\
             [mirror_a]crop=iw/2:ih:0:0[mirror_l];\
             [mirror_b]crop=iw/2:ih:0:0,hflip[mirror_r];\
             [mirror_l][mirror_r]hstack"
            .to_string(),
        CosmeticFilter::MirrorVertical => "split[mirror_a][mirror_b];\
             [mirror_a]crop=iw:ih/2:0:0[mirror_t];\
             [mirror_b]crop=iw:ih/2:0:0,vflip[mirror_u];\
             [mirror_t][mirror_u]vstack"
            .to_string(),
    }
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

fn format_factor(value: f64) -> String {
    let text = format!("{value:.6}");
    let text = text.trim_end_matches('0');
    text.strip_suffix('.').unwrap_or(text).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parse_atempo(chain: &str) -> Vec<f64> {
        chain
            .split(',')
            .filter_map(|stage| stage.strip_prefix("atempo="))
            .map(|f| f.parse::<f64>().unwrap())
            .collect()
    }

    #[test]
    fn test_zero_semitones_is_identity() {
        assert_eq!(pitch_filter(0, false, 44100), None);
        assert_eq!(pitch_filter(0, true, 44100), None);
        assert_eq!(audio_chain(0, true, false, false, 44100), None);
    }

    #[test]
    fn test_octave_up_with_speed_preserved() {
        let chain = pitch_filter(12, true, 44100).unwrap();
        assert_eq!(
            chain,
            "aresample=44100,asetrate=88200,aresample=44100,atempo=0.5"
        );
    }

    #[test]
    fn test_pitch_without_preserve_has_no_tempo() {
        let chain = pitch_filter(-5, false, 44100).unwrap();
        assert!(chain.starts_with("aresample=44100,asetrate="));
        assert!(!chain.contains("atempo"));
    }

    #[test]
    fn test_tempo_factors_decompose_large_values() {
        assert_eq!(tempo_factors(4.0), vec![2.0, 2.0]);
        assert_eq!(tempo_factors(0.2), vec![0.5, 0.5, 0.8]);
        assert!(tempo_factors(1.0).is_empty());
        assert!(tempo_factors(f64::NAN).is_empty());
        assert!(tempo_factors(-1.0).is_empty());
    }

    #[test]
    fn test_audio_chain_order() {
        let chain = audio_chain(3, false, true, true, 44100).unwrap();
        let pitch = chain.find("asetrate").unwrap();
        let tremolo = chain.find("tremolo").unwrap();
        let volume = chain.find("volume=6").unwrap();
        assert!(pitch < tremolo && tremolo < volume);
        assert!(chain.ends_with("volume=6"));
    }

    #[test]
    fn test_cosmetic_filters_use_expected_primitives() {
        assert!(cosmetic_filter(CosmeticFilter::Pixelate).contains("flags=neighbor"));
        assert!(cosmetic_filter(CosmeticFilter::Degrade).starts_with("noise="));
        assert_eq!(
            cosmetic_filter(CosmeticFilter::Emboss).matches(EMBOSS_KERNEL).count(),
            4
        );
        let mirror_h = cosmetic_filter(CosmeticFilter::MirrorHorizontal);
        assert!(mirror_h.contains("hflip") && mirror_h.ends_with("hstack"));
        let mirror_v = cosmetic_filter(CosmeticFilter::MirrorVertical);
        assert!(mirror_v.contains("vflip") && mirror_v.ends_with("vstack"));
    }

    #[test]
    fn test_format_factor_trims_zeros() {
        assert_eq!(format_factor(0.5), "0.5");
        assert_eq!(format_factor(2.0), "2");
        assert_eq!(format_factor(0.840896), "0.840896");
    }

    proptest! {
        #[test]
        fn prop_tempo_chain_restores_speed(semitones in -12i32..=12) {
            prop_assume!(semitones != 0);
            let ratio = pitch_ratio(semitones);
            let chain = pitch_filter(semitones, true, 44100).unwrap();
            let factors = parse_atempo(&chain);

            for f in &factors {
                prop_assert!((ATEMPO_MIN..=ATEMPO_MAX).contains(f));
            }
            let product: f64 = factors.iter().product();
            let expected = 1.0 / ratio;
            prop_assert!(((product - expected) / expected).abs() < 1e-4);
        }

        #[test]
        fn prop_tempo_factors_stay_in_band(factor in 0.01f64..100.0) {
            let factors = tempo_factors(factor);
            for f in &factors {
                prop_assert!((ATEMPO_MIN..=ATEMPO_MAX).contains(f));
            }
            let product: f64 = factors.iter().product();
            prop_assert!(((product - factor) / factor).abs() < 1e-4);
        }
    }
}
