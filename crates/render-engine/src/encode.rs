//! Fixed encode parameters shared by every pass.

use freepoop_common::config::RenderDefaults;

/// Canonical intermediate/final encode settings.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub sample_rate: u32,
    pub crf: u32,
    pub preset: String,
    pub audio_bitrate_kbps: u32,
    pub tint_color: String,
    pub still_image_secs: f64,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self::from(&RenderDefaults::default())
    }
}

impl From<&RenderDefaults> for EncodeSettings {
    fn from(defaults: &RenderDefaults) -> Self {
        Self {
            width: defaults.width,
            height: defaults.height,
            fps: defaults.fps,
            sample_rate: defaults.sample_rate,
            crf: defaults.video_crf,
            preset: defaults.video_preset.clone(),
            audio_bitrate_kbps: defaults.audio_bitrate_kbps,
            tint_color: defaults.tint_color.clone(),
            still_image_secs: defaults.still_image_secs,
        }
    }
}

impl EncodeSettings {
    pub fn size(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }

    pub fn video_codec_args(&self) -> Vec<String> {
        vec![
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
        ]
    }

    pub fn audio_codec_args(&self) -> Vec<String> {
        vec![
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            format!("{}k", self.audio_bitrate_kbps),
            "-ar".to_string(),
            self.sample_rate.to_string(),
            "-ac".to_string(),
            "2".to_string(),
        ]
    }

    /// Round odd frame sizes down to even ones. `yuv420p` encodes reject
    /// odd widths and heights.
    pub fn even_dimensions_filter(&self) -> &'static str {
        "scale=trunc(iw/2)*2:trunc(ih/2)*2"
    }

    /// Scale into the target box keeping aspect ratio; never pads.
    pub fn fit_filter(&self) -> String {
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease:force_divisible_by=2,setsar=1,fps={fps},format=yuv420p",
            w = self.width,
            h = self.height,
            fps = self.fps,
        )
    }

    /// Fit into the target box and pad to exactly the box. Used only where
    /// the concat filter needs identical frame sizes.
    pub fn canvas_filter(&self) -> String {
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease:force_divisible_by=2,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps},format=yuv420p",
            w = self.width,
            h = self.height,
            fps = self.fps,
        )
    }

    /// Pin audio to the canonical sample rate and stereo layout.
    pub fn audio_format_filter(&self) -> String {
        format!(
            "aformat=sample_rates={}:channel_layouts=stereo",
            self.sample_rate
        )
    }

    /// Silent stereo source at the canonical sample rate.
    pub fn silence_source(&self) -> String {
        format!(
            "anullsrc=channel_layout=stereo:sample_rate={}",
            self.sample_rate
        )
    }

    /// Solid black canvas at the target size.
    pub fn canvas_source(&self) -> String {
        format!("color=c=black:s={}:r={}", self.size(), self.fps)
    }

    /// Full-frame translucent tint layer.
    pub fn tint_source(&self) -> String {
        format!("color=c={}:s={}:r={}", self.tint_color, self.size(), self.fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_render_defaults() {
        let settings = EncodeSettings::default();
        assert_eq!(settings.size(), "1280x720");
        assert_eq!(settings.sample_rate, 44100);
        assert_eq!(settings.tint_source(), "color=c=green@0.14:s=1280x720:r=30");
    }

    #[test]
    fn test_fit_filter_does_not_pad() {
        let settings = EncodeSettings::default();
        assert!(settings.fit_filter().contains("force_original_aspect_ratio=decrease"));
        assert!(!settings.fit_filter().contains("pad="));
        assert!(settings.canvas_filter().contains("pad=1280:720"));
    }
}
