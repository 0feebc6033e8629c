//! Check external tool availability.

use std::path::Path;

use freepoop_common::config::{config_file_path, AppConfig};
use freepoop_render_engine::toolchain::command_exists;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("FreePoop System Check");
    println!("{}", "=".repeat(50));
    println!("Config: {}", config_file_path().display());
    println!();

    let tools: [(&str, &Path, bool); 4] = [
        ("ffmpeg", config.toolchain.ffmpeg.as_path(), true),
        ("ffprobe", config.toolchain.ffprobe.as_path(), true),
        ("ffplay", config.toolchain.ffplay.as_path(), false),
        ("yt-dlp", config.toolchain.yt_dlp.as_path(), false),
    ];

    let mut all_required_ok = true;
    for (label, binary, required) in tools {
        let found = command_exists(binary);
        let tag = match (found, required) {
            (true, _) => "[OK]",
            (false, true) => "[MISSING]",
            (false, false) => "[WARN]",
        };
        println!("{tag} {label}: {}", binary.display());
        if !found && required {
            all_required_ok = false;
        }
    }

    println!();
    println!(
        "Render defaults: {} @ {}fps, {} Hz audio, tint {}",
        config.render.size(),
        config.render.fps,
        config.render.sample_rate,
        config.render.tint_color
    );

    println!();
    if all_required_ok {
        println!("All required tools are available. FreePoop is ready.");
    } else {
        println!("Some required tools are missing. Install ffmpeg (includes ffprobe).");
    }
    if !command_exists(&config.toolchain.yt_dlp) {
        println!("Without yt-dlp, remote references fall back to plain HTTP downloads.");
    }

    Ok(())
}
