//! FreePoop CLI — Build projects and render them into one video.
//!
//! Usage:
//!   freepoop init <PROJECT>                 Create an empty project file
//!   freepoop add <PROJECT> <KIND> <PATHS>   Add local materials
//!   freepoop add-extra <PROJECT> <REFS>     Add URLs or local paths
//!   freepoop info <PROJECT>                 Show project information
//!   freepoop validate <PROJECT>             Validate a project file
//!   freepoop render <PROJECT> -o <OUT>      Render a project
//!   freepoop preview <PATH|URL>             Preview one media file
//!   freepoop fetch <URL>                    Download a remote reference
//!   freepoop check                          Check external tools

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use freepoop_common::config::AppConfig;
use freepoop_project_model::MaterialKind;

mod commands;

#[derive(Parser)]
#[command(
    name = "freepoop",
    about = "Chaotic video collages from your media, rendered with ffmpeg",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new empty project file
    Init {
        /// Path of the project file to create
        path: PathBuf,

        /// Project name (defaults to the file stem)
        #[arg(short, long)]
        name: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Add local materials to a category
    Add {
        /// Path to the project file
        project: PathBuf,

        /// Material category: video, overlay, audio, sound, gif
        kind: MaterialKind,

        /// Files to add
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Add extra references (URLs or local paths)
    AddExtra {
        /// Path to the project file
        project: PathBuf,

        /// References to add
        #[arg(required = true)]
        references: Vec<String>,
    },

    /// Remove a material by category and zero-based index
    Remove {
        /// Path to the project file
        project: PathBuf,

        /// Material category
        kind: MaterialKind,

        /// Zero-based index within the category
        index: usize,
    },

    /// Remove an extra reference by zero-based index
    RemoveExtra {
        /// Path to the project file
        project: PathBuf,

        /// Zero-based index
        index: usize,
    },

    /// Show project information
    Info {
        /// Path to the project file
        project: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a project file
    Validate {
        /// Path to the project file
        project: PathBuf,
    },

    /// Render a project to a video file
    Render(RenderArgs),

    /// Preview a local file or remote reference
    Preview {
        /// File path or URL
        target: String,

        /// Seconds to play
        #[arg(short, long, default_value = "6")]
        duration: f64,
    },

    /// Download a remote reference
    Fetch {
        /// URL to download
        url: String,

        /// Destination directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Check external tool availability
    Check,
}

/// Render options. Effect flags override the project file.
#[derive(Args)]
pub struct RenderArgs {
    /// Path to the project file
    pub project: PathBuf,

    /// Output file path (extension picks the container)
    #[arg(short, long, default_value = "output.mp4")]
    pub output: PathBuf,

    /// Seed for shuffle and random per-clip choices
    #[arg(long)]
    pub seed: Option<u64>,

    /// Maximum number of sources kept
    #[arg(long)]
    pub clips: Option<u32>,

    /// Duplicate every clip in place
    #[arg(long)]
    pub stutter: bool,

    /// Reverse every clip
    #[arg(long)]
    pub reverse: bool,

    /// Shuffle sources before truncation
    #[arg(long)]
    pub scramble: bool,

    /// Boost loudness
    #[arg(long)]
    pub earrape: bool,

    /// Composite a translucent tint over the result
    #[arg(long)]
    pub overlay: bool,

    /// Random cosmetic filter per clip
    #[arg(long)]
    pub glitch: bool,

    /// Random forward/reverse bounce per clip
    #[arg(long)]
    pub bounce: bool,

    /// Pitch shift in semitones (-12..=12)
    #[arg(long, allow_hyphen_values = true)]
    pub pitch: Option<i32>,

    /// Keep clip speed when pitch shifting
    #[arg(long)]
    pub preserve_speed: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load();
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    freepoop_common::logging::init_logging(&config.logging);
    tracing::debug!(
        config = %freepoop_common::config::config_file_path().display(),
        "Loaded configuration"
    );
    config.validate()?;

    match cli.command {
        Commands::Init { path, name, force } => commands::init::run(path, name, force),
        Commands::Add {
            project,
            kind,
            paths,
        } => commands::add::run(project, kind, paths),
        Commands::AddExtra {
            project,
            references,
        } => commands::add::run_extra(project, references),
        Commands::Remove {
            project,
            kind,
            index,
        } => commands::remove::run(project, kind, index),
        Commands::RemoveExtra { project, index } => commands::remove::run_extra(project, index),
        Commands::Info { project, json } => commands::info::run(project, json),
        Commands::Validate { project } => commands::validate::run(project),
        Commands::Render(args) => commands::render::run(config, args).await,
        Commands::Preview { target, duration } => {
            commands::preview::run(config, target, duration).await
        }
        Commands::Fetch { url, output } => commands::fetch::run(config, url, output).await,
        Commands::Check => commands::check::run(&config),
    }
}
