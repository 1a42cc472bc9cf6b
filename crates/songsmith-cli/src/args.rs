use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "songsmith")]
#[command(author, version, about = "Songs, singing telegrams and AI transitions from hosted generation APIs")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory for generated files
    #[arg(short, long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Seconds between job status checks
    #[arg(long, global = true, value_name = "SECS")]
    pub poll_interval: Option<f64>,

    /// Give up on a generation job after this many seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a song from a text prompt
    Song(SongArgs),

    /// Generate a personalized song and a video of a character singing it
    Telegram(TelegramArgs),

    /// Join two YouTube songs with an AI-generated transition
    Transition(TransitionArgs),

    /// Check external tools and API keys
    Doctor,

    /// Show configuration
    Config,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SongArgs {
    /// What the song should be about
    #[arg(short, long)]
    pub prompt: Option<String>,

    /// Output file (default: song_<task id>.<ext> in the output directory)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct TelegramArgs {
    /// Who the telegram is for
    #[arg(long)]
    pub recipient: String,

    /// Occasion, also used to pick the character image
    #[arg(long)]
    pub occasion: String,

    /// What the song should mention
    #[arg(long)]
    pub message: String,

    /// Musical style
    #[arg(long, default_value = songsmith_core::telegram::DEFAULT_STYLE)]
    pub style: String,

    /// Character image to animate instead of the configured one
    #[arg(long)]
    pub image_url: Option<String>,

    /// Video height in pixels (default from config, 320)
    #[arg(long)]
    pub resolution: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct TransitionArgs {
    /// YouTube URL or video id of the first song
    pub first: String,

    /// YouTube URL or video id of the second song
    pub second: String,

    /// Seconds kept from each song (default from config, 45)
    #[arg(long, value_name = "SECS")]
    pub song_duration: Option<f64>,

    /// Seconds of silence for the transition (default from config, 5)
    #[arg(long, value_name = "SECS")]
    pub silence: Option<f64>,

    /// Seconds cut from the end of the first song
    #[arg(long, value_name = "SECS", default_value = "0")]
    pub trim_from_end: f64,

    /// Seconds cut from the start of the second song
    #[arg(long, value_name = "SECS", default_value = "0")]
    pub trim_to_start: f64,

    /// Output file (default: transition_<task id>.<ext> in the output directory)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Where to keep the spliced audio sent for inpainting
    #[arg(long)]
    pub pre_inpaint_output: Option<PathBuf>,
}
