//! Error types for songsmith-core

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SongsmithError>;

#[derive(Error, Debug)]
pub enum SongsmithError {
    #[error("Download failed: {0}")]
    Download(#[from] DownloadError),

    #[error("Audio probe failed: {0}")]
    Probe(#[from] ProbeError),

    #[error("Splice failed: {0}")]
    Splice(#[from] SpliceError),

    #[error("API request failed: {0}")]
    Api(#[from] songsmith_api::ApiError),

    #[error("Generation did not complete: {0}")]
    Poll(#[from] songsmith_api::PollError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("yt-dlp not found. Install with: brew install yt-dlp")]
    YtDlpNotFound,

    #[error("yt-dlp failed with exit code: {0:?}")]
    YtDlpFailed(Option<i32>),

    #[error("Not a YouTube URL or video id: {0}")]
    InvalidUrl(String),

    #[error("Video unavailable or private: {0}")]
    VideoUnavailable(String),

    #[error("yt-dlp finished but {0} was not produced")]
    NoAudioFile(PathBuf),

    #[error("Failed to parse metadata: {0}")]
    MetadataParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("FFmpeg not found. Install with: brew install ffmpeg")]
    FfmpegNotFound,

    #[error("Could not read a duration for {0}")]
    DurationNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum SpliceError {
    #[error("Invalid splice: {0}")]
    InvalidPlan(String),

    #[error("FFmpeg failed with exit code: {0:?}")]
    FfmpegFailed(Option<i32>),

    #[error("Splice is {size_mb:.2} MB even after reduction (limit {limit_mb:.0} MB)")]
    TooLarge { size_mb: f64, limit_mb: f64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(String),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),

    #[error("{service} API key missing. Set {env} in the environment or a .env file")]
    MissingApiKey {
        service: &'static str,
        env: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
