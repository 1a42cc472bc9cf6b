//! songsmith-core: Song, singing telegram and transition workflows

pub mod config;
pub mod downloader;
pub mod error;
pub mod pipeline;
pub mod probe;
pub mod song;
pub mod splicer;
pub mod telegram;
pub mod transition;

pub use config::Config;
pub use error::{Result, SongsmithError};
pub use pipeline::{Pipeline, PipelineStage};
pub use song::{SongOptions, SongOutcome};
pub use telegram::{TelegramOrder, TelegramOutcome};
pub use transition::{TransitionOptions, TransitionOutcome};
