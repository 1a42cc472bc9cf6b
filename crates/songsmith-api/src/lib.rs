//! Generation API bridge for songsmith
//!
//! This crate talks to the hosted generation services and waits for their jobs:
//! - Sonauto: song generation and audio inpainting
//! - Lemon Slice: singing avatar video generation
//!
//! Every service follows the same submit / poll / fetch shape. Submitting
//! returns a [`JobId`], the [`JobPoller`] queries the service through its
//! [`JobBackend`] implementation until the job is terminal, and the
//! [`ArtifactFetcher`] writes the resulting media file to disk.

mod error;
mod fetch;
mod http;
mod job;
pub mod lemonslice;
mod poller;
pub mod sonauto;

pub use error::{ApiError, ApiResult, PollError};
pub use fetch::ArtifactFetcher;
pub use http::build_client;
pub use job::{Artifact, ArtifactKind, JobBackend, JobId, JobState, JobStatus};
pub use lemonslice::{LemonSliceClient, VideoRequest};
pub use poller::{JobPoller, PollConfig};
pub use sonauto::{InpaintRequest, SongRequest, SongResult, SonautoClient};
