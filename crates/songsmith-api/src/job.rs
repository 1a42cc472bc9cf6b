//! Remote job model shared by every generation backend

use crate::error::ApiResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Opaque identifier of a job owned by a remote service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Processing,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Succeeded => write!(f, "succeeded"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One observation of a remote job.
///
/// Non-terminal states carry the raw status label reported by the service
/// (e.g. `GENERATING`), which is what users want to see while waiting.
#[derive(Debug, Clone, PartialEq)]
pub enum JobState<T> {
    Queued(String),
    Processing(String),
    Succeeded(T),
    Failed(String),
}

impl<T> JobState<T> {
    pub fn status(&self) -> JobStatus {
        match self {
            JobState::Queued(_) => JobStatus::Queued,
            JobState::Processing(_) => JobStatus::Processing,
            JobState::Succeeded(_) => JobStatus::Succeeded,
            JobState::Failed(_) => JobStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Audio,
    Video,
}

impl ArtifactKind {
    fn default_extension(&self) -> &'static str {
        match self {
            ArtifactKind::Audio => "ogg",
            ArtifactKind::Video => "mp4",
        }
    }
}

/// A media file produced by a finished job, referenced by URL until fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub url: String,
    pub kind: ArtifactKind,
}

impl Artifact {
    pub fn audio(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: ArtifactKind::Audio,
        }
    }

    pub fn video(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: ArtifactKind::Video,
        }
    }

    /// File extension taken from the URL path, falling back to the kind's default
    pub fn extension(&self) -> &str {
        let path = self
            .url
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let file = path.rsplit('/').next().unwrap_or_default();

        match file.rsplit_once('.') {
            Some((stem, ext))
                if !stem.is_empty()
                    && (1..=4).contains(&ext.len())
                    && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
            {
                ext
            }
            _ => self.kind.default_extension(),
        }
    }
}

/// A remote service whose jobs can be observed by the poller
#[async_trait]
pub trait JobBackend: Send + Sync {
    /// What a succeeded job yields
    type Output: Send;

    /// Service name used in logs and progress output
    fn service(&self) -> &'static str;

    /// Query the job once.
    ///
    /// Implementations resolve whatever extra lookups are needed to turn a
    /// terminal status into `Succeeded(output)` or `Failed(reason)`.
    async fn poll(&self, job: &JobId) -> ApiResult<JobState<Self::Output>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_extension() {
        let song = Artifact::audio("https://cdn.sonauto.ai/generations/abc.ogg");
        assert_eq!(song.extension(), "ogg");

        let signed = Artifact::video("https://cdn.example.com/out/video.mp4?sig=a.b.c");
        assert_eq!(signed.extension(), "mp4");

        let bare = Artifact::video("https://cdn.example.com/render/12345");
        assert_eq!(bare.extension(), "mp4");

        let weird = Artifact::audio("https://cdn.example.com/files/song.tar-gz-bundle");
        assert_eq!(weird.extension(), "ogg");
    }

    #[test]
    fn test_state_status() {
        let state: JobState<()> = JobState::Processing("GENERATING".to_string());
        assert_eq!(state.status(), JobStatus::Processing);
        assert!(!state.status().is_terminal());
        assert!(JobState::Succeeded(()).status().is_terminal());
        assert!(JobState::<()>::Failed("boom".into()).status().is_terminal());
    }
}
