//! Text-prompted song generation

use crate::error::{Result, SongsmithError};
use crate::pipeline::{Pipeline, PipelineStage};

use songsmith_api::{JobBackend, SongRequest, SongResult, SonautoClient};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

pub const DEFAULT_PROMPT: &str = "An upbeat rock song about how awesome programming is";

#[derive(Debug, Clone, Default)]
pub struct SongOptions {
    pub prompt: Option<String>,
    /// Where to save the song instead of `song_<task>.<ext>` in the output directory
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct SongOutcome {
    pub song: SongResult,
    pub path: PathBuf,
}

impl Pipeline {
    /// Generate one song from a prompt and download it
    pub async fn generate_song(&self, options: &SongOptions) -> Result<SongOutcome> {
        let started = Instant::now();
        let prompt = options.prompt.as_deref().unwrap_or(DEFAULT_PROMPT);
        let client = self.sonauto()?;

        let song = self.compose(&client, prompt).await?;
        let path = self.output_path(options.output.as_deref(), song_file_name("song", &song));
        self.save(&song.artifact, &path).await?;

        self.finish(started).await;
        Ok(SongOutcome { song, path })
    }

    /// Submit a song request and wait for the finished generation
    pub(crate) async fn compose(&self, client: &SonautoClient, prompt: &str) -> Result<SongResult> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(self.failed("submit")(SongsmithError::Pipeline(
                "song prompt must not be empty".to_string(),
            )));
        }

        info!("Requesting song: {}", prompt);
        self.emit(PipelineStage::Submitting {
            service: client.service(),
        })
        .await;

        let job = client
            .generate(&SongRequest::new(prompt))
            .await
            .map_err(self.failed("submit"))?;

        self.wait_for(&self.poller, client, &job, "generation").await
    }
}

/// `<prefix>_<task id>.<ext>`
pub(crate) fn song_file_name(prefix: &str, song: &SongResult) -> String {
    format!("{}_{}.{}", prefix, song.task_id, song.artifact.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use songsmith_api::{Artifact, JobId};

    #[test]
    fn test_song_file_name() {
        let song = SongResult {
            task_id: JobId::new("7f1c"),
            artifact: Artifact::audio("https://cdn.sonauto.ai/generations/7f1c.ogg?sig=1"),
            lyrics: None,
            seed: Some(42),
            tags: vec![],
        };
        assert_eq!(song_file_name("song", &song), "song_7f1c.ogg");
        assert_eq!(song_file_name("telegram_song", &song), "telegram_song_7f1c.ogg");
    }
}
