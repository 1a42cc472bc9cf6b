//! Singing telegram: a personalized song performed by an animated character

use crate::error::{Result, SongsmithError};
use crate::pipeline::{Pipeline, PipelineStage};
use crate::song::song_file_name;

use songsmith_api::{Artifact, JobBackend, SongResult, VideoRequest};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

pub const DEFAULT_STYLE: &str = "pop";

#[derive(Debug, Clone, PartialEq)]
pub struct TelegramOrder {
    pub recipient: String,
    pub occasion: String,
    pub message: String,
    pub style: String,
    /// Character image; chosen by occasion when absent
    pub image_url: Option<String>,
    /// Video height override
    pub resolution: Option<String>,
}

impl TelegramOrder {
    pub fn new(
        recipient: impl Into<String>,
        occasion: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            occasion: occasion.into(),
            message: message.into(),
            style: DEFAULT_STYLE.to_string(),
            image_url: None,
            resolution: None,
        }
    }

    pub fn prompt(&self) -> String {
        format!(
            "A {} song for {}'s {}. The song should mention that {}",
            self.style.trim(),
            self.recipient.trim(),
            self.occasion.trim(),
            self.message.trim()
        )
    }

    fn validate(&self) -> std::result::Result<(), SongsmithError> {
        let fields = [
            ("recipient", &self.recipient),
            ("occasion", &self.occasion),
            ("message", &self.message),
            ("style", &self.style),
        ];
        match fields.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((name, _)) => Err(SongsmithError::Pipeline(format!(
                "telegram {} must not be empty",
                name
            ))),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TelegramOutcome {
    pub song: SongResult,
    pub song_path: PathBuf,
    pub video: Artifact,
    pub video_path: PathBuf,
}

impl Pipeline {
    /// Generate the song, animate a character singing it, and save both files
    pub async fn singing_telegram(&self, order: &TelegramOrder) -> Result<TelegramOutcome> {
        let started = Instant::now();
        order.validate().map_err(self.failed("submit"))?;

        // Both keys up front so a missing video key doesn't waste a song generation
        let sonauto = self.sonauto()?;
        let lemonslice = self.lemonslice()?;

        let image_url = match &order.image_url {
            Some(url) => url.clone(),
            None => self
                .config
                .character_image(&order.occasion)
                .map(str::to_string)
                .ok_or_else(|| {
                    self.failed("submit")(SongsmithError::Pipeline(format!(
                        "no character image configured for '{}' and no default",
                        order.occasion
                    )))
                })?,
        };

        let song = self.compose(&sonauto, &order.prompt()).await?;
        let song_path = self.output_path(None, song_file_name("telegram_song", &song));
        self.save(&song.artifact, &song_path).await?;

        let settings = &self.config.lemonslice;
        let mut request = VideoRequest::new(image_url, song.artifact.url.as_str());
        request.resolution = order
            .resolution
            .clone()
            .unwrap_or_else(|| settings.resolution.clone());
        request.expressiveness = settings.expressiveness;
        request.crop_head = settings.crop_head;
        request.whole_body_mode = settings.whole_body_mode;

        info!("Requesting video for song {}", song.task_id);
        self.emit(PipelineStage::Submitting {
            service: lemonslice.service(),
        })
        .await;

        let job = lemonslice
            .generate(&request)
            .await
            .map_err(self.failed("submit"))?;

        let video_poller = self.poller.with_timeout(self.config.video_timeout());
        let video = self.wait_for(&video_poller, &lemonslice, &job, "video").await?;

        let video_path = self.output_path(
            None,
            format!("telegram_video_{}.{}", song.task_id, video.extension()),
        );
        self.save(&video, &video_path).await?;

        self.finish(started).await;
        Ok(TelegramOutcome {
            song,
            song_path,
            video,
            video_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt() {
        let mut order = TelegramOrder::new("Alex", "birthday", "they just turned 30 and love hiking");
        assert_eq!(
            order.prompt(),
            "A pop song for Alex's birthday. The song should mention that they just turned 30 and love hiking"
        );

        order.style = " jazz ".to_string();
        assert!(order.prompt().starts_with("A jazz song for Alex's"));
    }

    #[test]
    fn test_blank_fields_are_rejected() {
        let order = TelegramOrder::new("Alex", "  ", "hi");
        let err = order.validate().unwrap_err();
        assert_eq!(err.to_string(), "Pipeline error: telegram occasion must not be empty");
    }
}
