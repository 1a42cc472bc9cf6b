//! AI transition between two YouTube songs
//!
//! Both songs are downloaded and trimmed, joined around a stretch of silence,
//! and the silence (plus a little padding) is inpainted so the first song
//! flows into the second.

use crate::downloader::{DownloadResult, Downloader};
use crate::error::{Result, SpliceError};
use crate::pipeline::{Pipeline, PipelineStage};
use crate::probe::AudioProbe;
use crate::splicer::{file_size_mb, SplicePlan, SpliceSettings, Splicer};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use songsmith_api::{InpaintRequest, JobBackend, SongResult};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOptions {
    /// YouTube URL or video id of the song that plays first
    pub first: String,
    pub second: String,
    pub settings: SpliceSettings,
    pub output: Option<PathBuf>,
    /// Where to keep the spliced input instead of `pre_inpaint_<timestamp>.mp3`
    pub pre_inpaint_output: Option<PathBuf>,
}

impl TransitionOptions {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
            settings: SpliceSettings::default(),
            output: None,
            pre_inpaint_output: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub plan: SplicePlan,
    pub pre_inpaint_path: PathBuf,
    pub song: SongResult,
    pub path: PathBuf,
}

impl Pipeline {
    pub async fn transition(&self, options: &TransitionOptions) -> Result<TransitionOutcome> {
        let started = Instant::now();
        let client = self.sonauto()?;
        let yt_dlp_path = self.config.yt_dlp_path().map_err(self.failed("config"))?;
        let ffmpeg_path = self.config.ffmpeg_path().map_err(self.failed("config"))?;

        let temp_dir = tempfile::tempdir()?;
        let work_dir = temp_dir.path();
        debug!("Temp directory: {}", work_dir.display());

        // 1. Download both songs
        let downloader = Downloader::new(yt_dlp_path, work_dir.to_path_buf());
        let first = self.download(&downloader, &options.first, "song1").await?;
        let second = self.download(&downloader, &options.second, "song2").await?;

        // 2. Measure and plan
        let probe = AudioProbe::new(ffmpeg_path.clone());
        let first_len = probe
            .probe(&first.audio_path)
            .await
            .map_err(self.failed("probe"))?
            .duration;
        let second_len = probe
            .probe(&second.audio_path)
            .await
            .map_err(self.failed("probe"))?
            .duration;

        let plan = SplicePlan::new(first_len, second_len, &options.settings)
            .map_err(self.failed("splice"))?;

        // 3. Splice
        self.emit(PipelineStage::Splicing {
            total_secs: plan.total(),
        })
        .await;

        let splicer = Splicer::new(ffmpeg_path);
        let spliced = work_dir.join("spliced.mp3");
        splicer
            .splice(&plan, &first.audio_path, &second.audio_path, &spliced)
            .await
            .map_err(self.failed("splice"))?;

        let pre_inpaint_path = self.output_path(
            options.pre_inpaint_output.as_deref(),
            format!("pre_inpaint_{}.mp3", chrono::Utc::now().timestamp()),
        );
        if let Some(parent) = pre_inpaint_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(&spliced, &pre_inpaint_path).await?;
        info!("Pre-inpaint audio saved to {}", pre_inpaint_path.display());

        // 4. Inpaint the gap
        let upload = self.fit_upload(&splicer, &spliced, work_dir).await?;
        let audio_base64 = STANDARD.encode(tokio::fs::read(&upload).await?);

        let (start, end) = plan.inpaint_section();
        info!("Inpainting {:.2}s - {:.2}s", start, end);
        self.emit(PipelineStage::Submitting {
            service: client.service(),
        })
        .await;

        let job = client
            .inpaint(&InpaintRequest::transition(audio_base64, start, end))
            .await
            .map_err(self.failed("submit"))?;
        let song = self.wait_for(&self.poller, &client, &job, "inpaint").await?;

        // 5. Save
        let path = self.output_path(
            options.output.as_deref(),
            format!("transition_{}.{}", song.task_id, song.artifact.extension()),
        );
        self.save(&song.artifact, &path).await?;

        self.finish(started).await;
        Ok(TransitionOutcome {
            plan,
            pre_inpaint_path,
            song,
            path,
        })
    }

    async fn download(&self, downloader: &Downloader, source: &str, stem: &str) -> Result<DownloadResult> {
        self.emit(PipelineStage::Downloading {
            source: source.to_string(),
        })
        .await;

        let result = downloader
            .download(source, stem)
            .await
            .map_err(self.failed("download"))?;

        self.emit(PipelineStage::Downloaded {
            title: result.metadata.title.clone(),
        })
        .await;
        Ok(result)
    }

    /// Keep the splice under the inpaint upload limit, re-encoding mono if needed
    async fn fit_upload(&self, splicer: &Splicer, spliced: &Path, work_dir: &Path) -> Result<PathBuf> {
        let limit_mb = self.config.transition.max_upload_mb;
        let size_mb = file_size_mb(spliced).await?;
        if size_mb <= limit_mb {
            return Ok(spliced.to_path_buf());
        }

        warn!("Splice is {:.2} MB, over the {:.0} MB upload limit", size_mb, limit_mb);
        self.emit(PipelineStage::Reducing { size_mb }).await;

        let reduced = work_dir.join("spliced_mono.mp3");
        splicer
            .reduce(spliced, &reduced)
            .await
            .map_err(self.failed("reduce"))?;

        let size_mb = file_size_mb(&reduced).await?;
        if size_mb > limit_mb {
            return Err(self.failed("reduce")(SpliceError::TooLarge { size_mb, limit_mb }).into());
        }

        debug!("Reduced splice to {:.2} MB", size_mb);
        Ok(reduced)
    }
}
