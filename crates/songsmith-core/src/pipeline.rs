//! Shared plumbing for the generation workflows

use crate::error::Result;
use crate::Config;

use songsmith_api::{
    build_client, Artifact, ArtifactFetcher, JobBackend, JobId, JobPoller, LemonSliceClient,
    SonautoClient,
};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::info;

/// Pipeline progress stages
#[derive(Debug, Clone)]
pub enum PipelineStage {
    Downloading { source: String },
    Downloaded { title: String },
    Splicing { total_secs: f64 },
    Reducing { size_mb: f64 },
    Submitting { service: &'static str },
    Polling { service: &'static str, job: JobId, status: String },
    Fetching { url: String },
    Saved { output: PathBuf, bytes: u64 },
    Complete { duration: Duration },
    Failed { stage: String, error: String },
}

/// Runs the song, telegram and transition workflows against the configured services
pub struct Pipeline {
    pub(crate) config: Config,
    http: reqwest::Client,
    pub(crate) poller: JobPoller,
    fetcher: ArtifactFetcher,
    progress_tx: mpsc::Sender<PipelineStage>,
}

impl Pipeline {
    pub fn new(config: Config, progress_tx: mpsc::Sender<PipelineStage>) -> Result<Self> {
        config.validate()?;
        let http = build_client(config.http_timeout())?;

        Ok(Self {
            poller: JobPoller::new(config.poll_config()),
            fetcher: ArtifactFetcher::new(http.clone()),
            http,
            config,
            progress_tx,
        })
    }

    pub(crate) fn sonauto(&self) -> Result<SonautoClient> {
        let key = self.config.sonauto_api_key().map_err(self.failed("config"))?;
        Ok(SonautoClient::new(
            self.http.clone(),
            self.config.sonauto.base_url.as_str(),
            key,
        ))
    }

    pub(crate) fn lemonslice(&self) -> Result<LemonSliceClient> {
        let key = self.config.lemonslice_api_key().map_err(self.failed("config"))?;
        Ok(LemonSliceClient::new(
            self.http.clone(),
            self.config.lemonslice.base_url.as_str(),
            key,
        ))
    }

    pub(crate) async fn emit(&self, stage: PipelineStage) {
        let _ = self.progress_tx.send(stage).await;
    }

    /// Error passthrough that also reports the failing stage
    pub(crate) fn failed<'a, E: Display>(&'a self, stage: &'static str) -> impl FnOnce(E) -> E + 'a {
        move |e| {
            let _ = self.progress_tx.try_send(PipelineStage::Failed {
                stage: stage.to_string(),
                error: e.to_string(),
            });
            e
        }
    }

    /// Poll a submitted job, forwarding each status change as a `Polling` stage
    pub(crate) async fn wait_for<B>(
        &self,
        poller: &JobPoller,
        backend: &B,
        job: &JobId,
        stage: &'static str,
    ) -> Result<B::Output>
    where
        B: JobBackend + ?Sized,
    {
        let service = backend.service();
        let output = poller
            .wait_with(backend, job, |_, label| {
                let _ = self.progress_tx.try_send(PipelineStage::Polling {
                    service,
                    job: job.clone(),
                    status: label.to_string(),
                });
            })
            .await
            .map_err(self.failed(stage))?;
        Ok(output)
    }

    /// Download an artifact to `output`
    pub(crate) async fn save(&self, artifact: &Artifact, output: &Path) -> Result<u64> {
        self.emit(PipelineStage::Fetching {
            url: artifact.url.clone(),
        })
        .await;

        let bytes = self
            .fetcher
            .fetch(artifact, output)
            .await
            .map_err(self.failed("fetch"))?;

        info!("Saved {} ({} bytes)", output.display(), bytes);
        self.emit(PipelineStage::Saved {
            output: output.to_path_buf(),
            bytes,
        })
        .await;
        Ok(bytes)
    }

    /// Explicit path if given, otherwise `default_name` inside the output directory
    pub(crate) fn output_path(&self, explicit: Option<&Path>, default_name: String) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.output.directory.join(default_name))
    }

    pub(crate) async fn finish(&self, started: Instant) {
        let duration = started.elapsed();
        info!("Workflow complete ({:.1}s)", duration.as_secs_f32());
        self.emit(PipelineStage::Complete { duration }).await;
    }
}
