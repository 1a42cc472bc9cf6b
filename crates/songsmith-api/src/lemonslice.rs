//! Lemon Slice singing/talking avatar video generation

use crate::error::{ApiError, ApiResult};
use crate::http::{ensure_success, read_json};
use crate::job::{Artifact, JobBackend, JobId, JobState};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "https://lemonslice.com/api/v2";

const SERVICE: &str = "Lemon Slice";

/// Animate a character image to the given audio
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoRequest {
    pub img_url: String,
    pub audio_url: String,
    /// Output height in pixels, sent as a string
    pub resolution: String,
    pub crop_head: bool,
    pub expressiveness: f32,
    pub whole_body_mode: bool,
}

impl VideoRequest {
    pub fn new(img_url: impl Into<String>, audio_url: impl Into<String>) -> Self {
        Self {
            img_url: img_url.into(),
            audio_url: audio_url.into(),
            resolution: "320".to_string(),
            crop_head: false,
            expressiveness: 1.0,
            whole_body_mode: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct JobCreated {
    job_id: Option<String>,
}

/// Body of `GET /generations/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct VideoJob {
    pub status: String,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl VideoJob {
    fn into_state(self) -> ApiResult<JobState<Artifact>> {
        match self.status.as_str() {
            "pending" | "queued" => Ok(JobState::Queued(self.status)),
            "processing" | "running" => Ok(JobState::Processing(self.status)),
            "completed" => self
                .video_url
                .filter(|url| !url.is_empty())
                .map(|url| JobState::Succeeded(Artifact::video(url)))
                .ok_or_else(|| ApiError::invalid(SERVICE, "completed job has no video_url")),
            other => {
                let mut reason = format!("video generation ended with status {}", other);
                if let Some(detail) = self.error.filter(|e| !e.is_empty()) {
                    reason.push_str(": ");
                    reason.push_str(&detail);
                }
                Ok(JobState::Failed(reason))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct LemonSliceClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl LemonSliceClient {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Submit a video job
    pub async fn generate(&self, request: &VideoRequest) -> ApiResult<JobId> {
        info!("Submitting Lemon Slice video at {}p", request.resolution);

        let response = self
            .http
            .post(format!("{}/generate", self.base_url))
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(request)
            .send()
            .await?;

        let created: JobCreated = read_json(SERVICE, ensure_success(SERVICE, response).await?).await?;
        let job_id = created
            .job_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::invalid(SERVICE, "response carries no job_id"))?;

        debug!("Lemon Slice job created: {}", job_id);
        Ok(JobId::new(job_id))
    }

    pub async fn job(&self, job: &JobId) -> ApiResult<VideoJob> {
        let response = self
            .http
            .get(format!("{}/generations/{}", self.base_url, job))
            .bearer_auth(&self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        read_json(SERVICE, ensure_success(SERVICE, response).await?).await
    }
}

#[async_trait]
impl JobBackend for LemonSliceClient {
    type Output = Artifact;

    fn service(&self) -> &'static str {
        SERVICE
    }

    async fn poll(&self, job: &JobId) -> ApiResult<JobState<Artifact>> {
        self.job(job).await?.into_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(status: &str, video_url: Option<&str>, error: Option<&str>) -> VideoJob {
        VideoJob {
            status: status.to_string(),
            video_url: video_url.map(String::from),
            error: error.map(String::from),
        }
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            job("pending", None, None).into_state().unwrap(),
            JobState::Queued("pending".to_string())
        );
        assert_eq!(
            job("processing", None, None).into_state().unwrap(),
            JobState::Processing("processing".to_string())
        );
        assert_eq!(
            job("completed", Some("https://cdn.lemonslice.com/v.mp4"), None)
                .into_state()
                .unwrap(),
            JobState::Succeeded(Artifact::video("https://cdn.lemonslice.com/v.mp4"))
        );
    }

    #[test]
    fn test_unknown_status_is_failure() {
        let state = job("failed", None, Some("face not detected")).into_state().unwrap();
        assert_eq!(
            state,
            JobState::Failed("video generation ended with status failed: face not detected".to_string())
        );
    }

    #[test]
    fn test_completed_without_url_is_invalid() {
        let err = job("completed", None, None).into_state().unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse { .. }));
    }

    #[test]
    fn test_default_request_payload() {
        let body = serde_json::to_value(VideoRequest::new("https://img", "https://song.ogg")).unwrap();
        assert_eq!(body["resolution"], "320");
        assert_eq!(body["crop_head"], false);
        assert_eq!(body["whole_body_mode"], true);
        assert_eq!(body["audio_url"], "https://song.ogg");
    }
}
