//! Sonauto song generation and inpainting

use crate::error::{ApiError, ApiResult};
use crate::http::{ensure_success, read_json};
use crate::job::{Artifact, JobBackend, JobId, JobState};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.sonauto.ai/v1";

const SERVICE: &str = "Sonauto";
const NO_FAILURE_DETAIL: &str = "No detailed error message available";

/// Text-prompted song generation request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SongRequest {
    pub prompt: String,
    pub num_songs: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lyrics: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrumental: Option<bool>,
}

impl SongRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            num_songs: 1,
            tags: None,
            lyrics: None,
            instrumental: None,
        }
    }
}

/// Regenerate sections of supplied audio
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InpaintRequest {
    pub audio_base64: String,
    /// `[start, end]` pairs in seconds
    pub sections: Vec<[f64; 2]>,
    pub lyrics: String,
    pub tags: Vec<String>,
    /// Return only the inpainted selection instead of the whole song
    pub selection_crop: bool,
}

impl InpaintRequest {
    /// Fill one section with music, without lyrics or tag guidance, returning the full song
    pub fn transition(audio_base64: String, start: f64, end: f64) -> Self {
        Self {
            audio_base64,
            sections: vec![[start, end]],
            lyrics: String::new(),
            tags: Vec::new(),
            selection_crop: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TaskCreated {
    task_id: Option<String>,
}

/// Body of `GET /generations/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationRecord {
    #[serde(default)]
    pub song_paths: Vec<String>,
    #[serde(default)]
    pub lyrics: Option<String>,
    #[serde(default)]
    pub seed: Option<i64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// A finished generation with its downloadable song
#[derive(Debug, Clone, PartialEq)]
pub struct SongResult {
    pub task_id: JobId,
    pub artifact: Artifact,
    pub lyrics: Option<String>,
    pub seed: Option<i64>,
    pub tags: Vec<String>,
}

impl SongResult {
    fn from_record(task_id: &JobId, record: GenerationRecord) -> ApiResult<Self> {
        let url = record
            .song_paths
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::invalid(SERVICE, format!("generation {} has no song_paths", task_id)))?;

        Ok(Self {
            task_id: task_id.clone(),
            artifact: Artifact::audio(url),
            lyrics: record.lyrics,
            seed: record.seed,
            tags: record.tags,
        })
    }
}

/// Sonauto status labels grouped the way the poller cares about them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusClass {
    Queued,
    Running,
    Success,
    Failure,
}

fn classify_status(label: &str) -> StatusClass {
    match label {
        "SUCCESS" => StatusClass::Success,
        "FAILURE" => StatusClass::Failure,
        "RECEIVED" | "PENDING" | "QUEUED" => StatusClass::Queued,
        _ => StatusClass::Running,
    }
}

#[derive(Debug, Clone)]
pub struct SonautoClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl SonautoClient {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    /// Start a song generation
    pub async fn generate(&self, request: &SongRequest) -> ApiResult<JobId> {
        info!("Submitting Sonauto generation: {:?}", request.prompt);
        self.submit("generations", request).await
    }

    /// Start an inpainting job
    pub async fn inpaint(&self, request: &InpaintRequest) -> ApiResult<JobId> {
        info!(
            "Submitting Sonauto inpaint of {} section(s), {} base64 bytes",
            request.sections.len(),
            request.audio_base64.len()
        );
        self.submit("generations/inpaint", request).await
    }

    async fn submit<T: Serialize + ?Sized>(&self, endpoint: &str, body: &T) -> ApiResult<JobId> {
        let response = self
            .http
            .post(self.url(endpoint))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await?;

        let created: TaskCreated = read_json(SERVICE, ensure_success(SERVICE, response).await?).await?;
        let task_id = created
            .task_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::invalid(SERVICE, "response carries no task_id"))?;

        debug!("Sonauto task created: {}", task_id);
        Ok(JobId::new(task_id))
    }

    /// Raw status label, e.g. `GENERATING` or `SUCCESS`
    pub async fn status(&self, job: &JobId) -> ApiResult<String> {
        let response = self
            .http
            .get(self.url(&format!("generations/status/{}", job)))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let body = ensure_success(SERVICE, response).await?.text().await?;
        Ok(body.trim().trim_matches('"').to_string())
    }

    /// Full generation record (results on success, `error_message` on failure)
    pub async fn generation(&self, job: &JobId) -> ApiResult<GenerationRecord> {
        let response = self
            .http
            .get(self.url(&format!("generations/{}", job)))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        read_json(SERVICE, ensure_success(SERVICE, response).await?).await
    }

    async fn failure_reason(&self, job: &JobId) -> String {
        match self.generation(job).await {
            Ok(record) => record
                .error_message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| NO_FAILURE_DETAIL.to_string()),
            Err(e) => {
                warn!("Could not fetch failure details for {}: {}", job, e);
                NO_FAILURE_DETAIL.to_string()
            }
        }
    }
}

#[async_trait]
impl JobBackend for SonautoClient {
    type Output = SongResult;

    fn service(&self) -> &'static str {
        SERVICE
    }

    async fn poll(&self, job: &JobId) -> ApiResult<JobState<SongResult>> {
        let label = self.status(job).await?;

        Ok(match classify_status(&label) {
            StatusClass::Success => {
                let record = self.generation(job).await?;
                JobState::Succeeded(SongResult::from_record(job, record)?)
            }
            StatusClass::Failure => JobState::Failed(self.failure_reason(job).await),
            StatusClass::Queued => JobState::Queued(label),
            StatusClass::Running => JobState::Processing(label),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status("SUCCESS"), StatusClass::Success);
        assert_eq!(classify_status("FAILURE"), StatusClass::Failure);
        assert_eq!(classify_status("RECEIVED"), StatusClass::Queued);
        assert_eq!(classify_status("GENERATING"), StatusClass::Running);
        assert_eq!(classify_status("DECOMPRESSING"), StatusClass::Running);
    }

    #[test]
    fn test_song_request_omits_unset_fields() {
        let body = serde_json::to_value(SongRequest::new("An upbeat rock song")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"prompt": "An upbeat rock song", "num_songs": 1})
        );
    }

    #[test]
    fn test_transition_inpaint_payload() {
        let body = serde_json::to_value(InpaintRequest::transition("AAAA".into(), 44.4, 49.6)).unwrap();
        assert_eq!(body["sections"], serde_json::json!([[44.4, 49.6]]));
        assert_eq!(body["lyrics"], "");
        assert_eq!(body["tags"], serde_json::json!([]));
        assert_eq!(body["selection_crop"], false);
    }

    #[test]
    fn test_song_result_requires_a_path() {
        let job = JobId::new("t-1");
        let err = SongResult::from_record(&job, GenerationRecord::default()).unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse { .. }));

        let record = GenerationRecord {
            song_paths: vec!["https://cdn.sonauto.ai/a.ogg".into(), "https://cdn.sonauto.ai/b.ogg".into()],
            seed: Some(42),
            ..Default::default()
        };
        let result = SongResult::from_record(&job, record).unwrap();
        assert_eq!(result.artifact, Artifact::audio("https://cdn.sonauto.ai/a.ogg"));
        assert_eq!(result.seed, Some(42));
    }
}
