//! Error types for the generation API bridge

use crate::job::JobId;
use std::time::Duration;
use thiserror::Error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Invalid response from {service}: {reason}")]
    InvalidResponse {
        service: &'static str,
        reason: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub(crate) fn invalid(service: &'static str, reason: impl Into<String>) -> Self {
        ApiError::InvalidResponse {
            service,
            reason: reason.into(),
        }
    }

    /// Whether the request may succeed if simply issued again
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum PollError {
    #[error("Job {job} failed: {reason}")]
    Failed { job: JobId, reason: String },

    #[error("Job {job} still unfinished after {:.0}s ({attempts} status checks)", .elapsed.as_secs_f64())]
    Timeout {
        job: JobId,
        elapsed: Duration,
        attempts: u32,
    },

    #[error("Polling job {job} aborted: {source}")]
    Api {
        job: JobId,
        #[source]
        source: ApiError,
    },
}

impl PollError {
    pub fn job(&self) -> &JobId {
        match self {
            PollError::Failed { job, .. }
            | PollError::Timeout { job, .. }
            | PollError::Api { job, .. } => job,
        }
    }
}
