//! Shared HTTP plumbing for the API clients

use crate::error::{ApiError, ApiResult};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Build the HTTP client shared by every service
pub fn build_client(timeout: Duration) -> ApiResult<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("songsmith/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(ApiError::Network)
}

/// Turn a non-2xx response into `ApiError::Status`, keeping the body for diagnostics
pub(crate) async fn ensure_success(service: &'static str, response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        service,
        status: status.as_u16(),
        body: excerpt(&body).to_string(),
    })
}

/// Decode a JSON body; malformed payloads are reported as invalid responses, not network errors
pub(crate) async fn read_json<T: DeserializeOwned>(
    service: &'static str,
    response: Response,
) -> ApiResult<T> {
    let body = response.text().await?;
    serde_json::from_str(&body)
        .map_err(|e| ApiError::invalid(service, format!("{} in {:?}", e, excerpt(&body))))
}

fn excerpt(body: &str) -> &str {
    const LIMIT: usize = 512;
    match body.char_indices().nth(LIMIT) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_limits_long_bodies() {
        let long = "x".repeat(2000);
        assert_eq!(excerpt(&long).len(), 512);
        assert_eq!(excerpt("short"), "short");
    }
}
