//! Artifact download to local storage

use crate::error::ApiResult;
use crate::http::ensure_success;
use crate::job::Artifact;
use futures::StreamExt;
use reqwest::{Client, Response};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ArtifactFetcher {
    http: Client,
}

impl ArtifactFetcher {
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    /// Stream the artifact to `dest`, returning the number of bytes written.
    ///
    /// Artifact URLs are public CDN links, so no credentials are sent. The body
    /// lands in `<dest>.part` first; `dest` only appears once it is complete.
    pub async fn fetch(&self, artifact: &Artifact, dest: &Path) -> ApiResult<u64> {
        info!("Fetching {}", artifact.url);

        let response = self.http.get(&artifact.url).send().await?;
        let response = ensure_success("artifact host", response).await?;

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let partial = partial_path(dest);
        let written = match write_body(response, &partial).await {
            Ok(written) => written,
            Err(e) => {
                warn!("Download of {} interrupted: {}", artifact.url, e);
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(e);
            }
        };

        tokio::fs::rename(&partial, dest).await?;
        debug!("Wrote {} bytes to {}", written, dest.display());
        Ok(written)
    }
}

async fn write_body(response: Response, path: &Path) -> ApiResult<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}
