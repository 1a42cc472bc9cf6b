//! YouTube audio downloader using yt-dlp

use crate::error::DownloadError;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Debug)]
pub struct Downloader {
    yt_dlp_path: PathBuf,
    temp_dir: PathBuf,
}

#[derive(Debug)]
pub struct DownloadResult {
    pub audio_path: PathBuf,
    pub metadata: VideoMetadata,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoMetadata {
    pub id: String,
    #[serde(default = "unknown_title")]
    pub title: String,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}

fn unknown_title() -> String {
    "Unknown".to_string()
}

impl Downloader {
    pub fn new(yt_dlp_path: PathBuf, temp_dir: PathBuf) -> Self {
        Self { yt_dlp_path, temp_dir }
    }

    /// Download a video's audio as `<temp_dir>/<stem>.mp3`
    pub async fn download(&self, input: &str, stem: &str) -> Result<DownloadResult, DownloadError> {
        let url = normalize_youtube_input(input)?;
        info!("Downloading audio from: {}", url);

        let output_template = self.temp_dir.join(format!("{}.%(ext)s", stem));

        let output = Command::new(&self.yt_dlp_path)
            .args([
                "-f", "bestaudio/best",
                // Transcode to MP3 so every source splices the same way
                "--extract-audio",
                "--audio-format", "mp3",
                "--audio-quality", "192K",
                "--no-playlist",
                // Print JSON to stdout for metadata parsing
                "--print-json",
                "-o",
            ])
            .arg(&output_template)
            .arg(&url)
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => DownloadError::YtDlpNotFound,
                _ => DownloadError::Io(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("yt-dlp stderr: {}", stderr);
            return Err(classify_failure(&stderr, &url, output.status.code()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let metadata = parse_metadata(&stdout)?;
        debug!("Downloaded: {} ({})", metadata.title, metadata.id);

        let audio_path = self.temp_dir.join(format!("{}.mp3", stem));
        if !audio_path.exists() {
            return Err(DownloadError::NoAudioFile(audio_path));
        }

        Ok(DownloadResult { audio_path, metadata })
    }
}

fn classify_failure(stderr: &str, url: &str, code: Option<i32>) -> DownloadError {
    if stderr.contains("Video unavailable") || stderr.contains("Private video") {
        DownloadError::VideoUnavailable(url.to_string())
    } else if stderr.contains("is not a valid URL") {
        DownloadError::InvalidUrl(url.to_string())
    } else {
        DownloadError::YtDlpFailed(code)
    }
}

/// yt-dlp prints one JSON object per line; the last one describes the downloaded video
fn parse_metadata(stdout: &str) -> Result<VideoMetadata, DownloadError> {
    let line = stdout
        .lines()
        .rev()
        .find(|l| l.trim_start().starts_with('{'))
        .ok_or_else(|| DownloadError::MetadataParse("no JSON in yt-dlp output".to_string()))?;

    serde_json::from_str(line).map_err(|e| DownloadError::MetadataParse(e.to_string()))
}

/// Validate that a string is a YouTube watch, shorts or share URL
pub fn validate_youtube_url(url: &str) -> bool {
    regex::Regex::new(
        r"^(?:https?://)?(?:(?:www|m|music)\.)?(?:youtube\.com/(?:watch\?|shorts/)|youtu\.be/)[^\s]+$",
    )
    .map(|re| re.is_match(url))
    .unwrap_or(false)
}

/// Bare 11-character video id such as `dQw4w9WgXcQ`
pub fn is_video_id(input: &str) -> bool {
    regex::Regex::new(r"^[A-Za-z0-9_-]{11}$")
        .map(|re| re.is_match(input))
        .unwrap_or(false)
}

/// Accept a YouTube URL or a bare video id and return a URL yt-dlp can fetch
pub fn normalize_youtube_input(input: &str) -> Result<String, DownloadError> {
    let input = input.trim();

    if validate_youtube_url(input) {
        Ok(input.to_string())
    } else if is_video_id(input) {
        Ok(format!("https://www.youtube.com/watch?v={}", input))
    } else {
        Err(DownloadError::InvalidUrl(input.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_youtube_url() {
        assert!(validate_youtube_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(validate_youtube_url("https://youtu.be/dQw4w9WgXcQ"));
        assert!(validate_youtube_url("https://music.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(validate_youtube_url("https://m.youtube.com/shorts/dQw4w9WgXcQ"));
        assert!(validate_youtube_url("youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(!validate_youtube_url("https://example.com/video"));
        assert!(!validate_youtube_url("https://evil.example/?q=youtube.com/watch"));
        assert!(!validate_youtube_url("https://notyoutube.com/watch?v=dQw4w9WgXcQ"));
        assert!(!validate_youtube_url("https://youtube.com.evil.example/watch?v=x"));
        assert!(!validate_youtube_url("https://music.youtube.com/"));
    }

    #[test]
    fn test_normalize_accepts_ids_and_urls() {
        assert_eq!(
            normalize_youtube_input("ec1LhrCmzwI").unwrap(),
            "https://www.youtube.com/watch?v=ec1LhrCmzwI"
        );
        assert_eq!(
            normalize_youtube_input(" https://youtu.be/dQw4w9WgXcQ ").unwrap(),
            "https://youtu.be/dQw4w9WgXcQ"
        );
        assert!(matches!(
            normalize_youtube_input("not a video"),
            Err(DownloadError::InvalidUrl(_))
        ));
        assert!(!is_video_id("dQw4w9WgXcQQ"));
    }

    #[test]
    fn test_parse_metadata_takes_last_json_line() {
        let stdout = "[info] Writing metadata\n{\"id\": \"abc\", \"title\": \"First\"}\n{\"id\": \"dQw4w9WgXcQ\", \"title\": \"Never Gonna Give You Up\", \"duration\": 213.0}\n";
        let meta = parse_metadata(stdout).unwrap();
        assert_eq!(meta.id, "dQw4w9WgXcQ");
        assert_eq!(meta.title, "Never Gonna Give You Up");
        assert_eq!(meta.duration, Some(213.0));

        assert!(matches!(
            parse_metadata("ERROR: nothing"),
            Err(DownloadError::MetadataParse(_))
        ));
    }

    #[test]
    fn test_classify_failure() {
        let url = "https://www.youtube.com/watch?v=aaaaaaaaaaa";
        assert!(matches!(
            classify_failure("ERROR: Private video. Sign in", url, Some(1)),
            DownloadError::VideoUnavailable(_)
        ));
        assert!(matches!(
            classify_failure("ERROR: unable to download", url, Some(2)),
            DownloadError::YtDlpFailed(Some(2))
        ));
    }
}
