//! Audio file inspection using FFmpeg

use crate::error::ProbeError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

#[derive(Debug)]
pub struct AudioProbe {
    ffmpeg_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioInfo {
    pub sample_rate: u32,
    pub channels: u8,
    /// Seconds
    pub duration: f64,
}

impl AudioProbe {
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self { ffmpeg_path }
    }

    /// Get audio file info (sample rate, channels, duration)
    pub async fn probe(&self, input: &Path) -> Result<AudioInfo, ProbeError> {
        let output = Command::new(&self.ffmpeg_path)
            .arg("-hide_banner")
            .arg("-i")
            .arg(input)
            .args(["-f", "null", "-"])
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => ProbeError::FfmpegNotFound,
                _ => ProbeError::Io(e),
            })?;

        // FFmpeg outputs info to stderr
        let stderr = String::from_utf8_lossy(&output.stderr);
        let info = parse_audio_info(&stderr)
            .ok_or_else(|| ProbeError::DurationNotFound(input.to_path_buf()))?;

        debug!(
            "{}: {:.2}s, {} Hz, {} ch",
            input.display(),
            info.duration,
            info.sample_rate,
            info.channels
        );
        Ok(info)
    }
}

fn parse_audio_info(ffmpeg_output: &str) -> Option<AudioInfo> {
    Some(AudioInfo {
        duration: parse_duration(ffmpeg_output)?,
        sample_rate: parse_sample_rate(ffmpeg_output).unwrap_or(44100),
        channels: parse_channels(ffmpeg_output),
    })
}

fn parse_sample_rate(ffmpeg_output: &str) -> Option<u32> {
    // Look for pattern like "48000 Hz" or "44100 Hz"
    let re = regex::Regex::new(r"(\d+) Hz").ok()?;
    let caps = re.captures(ffmpeg_output)?;
    caps.get(1)?.as_str().parse().ok()
}

fn parse_channels(ffmpeg_output: &str) -> u8 {
    if ffmpeg_output.contains("stereo") {
        2
    } else if ffmpeg_output.contains("mono") {
        1
    } else if ffmpeg_output.contains("5.1") {
        6
    } else {
        2
    }
}

fn parse_duration(ffmpeg_output: &str) -> Option<f64> {
    // Look for pattern like "Duration: 00:03:45.12"
    let re = regex::Regex::new(r"Duration: (\d+):(\d+):(\d+(?:\.\d+)?)").ok()?;
    let caps = re.captures(ffmpeg_output)?;

    let hours: f64 = caps.get(1)?.as_str().parse().ok()?;
    let minutes: f64 = caps.get(2)?.as_str().parse().ok()?;
    let seconds: f64 = caps.get(3)?.as_str().parse().ok()?;

    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}
