//! Trim two songs and join them around a silent gap using FFmpeg

use crate::error::SpliceError;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Padding around the gap so the inpainter never sees the fade into silence
pub const INPAINT_PADDING: f64 = 0.1;

const SAMPLE_RATE: u32 = 44100;
const FORMAT_FILTER: &str = "aresample=44100,aformat=sample_fmts=fltp:channel_layouts=stereo";

/// User-facing trimming parameters, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpliceSettings {
    /// Maximum length kept from each song
    pub song_duration: f64,
    /// Gap between the songs
    pub silence: f64,
    /// Cut from the end of the first song (after limiting it to `song_duration`)
    pub trim_from_end: f64,
    /// Cut from the start of the second song
    pub trim_to_start: f64,
}

impl Default for SpliceSettings {
    fn default() -> Self {
        Self {
            song_duration: 45.0,
            silence: 5.0,
            trim_from_end: 0.0,
            trim_to_start: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
}

impl Segment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Exactly which parts of each song end up in the splice
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplicePlan {
    pub first: Segment,
    pub silence: f64,
    pub second: Segment,
}

impl SplicePlan {
    /// Plan a splice from the probed song lengths
    pub fn new(first_len: f64, second_len: f64, settings: &SpliceSettings) -> Result<Self, SpliceError> {
        let values = [
            ("song duration", settings.song_duration),
            ("silence", settings.silence),
            ("trim from end", settings.trim_from_end),
            ("trim to start", settings.trim_to_start),
        ];
        if let Some((name, value)) = values.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            return Err(SpliceError::InvalidPlan(format!(
                "{} must be a non-negative number, got {}",
                name, value
            )));
        }

        let first_end = settings.song_duration.min(first_len) - settings.trim_from_end;
        if first_end <= 0.0 {
            return Err(SpliceError::InvalidPlan(format!(
                "trimming {:.2}s leaves nothing of the first song ({:.2}s kept)",
                settings.trim_from_end,
                settings.song_duration.min(first_len)
            )));
        }

        let second = Segment {
            start: settings.trim_to_start,
            end: settings.song_duration.min(second_len),
        };
        if second.duration() <= 0.0 {
            return Err(SpliceError::InvalidPlan(format!(
                "trimming {:.2}s leaves nothing of the second song ({:.2}s kept)",
                settings.trim_to_start, second.end
            )));
        }

        Ok(Self {
            first: Segment {
                start: 0.0,
                end: first_end,
            },
            silence: settings.silence,
            second,
        })
    }

    pub fn total(&self) -> f64 {
        self.first.duration() + self.silence + self.second.duration()
    }

    /// Section handed to the inpainter: the gap plus padding on both sides
    pub fn inpaint_section(&self) -> (f64, f64) {
        let gap_start = self.first.duration();
        (
            (gap_start - INPAINT_PADDING).max(0.0),
            gap_start + self.silence + INPAINT_PADDING,
        )
    }

    fn filter_graph(&self) -> String {
        let mut graph = format!(
            "[0:a]atrim=start={:.3}:end={:.3},asetpts=PTS-STARTPTS,{}[a0];",
            self.first.start, self.first.end, FORMAT_FILTER
        );

        let inputs = if self.silence > 0.0 {
            graph.push_str(&format!(
                "anullsrc=r={}:cl=stereo,atrim=duration={:.3},{}[gap];",
                SAMPLE_RATE, self.silence, FORMAT_FILTER
            ));
            "[a0][gap][a1]concat=n=3:v=0:a=1[out]"
        } else {
            "[a0][a1]concat=n=2:v=0:a=1[out]"
        };

        graph.push_str(&format!(
            "[1:a]atrim=start={:.3}:end={:.3},asetpts=PTS-STARTPTS,{}[a1];",
            self.second.start, self.second.end, FORMAT_FILTER
        ));
        graph.push_str(inputs);
        graph
    }
}

#[derive(Debug)]
pub struct Splicer {
    ffmpeg_path: PathBuf,
}

impl Splicer {
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self { ffmpeg_path }
    }

    /// Render the planned splice to an MP3
    pub async fn splice(
        &self,
        plan: &SplicePlan,
        first: &Path,
        second: &Path,
        output: &Path,
    ) -> Result<(), SpliceError> {
        info!(
            "Splicing {:.2}s + {:.2}s silence + {:.2}s",
            plan.first.duration(),
            plan.silence,
            plan.second.duration()
        );

        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.args(["-hide_banner", "-loglevel", "error"]);
        cmd.arg("-i").arg(first);
        cmd.arg("-i").arg(second);
        cmd.arg("-filter_complex").arg(plan.filter_graph());
        cmd.args(["-map", "[out]", "-c:a", "libmp3lame", "-b:a", "192k"]);
        cmd.arg("-y").arg(output);

        let status = cmd.status().await?;
        if !status.success() {
            return Err(SpliceError::FfmpegFailed(status.code()));
        }

        debug!("Spliced to: {}", output.display());
        Ok(())
    }

    /// Re-encode mono at 128 kbit/s to get under the upload limit
    pub async fn reduce(&self, input: &Path, output: &Path) -> Result<(), SpliceError> {
        info!("Reducing {} to mono 128k", input.display());

        let status = Command::new(&self.ffmpeg_path)
            .args(["-hide_banner", "-loglevel", "error"])
            .arg("-i")
            .arg(input)
            .args(["-ac", "1", "-c:a", "libmp3lame", "-b:a", "128k"])
            .arg("-y")
            .arg(output)
            .status()
            .await?;

        if !status.success() {
            return Err(SpliceError::FfmpegFailed(status.code()));
        }
        Ok(())
    }
}

/// File size in megabytes (MiB)
pub async fn file_size_mb(path: &Path) -> std::io::Result<f64> {
    let meta = tokio::fs::metadata(path).await?;
    Ok(meta.len() as f64 / (1024.0 * 1024.0))
}
