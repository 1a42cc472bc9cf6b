use indicatif::{ProgressBar, ProgressStyle};
use songsmith_core::PipelineStage;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::commands::format_duration;

/// Render pipeline stages on a spinner until the sender side is dropped
pub fn spawn(mut rx: mpsc::Receiver<PipelineStage>) -> JoinHandle<()> {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(120));

    tokio::spawn(async move {
        while let Some(stage) = rx.recv().await {
            match stage {
                PipelineStage::Downloading { source } => {
                    pb.set_message(format!("Downloading {}", truncate(&source, 50)));
                }
                PipelineStage::Downloaded { title } => {
                    pb.println(format!("  downloaded: {}", title));
                }
                PipelineStage::Splicing { total_secs } => {
                    pb.set_message(format!("Splicing {:.1}s of audio...", total_secs));
                }
                PipelineStage::Reducing { size_mb } => {
                    pb.set_message(format!("Splice is {:.1} MB, re-encoding mono...", size_mb));
                }
                PipelineStage::Submitting { service } => {
                    pb.set_message(format!("Submitting to {}...", service));
                }
                PipelineStage::Polling { service, job, status } => {
                    pb.set_message(format!("{} job {}: {}", service, job, status));
                }
                PipelineStage::Fetching { url } => {
                    pb.set_message(format!("Fetching {}", truncate(&url, 60)));
                }
                PipelineStage::Saved { output, bytes } => {
                    pb.println(format!("  saved: {} ({} KiB)", output.display(), bytes / 1024));
                }
                PipelineStage::Complete { duration } => {
                    pb.finish_with_message(format!("Done ({})", format_duration(duration)));
                }
                PipelineStage::Failed { stage, error } => {
                    pb.abandon_with_message(format!("Failed at {}: {}", stage, error));
                }
            }
        }

        if !pb.is_finished() {
            pb.finish_and_clear();
        }
    })
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("https://www.youtube.com/watch?v=dQw4w9WgXcQ", 20), "https://www.youtu...");
        assert_eq!(truncate("héllo wörld", 8), "héllo...");
    }
}
