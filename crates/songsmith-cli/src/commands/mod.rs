pub mod config;
pub mod doctor;
pub mod song;
pub mod telegram;
pub mod transition;

use anyhow::{Context, Result};
use songsmith_core::{Config, Pipeline};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::args::GlobalArgs;
use crate::progress;

/// Load configuration and apply the global command-line overrides
pub fn load_config(global: &GlobalArgs) -> Result<Config> {
    let mut config = Config::load(global.config.as_deref()).context("failed to load configuration")?;

    if let Some(dir) = &global.output_dir {
        config.output.directory = dir.clone();
    }
    if let Some(interval) = global.poll_interval {
        config.polling.interval_secs = interval;
    }
    if let Some(timeout) = global.timeout {
        config.polling.song_timeout_secs = timeout;
        config.polling.video_timeout_secs = timeout;
    }

    config.validate()?;
    Ok(config)
}

/// Run a workflow while rendering its progress stages
pub async fn with_progress<T, F, Fut>(config: Config, work: F) -> Result<T>
where
    F: FnOnce(Pipeline) -> Fut,
    Fut: Future<Output = songsmith_core::Result<T>>,
{
    let (tx, rx) = mpsc::channel(32);
    let renderer = progress::spawn(rx);

    // The pipeline owns the sender, so the renderer stops once the workflow is done
    let result = match Pipeline::new(config, tx) {
        Ok(pipeline) => work(pipeline).await,
        Err(e) => Err(e),
    };

    renderer.await?;
    Ok(result?)
}

pub(crate) fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{:.1}s", duration.as_secs_f32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(4200)), "4.2s");
        assert_eq!(format_duration(Duration::from_secs(185)), "3m05s");
    }
}
