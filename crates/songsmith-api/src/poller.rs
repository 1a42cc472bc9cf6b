//! Fixed-interval polling of remote jobs until they reach a terminal state

use crate::error::PollError;
use crate::job::{JobBackend, JobId, JobState, JobStatus};
use std::time::Duration;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, warn};

/// Polling cadence and limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between consecutive status queries
    pub interval: Duration,
    /// Total time allowed before giving up on the job
    pub timeout: Duration,
    /// Consecutive retryable API errors tolerated before aborting
    pub max_transient_errors: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(600),
            max_transient_errors: 3,
        }
    }
}

/// Waits for a submitted job by querying its backend at a fixed interval
#[derive(Debug, Clone, Default)]
pub struct JobPoller {
    config: PollConfig,
}

impl JobPoller {
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Same poller with a different overall timeout
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            config: PollConfig {
                timeout,
                ..self.config.clone()
            },
        }
    }

    /// Wait for the job, discarding intermediate status updates
    pub async fn wait<B>(&self, backend: &B, job: &JobId) -> Result<B::Output, PollError>
    where
        B: JobBackend + ?Sized,
    {
        self.wait_with(backend, job, |_, _| {}).await
    }

    /// Wait for the job, calling `on_change` whenever the reported status label changes.
    ///
    /// No query is issued once the next one would land past the timeout, a query
    /// still in flight at the deadline is abandoned, and a failed job is never
    /// queried again.
    pub async fn wait_with<B, F>(
        &self,
        backend: &B,
        job: &JobId,
        mut on_change: F,
    ) -> Result<B::Output, PollError>
    where
        B: JobBackend + ?Sized,
        F: FnMut(JobStatus, &str),
    {
        let service = backend.service();
        let started = Instant::now();
        let mut attempts: u32 = 0;
        let mut transient_errors: u32 = 0;
        let mut last_label: Option<String> = None;

        loop {
            attempts += 1;

            let remaining = self.config.timeout.saturating_sub(started.elapsed());
            let polled = match timeout(remaining, backend.poll(job)).await {
                Ok(polled) => polled,
                Err(_) => {
                    warn!("{} status check for {} still pending at the deadline", service, job);
                    return Err(PollError::Timeout {
                        job: job.clone(),
                        elapsed: started.elapsed(),
                        attempts,
                    });
                }
            };

            let observed = match polled {
                Ok(JobState::Succeeded(output)) => {
                    info!("{} job {} succeeded after {} checks", service, job, attempts);
                    on_change(JobStatus::Succeeded, "SUCCESS");
                    return Ok(output);
                }
                Ok(JobState::Failed(reason)) => {
                    warn!("{} job {} failed: {}", service, job, reason);
                    on_change(JobStatus::Failed, &reason);
                    return Err(PollError::Failed {
                        job: job.clone(),
                        reason,
                    });
                }
                Ok(JobState::Queued(label)) => Some((JobStatus::Queued, label)),
                Ok(JobState::Processing(label)) => Some((JobStatus::Processing, label)),
                Err(e) if e.is_retryable() && transient_errors < self.config.max_transient_errors => {
                    transient_errors += 1;
                    warn!(
                        "{} status check for {} failed ({}/{}): {}",
                        service, job, transient_errors, self.config.max_transient_errors, e
                    );
                    None
                }
                Err(source) => {
                    return Err(PollError::Api {
                        job: job.clone(),
                        source,
                    });
                }
            };

            if let Some((status, label)) = observed {
                transient_errors = 0;
                if last_label.as_deref() != Some(label.as_str()) {
                    info!("{} job {}: {}", service, job, label);
                    on_change(status, &label);
                    last_label = Some(label);
                }
            }

            let elapsed = started.elapsed();
            if elapsed + self.config.interval > self.config.timeout {
                return Err(PollError::Timeout {
                    job: job.clone(),
                    elapsed,
                    attempts,
                });
            }

            debug!("Next check of {} in {:?}", job, self.config.interval);
            sleep(self.config.interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiError, ApiResult};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Debug, Clone)]
    enum Step {
        Queued(&'static str),
        Processing(&'static str),
        Succeeded(&'static str),
        Failed(&'static str),
        Unavailable,
        Unauthorized,
        /// Answers only after a very long time
        Stall,
    }

    /// Replays scripted observations; the last step repeats forever
    struct ScriptedBackend {
        steps: Mutex<VecDeque<Step>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl ScriptedBackend {
        fn new(steps: &[Step]) -> Self {
            Self {
                steps: Mutex::new(steps.iter().cloned().collect()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JobBackend for ScriptedBackend {
        type Output = String;

        fn service(&self) -> &'static str {
            "Scripted"
        }

        async fn poll(&self, _job: &JobId) -> ApiResult<JobState<String>> {
            self.calls.lock().unwrap().push(Instant::now());

            let step = {
                let mut steps = self.steps.lock().unwrap();
                if steps.len() > 1 {
                    steps.pop_front().unwrap()
                } else {
                    steps.front().cloned().unwrap()
                }
            };

            match step {
                Step::Stall => {
                    sleep(Duration::from_secs(1000)).await;
                    Ok(JobState::Processing("STALLED".to_string()))
                }
                Step::Queued(l) => Ok(JobState::Queued(l.to_string())),
                Step::Processing(l) => Ok(JobState::Processing(l.to_string())),
                Step::Succeeded(url) => Ok(JobState::Succeeded(url.to_string())),
                Step::Failed(reason) => Ok(JobState::Failed(reason.to_string())),
                Step::Unavailable => Err(ApiError::Status {
                    service: "Scripted",
                    status: 503,
                    body: "try later".to_string(),
                }),
                Step::Unauthorized => Err(ApiError::Status {
                    service: "Scripted",
                    status: 401,
                    body: "bad key".to_string(),
                }),
            }
        }
    }

    fn poller(interval_secs: u64, timeout_secs: u64) -> JobPoller {
        JobPoller::new(PollConfig {
            interval: Duration::from_secs(interval_secs),
            timeout: Duration::from_secs(timeout_secs),
            max_transient_errors: 2,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_returns_artifact_and_stops() {
        let backend = ScriptedBackend::new(&[
            Step::Queued("RECEIVED"),
            Step::Processing("GENERATING"),
            Step::Succeeded("https://cdn.example.com/song.ogg"),
            Step::Processing("SHOULD NOT BE SEEN"),
        ]);

        let result = poller(5, 600).wait(&backend, &JobId::new("job-1")).await;

        assert_eq!(result.unwrap(), "https://cdn.example.com/song.ogg");
        assert_eq!(backend.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_stops_querying() {
        let backend = ScriptedBackend::new(&[Step::Processing("GENERATING")]);
        let started = Instant::now();

        let result = poller(5, 22).wait(&backend, &JobId::new("slow")).await;

        match result {
            Err(PollError::Timeout { job, attempts, .. }) => {
                assert_eq!(job.as_str(), "slow");
                assert_eq!(attempts, 5);
            }
            other => panic!("expected timeout, got {:?}", other),
        }

        let calls = backend.calls();
        assert_eq!(calls.len(), 5);
        assert!(calls
            .iter()
            .all(|t| t.duration_since(started) <= Duration::from_secs(22)));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(backend.calls().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_status_check_is_cut_off_at_deadline() {
        let backend = ScriptedBackend::new(&[Step::Processing("GENERATING"), Step::Stall]);
        let started = Instant::now();

        let result = poller(5, 30).wait(&backend, &JobId::new("hung")).await;

        match result {
            Err(PollError::Timeout { attempts, elapsed, .. }) => {
                assert_eq!(attempts, 2);
                assert!(elapsed >= Duration::from_secs(30) && elapsed < Duration::from_secs(31));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
        assert!(started.elapsed() < Duration::from_secs(31));
        assert_eq!(backend.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_not_retried() {
        let backend = ScriptedBackend::new(&[
            Step::Failed("Content policy violation"),
            Step::Succeeded("https://cdn.example.com/never.ogg"),
        ]);

        let result = poller(5, 600).wait(&backend, &JobId::new("bad")).await;

        match result {
            Err(PollError::Failed { reason, .. }) => assert_eq!(reason, "Content policy violation"),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_between_queries() {
        let backend = ScriptedBackend::new(&[
            Step::Processing("A"),
            Step::Processing("B"),
            Step::Processing("C"),
            Step::Succeeded("done"),
        ]);

        poller(7, 600)
            .wait(&backend, &JobId::new("steady"))
            .await
            .unwrap();

        let calls = backend.calls();
        assert_eq!(calls.len(), 4);
        for pair in calls.windows(2) {
            assert!(pair[1].duration_since(pair[0]) >= Duration::from_secs(7));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_are_tolerated() {
        let backend = ScriptedBackend::new(&[
            Step::Unavailable,
            Step::Unavailable,
            Step::Processing("GENERATING"),
            Step::Unavailable,
            Step::Succeeded("ok"),
        ]);

        let result = poller(1, 600).wait(&backend, &JobId::new("flaky")).await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(backend.calls().len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_too_many_transient_errors_abort() {
        let backend = ScriptedBackend::new(&[Step::Unavailable]);

        let result = poller(1, 600).wait(&backend, &JobId::new("down")).await;

        assert!(matches!(result, Err(PollError::Api { .. })));
        assert_eq!(backend.calls().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_aborts_immediately() {
        let backend = ScriptedBackend::new(&[Step::Unauthorized]);

        let result = poller(1, 600).wait(&backend, &JobId::new("nokey")).await;

        match result {
            Err(PollError::Api { source, .. }) => assert!(!source.is_retryable()),
            other => panic!("expected api error, got {:?}", other),
        }
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_sees_label_changes_once() {
        let backend = ScriptedBackend::new(&[
            Step::Queued("RECEIVED"),
            Step::Processing("GENERATING"),
            Step::Processing("GENERATING"),
            Step::Processing("SAVING"),
            Step::Succeeded("done"),
        ]);
        let mut seen = Vec::new();

        poller(5, 600)
            .wait_with(&backend, &JobId::new("watched"), |status, label| {
                seen.push((status, label.to_string()))
            })
            .await
            .unwrap();

        assert_eq!(
            seen,
            vec![
                (JobStatus::Queued, "RECEIVED".to_string()),
                (JobStatus::Processing, "GENERATING".to_string()),
                (JobStatus::Processing, "SAVING".to_string()),
                (JobStatus::Succeeded, "SUCCESS".to_string()),
            ]
        );
    }

    #[test]
    fn test_with_timeout_keeps_cadence() {
        let base = JobPoller::default();
        let video = base.with_timeout(Duration::from_secs(900));

        assert_eq!(video.config().interval, Duration::from_secs(5));
        assert_eq!(video.config().timeout, Duration::from_secs(900));
        assert_eq!(video.config().max_transient_errors, 3);
    }
}
