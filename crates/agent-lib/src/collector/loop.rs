//! Periodic sampling loop
//!
//! Runs the sampler on a fixed interval until shutdown. Each invocation runs
//! to completion on a blocking thread before the next tick is awaited, so
//! runs never overlap and the log file keeps a single writer.

use super::MetricsProvider;
use crate::sampler::{RunOutcome, Sampler};
use anyhow::Result;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Default interval between sampling runs (5 minutes)
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(300);

/// Drives a [`Sampler`] on a fixed interval
pub struct SamplingLoop<P> {
    sampler: Option<Sampler<P>>,
    interval: Duration,
}

impl<P> SamplingLoop<P>
where
    P: MetricsProvider + 'static,
{
    /// Create a new sampling loop
    pub fn new(sampler: Sampler<P>, interval: Duration) -> Self {
        Self {
            sampler: Some(sampler),
            interval,
        }
    }

    /// Run until `shutdown` fires. Returns the number of completed runs.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> u64 {
        info!(
            interval_secs = self.interval.as_secs(),
            "Starting resource sampling loop"
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut runs = 0u64;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let start = Instant::now();
                    let Some(outcome) = self.run_blocking().await else {
                        break;
                    };
                    runs += 1;

                    match outcome {
                        RunOutcome::Written(report) => debug!(
                            alerts = report.record.alerts().len(),
                            elapsed_ms = start.elapsed().as_millis(),
                            "Sampling cycle complete"
                        ),
                        RunOutcome::WriteFailed(_, e) => {
                            warn!(runs = runs, error = %e, "Sampling cycle finished without writing its record")
                        }
                        RunOutcome::SamplingFailed(e) => {
                            warn!(runs = runs, error = %e, "Sampling cycle aborted")
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!("Shutting down resource sampling loop");
                    break;
                }
            }
        }

        runs
    }

    /// Move the sampler onto a blocking thread for one run and take it back.
    ///
    /// `None` means the sampler was lost to a panicked run.
    async fn run_blocking(&mut self) -> Option<RunOutcome> {
        let mut sampler = self.sampler.take()?;

        match tokio::task::spawn_blocking(move || {
            let outcome = sampler.run_once();
            (sampler, outcome)
        })
        .await
        {
            Ok((sampler, outcome)) => {
                self.sampler = Some(sampler);
                Some(outcome)
            }
            Err(e) => {
                error!(error = %e, "Sampling task panicked, stopping loop");
                None
            }
        }
    }
}

/// Builder for creating the sampling loop
pub struct SamplingLoopBuilder<P> {
    sampler: Option<Sampler<P>>,
    interval: Duration,
}

impl<P> SamplingLoopBuilder<P>
where
    P: MetricsProvider + 'static,
{
    /// Create a new builder with the default interval
    pub fn new() -> Self {
        Self {
            sampler: None,
            interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }

    /// Set the sampler to drive
    pub fn sampler(mut self, sampler: Sampler<P>) -> Self {
        self.sampler = Some(sampler);
        self
    }

    /// Set the interval between runs
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Build the sampling loop
    pub fn build(self) -> Result<SamplingLoop<P>> {
        let sampler = self
            .sampler
            .ok_or_else(|| anyhow::anyhow!("Sampler is required"))?;

        if self.interval.is_zero() {
            anyhow::bail!("Sampling interval must be greater than zero");
        }

        Ok(SamplingLoop::new(sampler, self.interval))
    }
}

impl<P> Default for SamplingLoopBuilder<P>
where
    P: MetricsProvider + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::SamplerError;
    use crate::models::{CpuReading, DiskReading, MemoryReading};
    use crate::sampler::SamplerConfig;
    use std::path::Path;
    use tempfile::TempDir;

    struct QuietProvider;

    impl MetricsProvider for QuietProvider {
        fn sample_cpu(&mut self) -> Result<CpuReading, SamplerError> {
            Ok(CpuReading {
                percent: 5.0,
                logical_cores: 1,
                physical_cores: None,
            })
        }

        fn sample_memory(&mut self) -> Result<MemoryReading, SamplerError> {
            Ok(MemoryReading {
                percent: 5.0,
                total_bytes: 100,
                used_bytes: 5,
                available_bytes: 95,
            })
        }

        fn sample_disk(&mut self, _path: &Path) -> Result<DiskReading, SamplerError> {
            Ok(DiskReading {
                percent: 5.0,
                mount_point: "/".to_string(),
                total_bytes: 100,
                used_bytes: 5,
                available_bytes: 95,
            })
        }
    }

    fn sampler_in(dir: &TempDir) -> Sampler<QuietProvider> {
        Sampler::new(
            QuietProvider,
            SamplerConfig {
                log_path: dir.path().join("system-logs.txt"),
                ..SamplerConfig::default()
            },
        )
    }

    #[test]
    fn test_builder_requires_sampler() {
        let result = SamplingLoopBuilder::<QuietProvider>::new().build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_zero_interval() {
        let dir = TempDir::new().unwrap();
        let result = SamplingLoopBuilder::new()
            .sampler(sampler_in(&dir))
            .interval(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_loop_runs_until_shutdown() {
        let dir = TempDir::new().unwrap();
        let log_path = dir.path().join("system-logs.txt");
        let sampling_loop = SamplingLoopBuilder::new()
            .sampler(sampler_in(&dir))
            .interval(Duration::from_millis(20))
            .build()
            .unwrap();

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = tokio::spawn(sampling_loop.run(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(150)).await;
        shutdown_tx.send(()).unwrap();
        let runs = handle.await.unwrap();

        assert!(runs >= 2, "expected several runs, got {}", runs);
        let lines = std::fs::read_to_string(&log_path).unwrap().lines().count() as u64;
        assert_eq!(lines, runs);
    }
}
