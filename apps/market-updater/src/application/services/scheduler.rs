//! Poll Scheduler
//!
//! Drives the pipeline from independent periodic timers, one task per
//! [`Schedule`].
//!
//! # Tick semantics
//!
//! - The first tick of a schedule fires one full period after start.
//! - A tick awaits its whole pipeline run before the next tick is taken, so
//!   runs of the same schedule never overlap.
//! - A run that outlasts its period delays the next tick; missed ticks are
//!   not queued up.
//! - Different schedules run concurrently and do not block each other.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::pipeline::{Pipeline, PipelineKind};

/// A periodic trigger for one pipeline kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    /// Time between ticks.
    pub every: Duration,
    /// Write path used on each tick.
    pub kind: PipelineKind,
}

impl Schedule {
    /// Create a schedule.
    #[must_use]
    pub const fn new(every: Duration, kind: PipelineKind) -> Self {
        Self { every, kind }
    }
}

/// Runs schedules until cancelled.
pub struct PollScheduler {
    pipeline: Arc<Pipeline>,
    cancel: CancellationToken,
}

impl PollScheduler {
    /// Create a scheduler around a shared pipeline.
    #[must_use]
    pub const fn new(pipeline: Arc<Pipeline>, cancel: CancellationToken) -> Self {
        Self { pipeline, cancel }
    }

    /// Spawn one task per schedule and return their handles.
    ///
    /// Schedules with a zero period are skipped with a warning.
    #[must_use]
    pub fn spawn(&self, schedules: &[Schedule]) -> Vec<JoinHandle<()>> {
        schedules
            .iter()
            .filter(|schedule| {
                if schedule.every.is_zero() {
                    tracing::warn!(kind = schedule.kind.as_str(), "Ignoring zero-period schedule");
                    return false;
                }
                true
            })
            .map(|&schedule| {
                let pipeline = Arc::clone(&self.pipeline);
                let cancel = self.cancel.clone();
                tokio::spawn(run_schedule(pipeline, schedule, cancel))
            })
            .collect()
    }

    /// Run all schedules until the cancellation token fires.
    pub async fn run(self, schedules: Vec<Schedule>) {
        tracing::info!(schedules = schedules.len(), "Starting market info updater");

        for handle in self.spawn(&schedules) {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Schedule task aborted");
            }
        }

        tracing::info!("Market info updater stopped");
    }
}

async fn run_schedule(pipeline: Arc<Pipeline>, schedule: Schedule, cancel: CancellationToken) {
    let mut interval = tokio::time::interval_at(Instant::now() + schedule.every, schedule.every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        kind = schedule.kind.as_str(),
        every_secs = schedule.every.as_secs(),
        "Schedule registered"
    );

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!(kind = schedule.kind.as_str(), "Schedule cancelled");
                break;
            }
            _ = interval.tick() => {
                tracing::debug!(kind = schedule.kind.as_str(), "Tick");
                pipeline.run_tick(schedule.kind).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::application::ports::{FetchError, MarketDataSource};
    use crate::application::services::pipeline::FetchSettings;
    use crate::application::services::sink::{SinkCollections, UpsertSink};
    use crate::domain::market::RawListing;
    use crate::infrastructure::store::InMemoryDocumentStore;

    /// Records how many fetches ran and the peak number in flight.
    #[derive(Default)]
    struct SlowSource {
        delay: Duration,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl MarketDataSource for SlowSource {
        async fn fetch(&self, _limit: u32) -> Result<Vec<RawListing>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Err(FetchError::Transport {
                message: "offline".to_string(),
            })
        }
    }

    fn scheduler(source: Arc<SlowSource>, cancel: CancellationToken) -> PollScheduler {
        let store = Arc::new(InMemoryDocumentStore::new());
        let pipeline = Pipeline::new(
            source,
            UpsertSink::new(store, SinkCollections::default()),
            FetchSettings {
                limit: 10,
                quote_currency: "USD".to_string(),
            },
        );
        PollScheduler::new(Arc::new(pipeline), cancel)
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_waits_one_period() {
        let source = Arc::new(SlowSource::default());
        let cancel = CancellationToken::new();
        let handles = scheduler(source.clone(), cancel.clone())
            .spawn(&[Schedule::new(Duration::from_secs(60), PipelineKind::Individual)]);

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        cancel.cancel();
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn schedules_tick_independently_and_survive_errors() {
        let source = Arc::new(SlowSource::default());
        let cancel = CancellationToken::new();
        let handles = scheduler(source.clone(), cancel.clone()).spawn(&[
            Schedule::new(Duration::from_secs(60), PipelineKind::Individual),
            Schedule::new(Duration::from_secs(60), PipelineKind::Batch),
        ]);

        tokio::time::sleep(Duration::from_secs(125)).await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 4);

        cancel.cancel();
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_run_delays_next_tick_without_overlap() {
        let source = Arc::new(SlowSource {
            delay: Duration::from_secs(90),
            ..SlowSource::default()
        });
        let cancel = CancellationToken::new();
        let handles = scheduler(source.clone(), cancel.clone())
            .spawn(&[Schedule::new(Duration::from_secs(60), PipelineKind::Batch)]);

        // Runs: 60s..150s, then immediately 150s..240s.
        tokio::time::sleep(Duration::from_secs(200)).await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(source.peak.load(Ordering::SeqCst), 1);

        cancel.cancel();
        tokio::time::sleep(Duration::from_secs(60)).await;
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn zero_period_schedule_is_skipped() {
        let source = Arc::new(SlowSource::default());
        let cancel = CancellationToken::new();

        let handles = scheduler(source, cancel)
            .spawn(&[Schedule::new(Duration::ZERO, PipelineKind::Individual)]);

        assert!(handles.is_empty());
    }
}
