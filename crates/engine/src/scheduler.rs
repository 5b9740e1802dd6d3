//! Recurring job driver.
//!
//! Every background process (lesson progression, journal rollover, monthly
//! charges) is one [`RecurringJob`]: a cadence plus an idempotent unit of
//! work. The driver computes the next fire instant in the center's civil
//! timezone, sleeps until then, runs the work, and keeps going. A failed
//! iteration is logged and followed by a fixed cooldown; it never stops the
//! loop. Shutdown interrupts any sleep promptly but lets in-flight work
//! finish, so partial writes are never torn.

use std::future::Future;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, NaiveTime, Utc};
use tokio::sync::watch;

use crate::{CenterClock, EngineError, ops::BatchOutcome};

const FAILURE_COOLDOWN: StdDuration = StdDuration::from_secs(5 * 60);

/// When the next iteration should fire.
#[derive(Clone, Copy, Debug)]
pub enum JobSchedule {
    /// Once a day at the given local wall-clock time.
    DailyAt(NaiveTime),
    /// On a fixed interval, measured from the end of the previous sleep.
    Every(StdDuration),
}

impl JobSchedule {
    fn next_fire(self, clock: &CenterClock, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            Self::DailyAt(at) => clock.next_daily(at, now),
            Self::Every(interval) => {
                now + Duration::from_std(interval).unwrap_or_else(|_| Duration::seconds(60))
            }
        }
    }
}

/// A named cadence + unit of work pair.
///
/// The same unit of work backs both the timer loop and the administrative
/// "run now" path ([`RecurringJob::run_once`]).
pub struct RecurringJob<F> {
    name: &'static str,
    schedule: JobSchedule,
    cooldown: StdDuration,
    work: F,
}

impl<F, Fut> RecurringJob<F>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<BatchOutcome, EngineError>>,
{
    #[must_use]
    pub fn new(name: &'static str, schedule: JobSchedule, work: F) -> Self {
        Self {
            name,
            schedule,
            cooldown: FAILURE_COOLDOWN,
            work,
        }
    }

    /// Overrides the failure cooldown (tests).
    #[must_use]
    pub fn cooldown(mut self, cooldown: StdDuration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Runs one iteration outside the timer loop.
    pub async fn run_once(&self) -> Result<BatchOutcome, EngineError> {
        (self.work)().await
    }

    /// Runs the loop until `shutdown` flips to `true` (or its sender drops).
    pub async fn run(self, clock: CenterClock, mut shutdown: watch::Receiver<bool>) {
        loop {
            let now = clock.now_utc();
            let next = self.schedule.next_fire(&clock, now);
            let delay = (next - now).to_std().unwrap_or_default();
            tracing::debug!(job = self.name, next = %next, "sleeping until next run");

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!(job = self.name, "shutdown requested, stopping");
                        return;
                    }
                    continue;
                }
            }

            match (self.work)().await {
                Ok(outcome) if outcome.failures.is_empty() => {
                    tracing::info!(
                        job = self.name,
                        succeeded = outcome.succeeded,
                        "iteration complete"
                    );
                }
                Ok(outcome) => {
                    tracing::warn!(
                        job = self.name,
                        succeeded = outcome.succeeded,
                        failed = outcome.failures.len(),
                        "iteration complete with failures"
                    );
                    for failure in &outcome.failures {
                        tracing::warn!(job = self.name, item = %failure.id, "{}", failure.reason);
                    }
                }
                Err(err) => {
                    tracing::error!(job = self.name, "iteration failed: {err}");
                    tokio::select! {
                        _ = tokio::time::sleep(self.cooldown) => {}
                        changed = shutdown.changed() => {
                            if changed.is_err() || *shutdown.borrow() {
                                tracing::info!(job = self.name, "shutdown requested, stopping");
                                return;
                            }
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use chrono_tz::Asia::Tashkent;

    #[tokio::test]
    async fn shutdown_interrupts_the_sleep() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = counter.clone();
        let job = RecurringJob::new(
            "test-tick",
            JobSchedule::Every(StdDuration::from_millis(5)),
            move || {
                let counter = seen.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(BatchOutcome::default())
                }
            },
        );

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(job.run(CenterClock::new(Tashkent), rx));

        tokio::time::sleep(StdDuration::from_millis(40)).await;
        tx.send(true).unwrap();

        tokio::time::timeout(StdDuration::from_secs(1), handle)
            .await
            .expect("loop did not stop on shutdown")
            .unwrap();
        assert!(counter.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn failure_cools_down_and_resumes() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = counter.clone();
        let job = RecurringJob::new(
            "test-failing",
            JobSchedule::Every(StdDuration::from_millis(5)),
            move || {
                let counter = seen.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    if n == 0 {
                        Err(EngineError::InvalidInput("boom".to_string()))
                    } else {
                        Ok(BatchOutcome::default())
                    }
                }
            },
        )
        .cooldown(StdDuration::from_millis(5));

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(job.run(CenterClock::new(Tashkent), rx));

        tokio::time::sleep(StdDuration::from_millis(60)).await;
        tx.send(true).unwrap();
        tokio::time::timeout(StdDuration::from_secs(1), handle)
            .await
            .expect("loop did not stop on shutdown")
            .unwrap();

        // The first iteration failed and the loop still ran again.
        assert!(counter.load(Ordering::SeqCst) >= 2);
    }
}
