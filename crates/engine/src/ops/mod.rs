use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{
    CenterClock, EngineError,
    notify::{LogNotifier, Notifier},
};

mod journals;
mod ledger;
mod payroll;
mod progression;
mod roster;
mod seed;

pub use journals::{EntryPatch, WeekTotal};
pub use ledger::ChargeOutcome;
pub use payroll::{MonthlySummary, PayrollInputs};
pub use progression::ProgressionOutcome;

/// Aggregate result of a batch run. Per-item failures are collected here
/// instead of aborting the batch.
#[derive(Clone, Debug, Default)]
pub struct BatchOutcome {
    pub succeeded: usize,
    pub skipped: usize,
    pub failures: Vec<BatchFailure>,
}

#[derive(Clone, Debug)]
pub struct BatchFailure {
    pub id: String,
    pub reason: String,
}

impl BatchOutcome {
    pub(crate) fn success(&mut self) {
        self.succeeded += 1;
    }

    pub(crate) fn skip(&mut self) {
        self.skipped += 1;
    }

    pub(crate) fn fail(&mut self, id: impl Into<String>, err: &EngineError) {
        self.failures.push(BatchFailure {
            id: id.into(),
            reason: err.to_string(),
        });
    }
}

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Clone)]
pub struct Engine {
    database: DatabaseConnection,
    clock: CenterClock,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    #[must_use]
    pub fn clock(&self) -> CenterClock {
        self.clock
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    clock: Option<CenterClock>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Pin the center's civil timezone (defaults to Asia/Tashkent).
    pub fn clock(mut self, clock: CenterClock) -> EngineBuilder {
        self.clock = Some(clock);
        self
    }

    /// Override the payment-notification sink (defaults to logging).
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> EngineBuilder {
        self.notifier = Some(notifier);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> Result<Engine, EngineError> {
        Ok(Engine {
            database: self.database,
            clock: self
                .clock
                .unwrap_or_else(|| CenterClock::new(chrono_tz::Asia::Tashkent)),
            notifier: self.notifier.unwrap_or_else(|| Arc::new(LogNotifier)),
        })
    }
}
