//! Administrative run-now mirrors of the recurring jobs.
//!
//! Each handler executes the same unit of work the timer loop runs, and
//! returns the same aggregate report the loop would log.

use api_types::batch::{BatchFailureView, BatchReport};
use api_types::jobs::JobRun;
use axum::{Extension, Json, extract::State};
use engine::{BatchOutcome, Period};

use crate::{ServerError, server::ServerState, staff};

pub(crate) fn report(outcome: BatchOutcome) -> BatchReport {
    BatchReport {
        succeeded: outcome.succeeded,
        skipped: outcome.skipped,
        failures: outcome
            .failures
            .into_iter()
            .map(|f| BatchFailureView {
                id: f.id,
                reason: f.reason,
            })
            .collect(),
    }
}

pub async fn run_lessons(
    Extension(_member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<JobRun>,
) -> Result<Json<BatchReport>, ServerError> {
    let clock = state.engine.clock();
    let today = payload.date.unwrap_or_else(|| clock.local_date(clock.now_utc()));
    let outcome = state.engine.run_daily_progression(today).await?;
    Ok(Json(report(outcome)))
}

pub async fn run_journals(
    Extension(_member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<JobRun>,
) -> Result<Json<BatchReport>, ServerError> {
    let clock = state.engine.clock();
    let today = payload.date.unwrap_or_else(|| clock.local_date(clock.now_utc()));
    let outcome = state.engine.roll_forward_journals(today).await?;
    Ok(Json(report(outcome)))
}

pub async fn run_charges(
    Extension(member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<JobRun>,
) -> Result<Json<BatchReport>, ServerError> {
    let clock = state.engine.clock();
    let today = clock.local_date(clock.now_utc());
    let period = match (payload.month, payload.year) {
        (Some(month), Some(year)) => Period::new(month, year)?,
        (None, None) => Period::of(today),
        _ => {
            return Err(ServerError::Generic(
                "month and year must be provided together".to_string(),
            ));
        }
    };
    let outcome = state
        .engine
        .run_monthly_charge(period, &member.performer())
        .await?;
    Ok(Json(report(outcome)))
}
