//! Ledger API endpoints.

use api_types::batch::BatchReport;
use api_types::ledger::{
    AccountView, Charge, ChargeMonth, ChargeResult, LogView, LogsQuery, LogsResponse, TopUp,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use engine::{ChargeOutcome, Period};

use crate::{ServerError, jobs::report, server::ServerState, staff};

fn log_view(log: engine::AccountLog) -> LogView {
    LogView {
        id: log.id,
        amount_minor: log.amount_minor,
        kind: log.kind.as_str().to_string(),
        note: log.note,
        performer_name: log.performer_name,
        group_id: log.group_id,
        period_key: log.period_key,
        created_at: log.created_at,
    }
}

pub async fn top_up(
    Extension(member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TopUp>,
) -> Result<Json<LogView>, ServerError> {
    let log = state
        .engine
        .top_up(
            &payload.account_code,
            payload.amount_minor,
            payload.note,
            &member.performer(),
        )
        .await?;
    Ok(Json(log_view(log)))
}

pub async fn refund(
    Extension(member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TopUp>,
) -> Result<Json<LogView>, ServerError> {
    let log = state
        .engine
        .refund(
            &payload.account_code,
            payload.amount_minor,
            payload.note,
            &member.performer(),
        )
        .await?;
    Ok(Json(log_view(log)))
}

pub async fn charge(
    Extension(member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<Charge>,
) -> Result<Json<ChargeResult>, ServerError> {
    let period = Period::new(payload.month, payload.year)?;
    let outcome = state
        .engine
        .charge_for_group(
            payload.student_id,
            payload.group_id,
            period,
            &member.performer(),
        )
        .await?;
    let (outcome, amount_minor) = match outcome {
        ChargeOutcome::Charged { amount_minor } => ("charged", amount_minor),
        ChargeOutcome::AlreadyCharged => ("already_charged", 0),
        ChargeOutcome::NothingDue => ("nothing_due", 0),
    };
    Ok(Json(ChargeResult {
        outcome: outcome.to_string(),
        amount_minor,
    }))
}

pub async fn charge_month(
    Extension(member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ChargeMonth>,
) -> Result<Json<BatchReport>, ServerError> {
    let period = Period::new(payload.month, payload.year)?;
    let outcome = match payload.group_id {
        Some(group_id) => {
            state
                .engine
                .run_group_charge(group_id, period, &member.performer())
                .await?
        }
        None => {
            state
                .engine
                .run_monthly_charge(period, &member.performer())
                .await?
        }
    };
    Ok(Json(report(outcome)))
}

pub async fn account(
    Extension(_member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Path(code): Path<String>,
) -> Result<Json<AccountView>, ServerError> {
    let account = state.engine.account_balance(&code).await?;
    Ok(Json(AccountView {
        code: account.code,
        student_id: account.student_id,
        balance_minor: account.balance_minor,
        active: account.active,
    }))
}

pub async fn logs(
    Extension(_member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Path(code): Path<String>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<LogsResponse>, ServerError> {
    let limit = query.limit.unwrap_or(50);
    let (logs, next_cursor) = state
        .engine
        .recent_logs(&code, limit, query.cursor.as_deref())
        .await?;
    Ok(Json(LogsResponse {
        logs: logs.into_iter().map(log_view).collect(),
        next_cursor,
    }))
}
