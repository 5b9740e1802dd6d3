//! Payroll API endpoints.

use api_types::batch::BatchReport;
use api_types::payroll::{
    AdvanceNew, AdvanceView, Calculate, CalculateMonth, PersonKind as ApiPersonKind, RecordView,
    SummaryQuery, SummaryView, WorkLogNew, WorkLogUpdate, WorkLogView,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use engine::{PayrollInputs, Period, PersonKind};
use uuid::Uuid;

use crate::{ServerError, jobs::report, server::ServerState, staff};

fn map_person_kind(kind: ApiPersonKind) -> PersonKind {
    match kind {
        ApiPersonKind::Mentor => PersonKind::Mentor,
        ApiPersonKind::Employee => PersonKind::Employee,
    }
}

fn map_person_kind_out(kind: PersonKind) -> ApiPersonKind {
    match kind {
        PersonKind::Mentor => ApiPersonKind::Mentor,
        PersonKind::Employee => ApiPersonKind::Employee,
    }
}

fn record_view(record: engine::PayrollRecord) -> RecordView {
    RecordView {
        id: record.id,
        person_id: record.person_id,
        person_kind: map_person_kind_out(record.person_kind),
        center_id: record.center_id,
        month: record.month,
        year: record.year,
        minutes: record.breakdown.minutes,
        fixed_minor: record.breakdown.fixed_minor,
        hourly_minor: record.breakdown.hourly_minor,
        percentage_minor: record.breakdown.percentage_minor,
        bonus_minor: record.breakdown.bonus_minor,
        fine_minor: record.breakdown.fine_minor,
        advance_minor: record.breakdown.advance_minor,
        gross_minor: record.gross_minor,
        net_minor: record.net_minor,
        status: record.status.as_str().to_string(),
    }
}

fn work_log_view(log: engine::WorkLog) -> WorkLogView {
    WorkLogView {
        id: log.id,
        person_id: log.person_id,
        person_kind: map_person_kind_out(log.person_kind),
        date: log.date,
        minutes: log.minutes,
        group_id: log.group_id,
    }
}

pub async fn work_log_new(
    Extension(_member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<WorkLogNew>,
) -> Result<Json<WorkLogView>, ServerError> {
    let log = state
        .engine
        .log_work(
            &payload.person_id,
            map_person_kind(payload.person_kind),
            payload.date,
            payload.minutes,
            payload.group_id,
        )
        .await?;
    Ok(Json(work_log_view(log)))
}

pub async fn work_log_update(
    Extension(_member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<WorkLogUpdate>,
) -> Result<Json<WorkLogView>, ServerError> {
    let log = state
        .engine
        .update_work_log(id, payload.date, payload.minutes, payload.group_id)
        .await?;
    Ok(Json(work_log_view(log)))
}

pub async fn work_log_delete(
    Extension(_member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<()>, ServerError> {
    state.engine.delete_work_log(id).await?;
    Ok(Json(()))
}

pub async fn calculate(
    Extension(_member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<Calculate>,
) -> Result<Json<RecordView>, ServerError> {
    let period = Period::new(payload.month, payload.year)?;
    let inputs = PayrollInputs {
        bonus_minor: payload.bonus_minor.unwrap_or(0),
        fine_minor: payload.fine_minor.unwrap_or(0),
    };
    let record = state
        .engine
        .calculate_payroll(
            &payload.person_id,
            map_person_kind(payload.person_kind),
            &payload.center_id,
            period,
            inputs,
        )
        .await?;
    Ok(Json(record_view(record)))
}

pub async fn calculate_month(
    Extension(_member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<CalculateMonth>,
) -> Result<Json<BatchReport>, ServerError> {
    let period = Period::new(payload.month, payload.year)?;
    let outcome = state
        .engine
        .calculate_all_for_month(&payload.center_id, period)
        .await?;
    Ok(Json(report(outcome)))
}

pub async fn approve(
    Extension(_member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RecordView>, ServerError> {
    let record = state.engine.approve_payroll(id).await?;
    Ok(Json(record_view(record)))
}

pub async fn mark_paid(
    Extension(_member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RecordView>, ServerError> {
    let record = state.engine.mark_payroll_paid(id).await?;
    Ok(Json(record_view(record)))
}

pub async fn advance_new(
    Extension(_member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<AdvanceNew>,
) -> Result<Json<AdvanceView>, ServerError> {
    let period = Period::new(payload.month, payload.year)?;
    let advance = state
        .engine
        .grant_advance(
            &payload.person_id,
            map_person_kind(payload.person_kind),
            &payload.center_id,
            payload.amount_minor,
            period,
        )
        .await?;
    Ok(Json(advance_view(advance)))
}

pub async fn advance_cancel(
    Extension(_member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AdvanceView>, ServerError> {
    let advance = state.engine.cancel_advance(id).await?;
    Ok(Json(advance_view(advance)))
}

fn advance_view(advance: engine::Advance) -> AdvanceView {
    AdvanceView {
        id: advance.id,
        person_id: advance.person_id,
        amount_minor: advance.amount_minor,
        month: advance.month,
        year: advance.year,
        status: advance.status.as_str().to_string(),
    }
}

pub async fn summary(
    Extension(_member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<SummaryView>, ServerError> {
    let period = Period::new(query.month, query.year)?;
    let summary = state.engine.monthly_summary(&query.center_id, period).await?;
    Ok(Json(SummaryView {
        records: summary.records.into_iter().map(record_view).collect(),
        total_gross_minor: summary.total_gross_minor,
        total_net_minor: summary.total_net_minor,
    }))
}
