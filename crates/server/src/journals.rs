//! Journal API endpoints.

use api_types::journal::{
    Attendance, Backfill, BackfillResult, EntryKind, EntryUpdate, EntryView, JournalGenerate,
    JournalView, PassRateQuery, PassRateView, WeekQuery, WeekTotalView, WeekTotalsResponse,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, staff};

fn map_attendance(status: engine::AttendanceStatus) -> Attendance {
    match status {
        engine::AttendanceStatus::Unset => Attendance::Unset,
        engine::AttendanceStatus::Present => Attendance::Present,
        engine::AttendanceStatus::Absent => Attendance::Absent,
        engine::AttendanceStatus::Late => Attendance::Late,
    }
}

fn map_attendance_in(status: Attendance) -> engine::AttendanceStatus {
    match status {
        Attendance::Unset => engine::AttendanceStatus::Unset,
        Attendance::Present => engine::AttendanceStatus::Present,
        Attendance::Absent => engine::AttendanceStatus::Absent,
        Attendance::Late => engine::AttendanceStatus::Late,
    }
}

fn map_kind(kind: engine::LessonKind) -> EntryKind {
    match kind {
        engine::LessonKind::Regular => EntryKind::Regular,
        engine::LessonKind::Exam => EntryKind::Exam,
    }
}

fn journal_view(journal: engine::Journal) -> JournalView {
    JournalView {
        id: journal.id,
        group_id: journal.group_id,
        week_number: journal.week_number,
        week_start: journal.week_start,
        week_end: journal.week_end,
    }
}

pub async fn generate(
    Extension(_member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<JournalGenerate>,
) -> Result<Json<JournalView>, ServerError> {
    let journal = match payload.week_start {
        Some(week_start) => {
            state
                .engine
                .generate_journal_from_date(payload.group_id, payload.week_number, week_start)
                .await?
        }
        None => {
            state
                .engine
                .generate_journal(payload.group_id, payload.week_number)
                .await?
        }
    };
    Ok(Json(journal_view(journal)))
}

pub async fn delete(
    Extension(_member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<()>, ServerError> {
    state.engine.delete_journal(id).await?;
    Ok(Json(()))
}

pub async fn backfill(
    Extension(_member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<Backfill>,
) -> Result<Json<BackfillResult>, ServerError> {
    let clock = state.engine.clock();
    let date = payload.date.unwrap_or_else(|| clock.local_date(clock.now_utc()));
    let entries_changed = state
        .engine
        .backfill_student(payload.group_id, payload.student_id, date)
        .await?;
    Ok(Json(BackfillResult { entries_changed }))
}

pub async fn update_entry(
    Extension(member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<EntryUpdate>,
) -> Result<Json<EntryView>, ServerError> {
    let patch = engine::EntryPatch {
        grade: payload.grade,
        bonus: payload.bonus,
        attendance: payload.attendance.map(map_attendance_in),
        comment: payload.comment,
    };
    let entry = state
        .engine
        .update_entry(id, patch, &member.performer())
        .await?;
    Ok(Json(EntryView {
        id: entry.id,
        journal_id: entry.journal_id,
        student_id: entry.student_id,
        day: entry.day,
        lesson_number: entry.lesson_number,
        grade: entry.grade,
        bonus: entry.bonus,
        attendance: map_attendance(entry.attendance),
        comment: entry.comment,
        comment_author_name: entry.comment_author_name,
        kind: map_kind(entry.kind),
    }))
}

pub async fn week_totals(
    Extension(_member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Query(query): Query<WeekQuery>,
) -> Result<Json<WeekTotalsResponse>, ServerError> {
    let totals = state
        .engine
        .group_week_totals(query.group_id, query.week_number)
        .await?;
    Ok(Json(WeekTotalsResponse {
        totals: totals
            .into_iter()
            .map(|t| WeekTotalView {
                student_id: t.student_id,
                total: t.total,
            })
            .collect(),
    }))
}

pub async fn pass_rate(
    Extension(_member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Query(query): Query<PassRateQuery>,
) -> Result<Json<PassRateView>, ServerError> {
    let rate = state
        .engine
        .pass_rate(query.group_id, query.week_number, query.threshold)
        .await?;
    Ok(Json(PassRateView { rate }))
}
