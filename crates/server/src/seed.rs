//! Seeding endpoints: constructors only, no generic CRUD.

use api_types::seed::{
    EnrollmentNew, EnrollmentView, GroupNew, GroupView, StudentNew, StudentView,
};
use axum::{Extension, Json, extract::State};
use engine::Group;

use crate::{ServerError, server::ServerState, staff};

pub async fn group_new(
    Extension(_member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<GroupNew>,
) -> Result<Json<GroupView>, ServerError> {
    let mut group = Group::new(
        payload.name,
        payload.mentor_id,
        payload.start_date,
        payload.total_weeks,
        payload.lessons_per_day,
        payload.lesson_start,
        payload.lesson_end,
        payload.monthly_fee_minor,
    )?;
    group.classroom = payload.classroom;
    let group = state.engine.create_group(group).await?;
    if payload.start.unwrap_or(false) {
        state.engine.start_group(group.id).await?;
    }
    Ok(Json(GroupView {
        id: group.id,
        name: group.name,
        start_date: group.start_date,
        end_date: group.end_date,
        total_weeks: group.total_weeks,
        started: payload.start.unwrap_or(false),
    }))
}

pub async fn student_new(
    Extension(_member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<StudentNew>,
) -> Result<Json<StudentView>, ServerError> {
    let student = state
        .engine
        .create_student(&payload.name, payload.phone)
        .await?;
    let account_code = match payload.account_code {
        Some(code) => Some(state.engine.open_account(student.id, &code).await?.code),
        None => None,
    };
    Ok(Json(StudentView {
        id: student.id,
        name: student.name,
        account_code,
    }))
}

pub async fn enrollment_new(
    Extension(_member): Extension<staff::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<EnrollmentNew>,
) -> Result<Json<EnrollmentView>, ServerError> {
    let clock = state.engine.clock();
    let today = clock.local_date(clock.now_utc());
    let enrollment = state
        .engine
        .enroll_student(payload.student_id, payload.group_id, payload.discount_minor, today)
        .await?;
    Ok(Json(EnrollmentView {
        id: enrollment.id,
        student_id: enrollment.student_id,
        group_id: enrollment.group_id,
        discount_minor: enrollment.discount_minor,
    }))
}
