mod common;

use chrono::Duration;
use common::{engine_with_db, enrolled_student, monday, performer, started_group};
use engine::{AttendanceStatus, EngineError, EntryPatch, LessonKind};

#[tokio::test]
async fn generate_creates_one_entry_per_student_per_slot() {
    let engine = engine_with_db().await;
    let group = started_group(&engine, "mentor-1", 100_00).await;
    enrolled_student(&engine, group.id, "aziza", 0).await;
    enrolled_student(&engine, group.id, "bobur", 0).await;

    let journal = engine.generate_journal(group.id, 1).await.unwrap();
    assert_eq!(journal.week_number, 1);
    assert_eq!(journal.week_start, monday());
    assert_eq!(journal.week_end, monday() + Duration::days(6));

    // 5 teaching days × 1 lesson + the exam slot, per student.
    let totals = engine.group_week_totals(group.id, 1).await.unwrap();
    assert_eq!(totals.len(), 2);
}

#[tokio::test]
async fn duplicate_generation_conflicts() {
    let engine = engine_with_db().await;
    let group = started_group(&engine, "mentor-1", 100_00).await;
    enrolled_student(&engine, group.id, "aziza", 0).await;

    engine.generate_journal(group.id, 1).await.unwrap();
    let err = engine.generate_journal(group.id, 1).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
}

#[tokio::test]
async fn generation_rejects_weeks_past_the_plan() {
    let engine = engine_with_db().await;
    let group = started_group(&engine, "mentor-1", 100_00).await;
    enrolled_student(&engine, group.id, "aziza", 0).await;

    let err = engine.generate_journal(group.id, 13).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
}

#[tokio::test]
async fn custom_date_rebases_the_window() {
    let engine = engine_with_db().await;
    let group = started_group(&engine, "mentor-1", 100_00).await;
    enrolled_student(&engine, group.id, "aziza", 0).await;

    let rebased = monday() + Duration::days(21);
    let journal = engine
        .generate_journal_from_date(group.id, 1, rebased)
        .await
        .unwrap();
    assert_eq!(journal.week_start, rebased);
    assert_eq!(journal.week_end, rebased + Duration::days(6));
}

#[tokio::test]
async fn midweek_joiner_gets_remaining_days_only() {
    let engine = engine_with_db().await;
    let group = started_group(&engine, "mentor-1", 100_00).await;
    enrolled_student(&engine, group.id, "aziza", 0).await;
    engine.generate_journal(group.id, 1).await.unwrap();

    // Joins on Wednesday: days 3, 4, 5 and the exam slot remain. Enrollment
    // backfills the current week on its own.
    let wednesday = monday() + Duration::days(2);
    let student = engine.create_student("bobur", None).await.unwrap();
    engine
        .enroll_student(student.id, group.id, 0, wednesday)
        .await
        .unwrap();

    let entries = engine
        .journal_entries_for_student(group.id, 1, student.id)
        .await
        .unwrap();
    assert_eq!(entries.len(), 4);
    assert!(entries.iter().all(|e| e.day >= 3));

    // Re-running the backfill adds nothing.
    let again = engine
        .backfill_student(group.id, student.id, wednesday)
        .await
        .unwrap();
    assert_eq!(again, 0);
}

#[tokio::test]
async fn withdrawal_preserves_history() {
    let engine = engine_with_db().await;
    let group = started_group(&engine, "mentor-1", 100_00).await;
    let (student, _) = enrolled_student(&engine, group.id, "aziza", 0).await;
    engine.generate_journal(group.id, 1).await.unwrap();
    engine.generate_journal(group.id, 2).await.unwrap();

    // Leaves on Wednesday of week 1: days 4-6 of week 1 plus all of week 2 go.
    let wednesday = monday() + Duration::days(2);
    let removed = engine
        .withdraw_student(student.id, group.id, wednesday)
        .await
        .unwrap();
    assert_eq!(removed, 3 + 6);

    // Week total still computable over the remaining (historical) entries.
    let total = engine
        .student_week_total(group.id, 1, student.id)
        .await
        .unwrap();
    assert_eq!(total, 0.0);
}

#[tokio::test]
async fn entry_updates_feed_totals_and_pass_rate() {
    let engine = engine_with_db().await;
    let group = started_group(&engine, "mentor-1", 100_00).await;
    let (aziza, _) = enrolled_student(&engine, group.id, "aziza", 0).await;
    let (bobur, _) = enrolled_student(&engine, group.id, "bobur", 0).await;
    engine.generate_journal(group.id, 1).await.unwrap();

    let totals = engine.group_week_totals(group.id, 1).await.unwrap();
    assert!(totals.iter().all(|t| t.total == 0.0));

    // Grade aziza's Monday lesson through the explicit entry update.
    let entries = entries_for(&engine, group.id, aziza.id).await;
    let target = entries
        .iter()
        .find(|e| e.day == 1 && e.kind == LessonKind::Regular)
        .unwrap();
    let patch = EntryPatch {
        grade: Some(4.0),
        bonus: Some(0.5),
        attendance: Some(AttendanceStatus::Present),
        comment: Some("solid work".to_string()),
    };
    let updated = engine
        .update_entry(target.id, patch, &performer())
        .await
        .unwrap();
    assert_eq!(updated.grade, Some(4.0));
    assert_eq!(updated.attendance, AttendanceStatus::Present);
    assert_eq!(updated.comment_author_name.as_deref(), Some("Front Desk"));

    let total = engine
        .student_week_total(group.id, 1, aziza.id)
        .await
        .unwrap();
    assert_eq!(total, 4.5);
    let zero = engine
        .student_week_total(group.id, 1, bobur.id)
        .await
        .unwrap();
    assert_eq!(zero, 0.0);

    // One of two students clears the threshold.
    let rate = engine.pass_rate(group.id, 1, 4.0).await.unwrap();
    assert_eq!(rate, 0.5);
}

#[tokio::test]
async fn grades_outside_range_are_rejected() {
    let engine = engine_with_db().await;
    let group = started_group(&engine, "mentor-1", 100_00).await;
    let (aziza, _) = enrolled_student(&engine, group.id, "aziza", 0).await;
    engine.generate_journal(group.id, 1).await.unwrap();

    let entries = entries_for(&engine, group.id, aziza.id).await;
    let patch = EntryPatch {
        grade: Some(-1.0),
        ..Default::default()
    };
    let err = engine
        .update_entry(entries[0].id, patch, &performer())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
}

#[tokio::test]
async fn roll_forward_extends_closed_weeks() {
    let engine = engine_with_db().await;
    let group = started_group(&engine, "mentor-1", 100_00).await;
    enrolled_student(&engine, group.id, "aziza", 0).await;

    // Nothing yet: the first run creates week 1.
    let outcome = engine.roll_forward_journals(monday()).await.unwrap();
    assert_eq!(outcome.succeeded, 1);

    // Week 1 still open: nothing to do.
    let outcome = engine
        .roll_forward_journals(monday() + Duration::days(3))
        .await
        .unwrap();
    assert_eq!(outcome.succeeded, 0);
    assert_eq!(outcome.skipped, 1);

    // Week 1 closed: week 2 appears.
    let outcome = engine
        .roll_forward_journals(monday() + Duration::days(7))
        .await
        .unwrap();
    assert_eq!(outcome.succeeded, 1);
    let journal = engine.generate_journal(group.id, 2).await.unwrap_err();
    assert!(matches!(journal, EngineError::Conflict(_)));
}

#[tokio::test]
async fn deleted_journal_can_be_regenerated() {
    let engine = engine_with_db().await;
    let group = started_group(&engine, "mentor-1", 100_00).await;
    enrolled_student(&engine, group.id, "aziza", 0).await;

    let journal = engine.generate_journal(group.id, 1).await.unwrap();
    engine.delete_journal(journal.id).await.unwrap();
    engine.generate_journal(group.id, 1).await.unwrap();
}

async fn entries_for(
    engine: &engine::Engine,
    group_id: uuid::Uuid,
    student_id: uuid::Uuid,
) -> Vec<engine::JournalEntry> {
    engine
        .journal_entries_for_student(group_id, 1, student_id)
        .await
        .unwrap()
}
