mod common;

use chrono::Duration;
use common::{engine_with_db, enrolled_student, monday, started_group};
use engine::EngineError;

#[tokio::test]
async fn six_steps_build_week_one_exam_and_week_two() {
    let engine = engine_with_db().await;
    let group = started_group(&engine, "mentor-1", 100_00).await;
    enrolled_student(&engine, group.id, "aziza", 0).await;

    for _ in 0..5 {
        let outcome = engine
            .advance_group_schedule(group.id, monday())
            .await
            .unwrap();
        assert!(outcome.lesson_created);
        assert!(!outcome.exam_created);
        assert_eq!(outcome.week, 1);
    }

    let lessons = engine.lessons_for_group(group.id).await.unwrap();
    assert_eq!(lessons.len(), 5);
    assert!(engine.exams_for_group(group.id).await.unwrap().is_empty());

    let sixth = engine
        .advance_group_schedule(group.id, monday())
        .await
        .unwrap();
    assert!(sixth.exam_created);
    assert!(sixth.lesson_created);
    assert_eq!((sixth.week, sixth.day), (2, 1));

    let lessons = engine.lessons_for_group(group.id).await.unwrap();
    assert_eq!(lessons.len(), 6);
    let days: Vec<(u32, u32)> = lessons.iter().map(|l| (l.week, l.day)).collect();
    assert_eq!(days, vec![(1, 1), (1, 2), (1, 3), (1, 4), (1, 5), (2, 1)]);

    let exams = engine.exams_for_group(group.id).await.unwrap();
    assert_eq!(exams.len(), 1);
    assert_eq!(exams[0].week, 1);
}

#[tokio::test]
async fn repeated_runs_never_duplicate_rows() {
    let engine = engine_with_db().await;
    let group = started_group(&engine, "mentor-1", 100_00).await;
    enrolled_student(&engine, group.id, "aziza", 0).await;

    for _ in 0..8 {
        engine
            .advance_group_schedule(group.id, monday())
            .await
            .unwrap();
    }

    let lessons = engine.lessons_for_group(group.id).await.unwrap();
    let mut keys: Vec<(u32, u32)> = lessons.iter().map(|l| (l.week, l.day)).collect();
    let before = keys.len();
    keys.dedup();
    assert_eq!(keys.len(), before);

    let exams = engine.exams_for_group(group.id).await.unwrap();
    assert_eq!(exams.iter().filter(|e| e.week == 1).count(), 1);
}

#[tokio::test]
async fn catch_up_converges_and_is_idempotent() {
    let engine = engine_with_db().await;
    let group = started_group(&engine, "mentor-1", 100_00).await;
    enrolled_student(&engine, group.id, "aziza", 0).await;

    // Friday of week 2.
    let today = monday() + Duration::days(11);
    let steps = engine.catch_up_group(group.id, today).await.unwrap();
    assert_eq!(steps, 10);
    assert_eq!(engine.lessons_for_group(group.id).await.unwrap().len(), 10);

    let again = engine.catch_up_group(group.id, today).await.unwrap();
    assert_eq!(again, 0);
    assert_eq!(engine.lessons_for_group(group.id).await.unwrap().len(), 10);
}

#[tokio::test]
async fn not_started_group_is_rejected() {
    let engine = engine_with_db().await;
    let group = engine
        .create_group(
            engine::Group::new(
                "Paused".to_string(),
                "mentor-1".to_string(),
                monday(),
                4,
                1,
                chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                chrono::NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                100_00,
            )
            .unwrap(),
        )
        .await
        .unwrap();

    let err = engine
        .advance_group_schedule(group.id, monday())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Inactive(_)));
}

#[tokio::test]
async fn daily_run_skips_groups_without_students() {
    let engine = engine_with_db().await;
    let empty = started_group(&engine, "mentor-1", 100_00).await;
    let full = started_group(&engine, "mentor-2", 100_00).await;
    enrolled_student(&engine, full.id, "aziza", 0).await;

    let outcome = engine.run_daily_progression(monday()).await.unwrap();
    assert_eq!(outcome.succeeded, 1);
    assert_eq!(outcome.skipped, 1);
    assert!(outcome.failures.is_empty());

    assert_eq!(engine.lessons_for_group(empty.id).await.unwrap().len(), 0);
    assert_eq!(engine.lessons_for_group(full.id).await.unwrap().len(), 1);
}
