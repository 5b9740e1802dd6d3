mod common;

use chrono::NaiveDate;
use common::{engine_with_db, enrolled_student, performer, started_group};
use engine::{
    AdvanceStatus, EngineError, PayrollContract, PayrollInputs, Period, PersonKind,
};

const CENTER: &str = "center-1";

fn period() -> Period {
    Period::new(3, 2026).unwrap()
}

fn march(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
}

async fn fixed_hourly_contract(engine: &engine::Engine, person: &str) -> PayrollContract {
    let contract = PayrollContract::new(
        person.to_string(),
        PersonKind::Mentor,
        CENTER.to_string(),
        500_00,
        20_00,
        0,
        march(1),
        None,
    )
    .unwrap();
    engine.create_contract(contract).await.unwrap()
}

#[tokio::test]
async fn fixed_plus_hourly_arithmetic() {
    let engine = engine_with_db().await;
    fixed_hourly_contract(&engine, "mentor-1").await;

    // 10 hours over two sessions.
    engine
        .log_work("mentor-1", PersonKind::Mentor, march(3), 360, None)
        .await
        .unwrap();
    engine
        .log_work("mentor-1", PersonKind::Mentor, march(4), 240, None)
        .await
        .unwrap();

    let record = engine
        .calculate_payroll(
            "mentor-1",
            PersonKind::Mentor,
            CENTER,
            period(),
            PayrollInputs::default(),
        )
        .await
        .unwrap();

    assert_eq!(record.breakdown.minutes, 600);
    assert_eq!(record.breakdown.fixed_minor, 500_00);
    assert_eq!(record.breakdown.hourly_minor, 200_00);
    assert_eq!(record.gross_minor, 700_00);
    assert_eq!(record.net_minor, 700_00);
}

#[tokio::test]
async fn percentage_component_follows_attributable_charges() {
    let engine = engine_with_db().await;
    let group = started_group(&engine, "mentor-1", 100_00).await;
    let (student, account) = enrolled_student(&engine, group.id, "aziza", 20_00).await;
    engine
        .top_up(&account.code, 200_00, None, &performer())
        .await
        .unwrap();
    engine
        .charge_for_group(student.id, group.id, period(), &performer())
        .await
        .unwrap();

    // Half of the group's collected payments.
    let contract = PayrollContract::new(
        "mentor-1".to_string(),
        PersonKind::Mentor,
        CENTER.to_string(),
        0,
        0,
        5_000,
        march(1),
        None,
    )
    .unwrap();
    engine.create_contract(contract).await.unwrap();

    let record = engine
        .calculate_payroll(
            "mentor-1",
            PersonKind::Mentor,
            CENTER,
            period(),
            PayrollInputs::default(),
        )
        .await
        .unwrap();
    assert_eq!(record.breakdown.percentage_minor, 40_00);
    assert_eq!(record.gross_minor, 40_00);
}

#[tokio::test]
async fn advances_settle_within_gross_and_never_twice() {
    let engine = engine_with_db().await;
    fixed_hourly_contract(&engine, "mentor-1").await;
    engine
        .log_work("mentor-1", PersonKind::Mentor, march(3), 600, None)
        .await
        .unwrap();

    // Gross will be 700; 300 fits, 300 + 500 would not.
    let small = engine
        .grant_advance("mentor-1", PersonKind::Mentor, CENTER, 300_00, period())
        .await
        .unwrap();
    let large = engine
        .grant_advance("mentor-1", PersonKind::Mentor, CENTER, 500_00, period())
        .await
        .unwrap();

    let record = engine
        .calculate_payroll(
            "mentor-1",
            PersonKind::Mentor,
            CENTER,
            period(),
            PayrollInputs::default(),
        )
        .await
        .unwrap();
    assert_eq!(record.breakdown.advance_minor, 300_00);
    assert_eq!(record.net_minor, 400_00);

    // Recalculation releases and re-settles; the deduction stays the same.
    let recalculated = engine
        .calculate_payroll(
            "mentor-1",
            PersonKind::Mentor,
            CENTER,
            period(),
            PayrollInputs {
                bonus_minor: 50_00,
                fine_minor: 0,
            },
        )
        .await
        .unwrap();
    assert_eq!(recalculated.id, record.id);
    assert_eq!(recalculated.breakdown.advance_minor, 300_00);
    assert_eq!(recalculated.gross_minor, 750_00);
    assert_eq!(recalculated.net_minor, 450_00);

    let small = engine.cancel_advance(small.id).await.unwrap_err();
    assert!(matches!(small, EngineError::InvalidTransition(_)));
    let cancelled = engine.cancel_advance(large.id).await.unwrap();
    assert_eq!(cancelled.status, AdvanceStatus::Cancelled);
}

#[tokio::test]
async fn status_moves_forward_only() {
    let engine = engine_with_db().await;
    fixed_hourly_contract(&engine, "mentor-1").await;

    let record = engine
        .calculate_payroll(
            "mentor-1",
            PersonKind::Mentor,
            CENTER,
            period(),
            PayrollInputs::default(),
        )
        .await
        .unwrap();

    // Draft cannot jump straight to Paid.
    let err = engine.mark_payroll_paid(record.id).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));

    engine.approve_payroll(record.id).await.unwrap();
    // Approved records are frozen against recalculation.
    let err = engine
        .calculate_payroll(
            "mentor-1",
            PersonKind::Mentor,
            CENTER,
            period(),
            PayrollInputs::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    let err = engine.approve_payroll(record.id).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));

    engine.mark_payroll_paid(record.id).await.unwrap();
    let err = engine.approve_payroll(record.id).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidTransition(_)));
}

#[tokio::test]
async fn work_logs_freeze_once_payroll_is_approved() {
    let engine = engine_with_db().await;
    fixed_hourly_contract(&engine, "mentor-1").await;
    let log = engine
        .log_work("mentor-1", PersonKind::Mentor, march(3), 120, None)
        .await
        .unwrap();

    let record = engine
        .calculate_payroll(
            "mentor-1",
            PersonKind::Mentor,
            CENTER,
            period(),
            PayrollInputs::default(),
        )
        .await
        .unwrap();
    engine.approve_payroll(record.id).await.unwrap();

    let err = engine
        .log_work("mentor-1", PersonKind::Mentor, march(10), 60, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
    let err = engine
        .update_work_log(log.id, march(3), 90, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));
    let err = engine.delete_work_log(log.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    // Another month stays open.
    engine
        .log_work("mentor-1", PersonKind::Mentor, march(31) + chrono::Duration::days(1), 60, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn overlapping_active_contracts_conflict() {
    let engine = engine_with_db().await;
    let first = fixed_hourly_contract(&engine, "mentor-1").await;

    let second = PayrollContract::new(
        "mentor-1".to_string(),
        PersonKind::Mentor,
        CENTER.to_string(),
        600_00,
        0,
        0,
        march(15),
        None,
    )
    .unwrap();
    let err = engine.create_contract(second.clone()).await.unwrap_err();
    assert!(matches!(err, EngineError::Conflict(_)));

    // Closing the first contract clears the way.
    engine.end_contract(first.id, march(14)).await.unwrap();
    engine.create_contract(second).await.unwrap();
}

#[tokio::test]
async fn month_batch_covers_every_contracted_person() {
    let engine = engine_with_db().await;
    fixed_hourly_contract(&engine, "mentor-1").await;
    let employee = PayrollContract::new(
        "employee-1".to_string(),
        PersonKind::Employee,
        CENTER.to_string(),
        300_00,
        0,
        0,
        march(1),
        None,
    )
    .unwrap();
    engine.create_contract(employee).await.unwrap();

    let outcome = engine
        .calculate_all_for_month(CENTER, period())
        .await
        .unwrap();
    assert_eq!(outcome.succeeded, 2);
    assert!(outcome.failures.is_empty());

    let summary = engine.monthly_summary(CENTER, period()).await.unwrap();
    assert_eq!(summary.records.len(), 2);
    assert_eq!(summary.total_gross_minor, 500_00 + 300_00);
    assert_eq!(summary.total_net_minor, summary.total_gross_minor);
}
