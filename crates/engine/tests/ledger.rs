mod common;

use common::{engine_with_db, enrolled_student, performer, started_group};
use engine::{ChargeOutcome, EngineError, LogKind, PaymentStatus, Period};

#[tokio::test]
async fn top_up_then_charge_leaves_the_difference() {
    let engine = engine_with_db().await;
    let group = started_group(&engine, "mentor-1", 100_00).await;
    let (student, account) = enrolled_student(&engine, group.id, "aziza", 20_00).await;

    engine
        .top_up(&account.code, 100_00, None, &performer())
        .await
        .unwrap();

    let period = Period::new(3, 2025).unwrap();
    let outcome = engine
        .charge_for_group(student.id, group.id, period, &performer())
        .await
        .unwrap();
    assert_eq!(outcome, ChargeOutcome::Charged { amount_minor: 80_00 });

    let account = engine.account_balance(&account.code).await.unwrap();
    assert_eq!(account.balance_minor, 20_00);

    let (logs, _) = engine.recent_logs(&account.code, 10, None).await.unwrap();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].kind, LogKind::Charge);
    assert_eq!(logs[0].amount_minor, -80_00);
    assert_eq!(logs[1].kind, LogKind::TopUp);
    assert_eq!(logs[1].amount_minor, 100_00);

    let status = engine
        .enrollment_status(student.id, group.id)
        .await
        .unwrap();
    assert_eq!(status, PaymentStatus::Paid);
}

#[tokio::test]
async fn charging_the_same_period_twice_is_a_no_op() {
    let engine = engine_with_db().await;
    let group = started_group(&engine, "mentor-1", 100_00).await;
    let (student, account) = enrolled_student(&engine, group.id, "aziza", 0).await;
    engine
        .top_up(&account.code, 300_00, None, &performer())
        .await
        .unwrap();

    let period = Period::new(3, 2025).unwrap();
    let first = engine
        .charge_for_group(student.id, group.id, period, &performer())
        .await
        .unwrap();
    assert!(matches!(first, ChargeOutcome::Charged { .. }));
    let second = engine
        .charge_for_group(student.id, group.id, period, &performer())
        .await
        .unwrap();
    assert_eq!(second, ChargeOutcome::AlreadyCharged);

    let (logs, _) = engine.recent_logs(&account.code, 10, None).await.unwrap();
    assert_eq!(logs.iter().filter(|l| l.kind == LogKind::Charge).count(), 1);

    // A different month charges normally.
    let april = Period::new(4, 2025).unwrap();
    let third = engine
        .charge_for_group(student.id, group.id, april, &performer())
        .await
        .unwrap();
    assert!(matches!(third, ChargeOutcome::Charged { .. }));
}

#[tokio::test]
async fn insufficient_funds_writes_no_ledger_row() {
    let engine = engine_with_db().await;
    let group = started_group(&engine, "mentor-1", 100_00).await;
    let (student, account) = enrolled_student(&engine, group.id, "aziza", 0).await;
    engine
        .top_up(&account.code, 50_00, None, &performer())
        .await
        .unwrap();

    let period = Period::new(3, 2025).unwrap();
    let err = engine
        .charge_for_group(student.id, group.id, period, &performer())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds(_)));

    // Balance untouched, no charge row, enrollment flagged pending.
    let account_after = engine.account_balance(&account.code).await.unwrap();
    assert_eq!(account_after.balance_minor, 50_00);
    let (logs, _) = engine.recent_logs(&account.code, 10, None).await.unwrap();
    assert_eq!(logs.len(), 1);
    let status = engine
        .enrollment_status(student.id, group.id)
        .await
        .unwrap();
    assert_eq!(status, PaymentStatus::Pending);

    // Funding the account makes the retry succeed.
    engine
        .top_up(&account.code, 50_00, None, &performer())
        .await
        .unwrap();
    let outcome = engine
        .charge_for_group(student.id, group.id, period, &performer())
        .await
        .unwrap();
    assert!(matches!(outcome, ChargeOutcome::Charged { .. }));
}

#[tokio::test]
async fn top_up_validates_amount_and_code() {
    let engine = engine_with_db().await;
    let group = started_group(&engine, "mentor-1", 100_00).await;
    let (_, account) = enrolled_student(&engine, group.id, "aziza", 0).await;

    let err = engine
        .top_up(&account.code, 0, None, &performer())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let err = engine
        .top_up("NO-SUCH-CODE", 10_00, None, &performer())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    // Codes are normalized before lookup.
    engine
        .top_up("  acc-aziza ", 10_00, None, &performer())
        .await
        .unwrap();
}

#[tokio::test]
async fn monthly_batch_isolates_failures() {
    let engine = engine_with_db().await;
    let group = started_group(&engine, "mentor-1", 100_00).await;
    let (_, funded) = enrolled_student(&engine, group.id, "aziza", 0).await;
    let (_, broke) = enrolled_student(&engine, group.id, "bobur", 0).await;
    engine
        .top_up(&funded.code, 200_00, None, &performer())
        .await
        .unwrap();
    engine
        .top_up(&broke.code, 10_00, None, &performer())
        .await
        .unwrap();

    let period = Period::new(3, 2025).unwrap();
    let outcome = engine
        .run_monthly_charge(period, &performer())
        .await
        .unwrap();
    assert_eq!(outcome.succeeded, 1);
    assert_eq!(outcome.failures.len(), 1);

    // The re-run skips the charged pair and fails the underfunded one again.
    let rerun = engine
        .run_monthly_charge(period, &performer())
        .await
        .unwrap();
    assert_eq!(rerun.succeeded, 0);
    assert_eq!(rerun.skipped, 1);
    assert_eq!(rerun.failures.len(), 1);
}

#[tokio::test]
async fn balance_always_equals_the_log_sum() {
    let engine = engine_with_db().await;
    let group = started_group(&engine, "mentor-1", 100_00).await;
    let (student, account) = enrolled_student(&engine, group.id, "aziza", 0).await;

    engine
        .top_up(&account.code, 150_00, None, &performer())
        .await
        .unwrap();
    engine
        .charge_for_group(
            student.id,
            group.id,
            Period::new(3, 2025).unwrap(),
            &performer(),
        )
        .await
        .unwrap();
    engine
        .refund(&account.code, 30_00, Some("missed week".to_string()), &performer())
        .await
        .unwrap();

    let (stored, replayed) = engine.recompute_balance(&account.code).await.unwrap();
    assert_eq!(stored, replayed);
    assert_eq!(stored, 150_00 - 100_00 + 30_00);
}

#[tokio::test]
async fn recent_logs_paginate_newest_first() {
    let engine = engine_with_db().await;
    let group = started_group(&engine, "mentor-1", 100_00).await;
    let (_, account) = enrolled_student(&engine, group.id, "aziza", 0).await;

    for amount in [10_00, 20_00, 30_00] {
        engine
            .top_up(&account.code, amount, None, &performer())
            .await
            .unwrap();
    }

    let (page, cursor) = engine.recent_logs(&account.code, 2, None).await.unwrap();
    assert_eq!(page.len(), 2);
    let cursor = cursor.expect("more rows expected");

    let (rest, end) = engine
        .recent_logs(&account.code, 2, Some(&cursor))
        .await
        .unwrap();
    assert_eq!(rest.len(), 1);
    assert!(end.is_none());

    let mut seen: Vec<i64> = page.iter().chain(rest.iter()).map(|l| l.amount_minor).collect();
    seen.sort_unstable();
    assert_eq!(seen, vec![10_00, 20_00, 30_00]);
}
