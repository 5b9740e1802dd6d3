use chrono::{NaiveDate, NaiveTime};
use sea_orm::Database;

use engine::{Engine, Group, Performer, Student, StudentAccount};
use migration::MigratorTrait;
use uuid::Uuid;

pub async fn engine_with_db() -> Engine {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    Engine::builder().database(db).build().await.unwrap()
}

pub fn monday() -> NaiveDate {
    // 2026-03-02 is a Monday.
    NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
}

pub fn performer() -> Performer {
    Performer {
        id: "staff-1".to_string(),
        name: "Front Desk".to_string(),
    }
}

/// A started 12-week group with one lesson per day and the given monthly fee.
pub async fn started_group(engine: &Engine, mentor_id: &str, fee_minor: i64) -> Group {
    let group = Group::new(
        "Rust 101".to_string(),
        mentor_id.to_string(),
        monday(),
        12,
        1,
        NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
        fee_minor,
    )
    .unwrap();
    let group = engine.create_group(group).await.unwrap();
    engine.start_group(group.id).await.unwrap();
    group
}

/// A student enrolled in the group with an open wallet account.
pub async fn enrolled_student(
    engine: &Engine,
    group_id: Uuid,
    name: &str,
    discount_minor: i64,
) -> (Student, StudentAccount) {
    let student = engine.create_student(name, None).await.unwrap();
    engine
        .enroll_student(student.id, group_id, discount_minor, monday())
        .await
        .unwrap();
    let account = engine
        .open_account(student.id, &format!("ACC-{}", name.to_uppercase()))
        .await
        .unwrap();
    (student, account)
}
