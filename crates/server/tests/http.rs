use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::Engine as _;
use http_body_util::BodyExt;
use sea_orm::{ActiveValue, Database, EntityTrait};
use serde_json::{Value, json};
use tower::ServiceExt;

use server::{ServerState, router};

mod staff_table {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
    #[sea_orm(table_name = "staff")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub username: String,
        pub password: String,
        pub display_name: String,
        pub active: bool,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

async fn test_router() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    let member = staff_table::ActiveModel {
        username: ActiveValue::Set("admin".to_string()),
        password: ActiveValue::Set("secret".to_string()),
        display_name: ActiveValue::Set("Front Desk".to_string()),
        active: ActiveValue::Set(true),
    };
    staff_table::Entity::insert(member).exec(&db).await.unwrap();

    let engine = engine::Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    router(ServerState {
        engine: std::sync::Arc::new(engine),
        db,
    })
}

fn authed(request: axum::http::request::Builder) -> axum::http::request::Builder {
    let credentials = base64::engine::general_purpose::STANDARD.encode("admin:secret");
    request.header(header::AUTHORIZATION, format!("Basic {credentials}"))
}

async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = authed(Request::builder().method("POST").uri(uri))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = authed(Request::builder().method("GET").uri(uri))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn requests_without_credentials_are_rejected() {
    let app = test_router().await;
    let request = Request::builder()
        .method("GET")
        .uri("/accounts/ACC-1")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn top_up_and_charge_through_the_api() {
    let app = test_router().await;

    let (status, group) = post_json(
        &app,
        "/groups",
        json!({
            "name": "Rust 101",
            "mentor_id": "mentor-1",
            "start_date": "2026-03-02",
            "total_weeks": 12,
            "lessons_per_day": 1,
            "lesson_start": "09:00:00",
            "lesson_end": "10:30:00",
            "monthly_fee_minor": 10000,
            "start": true
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let group_id = group["id"].as_str().unwrap().to_string();

    let (status, student) = post_json(
        &app,
        "/students",
        json!({ "name": "Aziza", "account_code": "acc-7" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let student_id = student["id"].as_str().unwrap().to_string();
    assert_eq!(student["account_code"], "ACC-7");

    let (status, _) = post_json(
        &app,
        "/enrollments",
        json!({ "student_id": student_id, "group_id": group_id, "discount_minor": 2000 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Charging an empty account records the failure as 422.
    let (status, body) = post_json(
        &app,
        "/accounts/charge",
        json!({ "student_id": student_id, "group_id": group_id, "month": 3, "year": 2026 }),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("below the amount due"));

    let (status, _) = post_json(
        &app,
        "/accounts/topUp",
        json!({ "account_code": "ACC-7", "amount_minor": 10000 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, result) = post_json(
        &app,
        "/accounts/charge",
        json!({ "student_id": student_id, "group_id": group_id, "month": 3, "year": 2026 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(result["outcome"], "charged");
    assert_eq!(result["amount_minor"], 8000);

    let (status, account) = get_json(&app, "/accounts/ACC-7").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(account["balance_minor"], 2000);

    let (status, logs) = get_json(&app, "/accounts/ACC-7/logs?limit=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logs["logs"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn journal_conflicts_surface_as_409() {
    let app = test_router().await;

    let (_, group) = post_json(
        &app,
        "/groups",
        json!({
            "name": "Rust 101",
            "mentor_id": "mentor-1",
            "start_date": "2026-03-02",
            "total_weeks": 12,
            "lessons_per_day": 1,
            "lesson_start": "09:00:00",
            "lesson_end": "10:30:00",
            "monthly_fee_minor": 10000,
            "start": true
        }),
    )
    .await;
    let group_id = group["id"].as_str().unwrap().to_string();
    let (_, student) = post_json(&app, "/students", json!({ "name": "Aziza" })).await;
    let student_id = student["id"].as_str().unwrap().to_string();
    post_json(
        &app,
        "/enrollments",
        json!({ "student_id": student_id, "group_id": group_id, "discount_minor": 0 }),
    )
    .await;

    let (status, journal) = post_json(
        &app,
        "/journals",
        json!({ "group_id": group_id, "week_number": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(journal["week_number"], 1);

    let (status, _) = post_json(
        &app,
        "/journals",
        json!({ "group_id": group_id, "week_number": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, totals) = get_json(
        &app,
        &format!("/journals/totals?group_id={group_id}&week_number=1"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(totals["totals"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn run_now_endpoints_report_batch_outcomes() {
    let app = test_router().await;

    let (_, group) = post_json(
        &app,
        "/groups",
        json!({
            "name": "Rust 101",
            "mentor_id": "mentor-1",
            "start_date": "2026-03-02",
            "total_weeks": 12,
            "lessons_per_day": 1,
            "lesson_start": "09:00:00",
            "lesson_end": "10:30:00",
            "monthly_fee_minor": 10000,
            "start": true
        }),
    )
    .await;
    let group_id = group["id"].as_str().unwrap().to_string();
    let (_, student) = post_json(&app, "/students", json!({ "name": "Aziza" })).await;
    let student_id = student["id"].as_str().unwrap().to_string();
    post_json(
        &app,
        "/enrollments",
        json!({ "student_id": student_id, "group_id": group_id, "discount_minor": 0 }),
    )
    .await;

    let (status, outcome) = post_json(
        &app,
        "/jobs/lessons/run",
        json!({ "date": "2026-03-02" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["succeeded"], 1);
    assert_eq!(outcome["failures"].as_array().unwrap().len(), 0);

    let (status, outcome) = post_json(
        &app,
        "/jobs/journals/run",
        json!({ "date": "2026-03-02" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outcome["succeeded"], 1);
}
