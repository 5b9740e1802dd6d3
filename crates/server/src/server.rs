use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, patch, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{jobs, journals, ledger, payroll, seed, staff};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

async fn auth(
    auth_header: TypedHeader<Authorization<Basic>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if auth_header.username().is_empty() || auth_header.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let member: Option<staff::Model> = staff::Entity::find()
        .filter(staff::Column::Username.eq(auth_header.username()))
        .filter(staff::Column::Password.eq(auth_header.password()))
        .filter(staff::Column::Active.eq(true))
        .one(&state.db)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;

    let Some(member) = member else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(member);
    Ok(next.run(request).await)
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/jobs/lessons/run", post(jobs::run_lessons))
        .route("/jobs/journals/run", post(jobs::run_journals))
        .route("/jobs/charges/run", post(jobs::run_charges))
        .route("/journals", post(journals::generate))
        .route("/journals/{id}", delete(journals::delete))
        .route("/journals/backfill", post(journals::backfill))
        .route("/journals/entries/{id}", patch(journals::update_entry))
        .route("/journals/totals", get(journals::week_totals))
        .route("/journals/passRate", get(journals::pass_rate))
        .route("/accounts/topUp", post(ledger::top_up))
        .route("/accounts/refund", post(ledger::refund))
        .route("/accounts/charge", post(ledger::charge))
        .route("/accounts/chargeMonth", post(ledger::charge_month))
        .route("/accounts/{code}", get(ledger::account))
        .route("/accounts/{code}/logs", get(ledger::logs))
        .route("/payroll/workLogs", post(payroll::work_log_new))
        .route(
            "/payroll/workLogs/{id}",
            patch(payroll::work_log_update).delete(payroll::work_log_delete),
        )
        .route("/payroll/calculate", post(payroll::calculate))
        .route("/payroll/calculateMonth", post(payroll::calculate_month))
        .route("/payroll/records/{id}/approve", post(payroll::approve))
        .route("/payroll/records/{id}/markPaid", post(payroll::mark_paid))
        .route("/payroll/advances", post(payroll::advance_new))
        .route("/payroll/advances/{id}/cancel", post(payroll::advance_cancel))
        .route("/payroll/summary", get(payroll::summary))
        .route("/groups", post(seed::group_new))
        .route("/students", post(seed::student_new))
        .route("/enrollments", post(seed::enrollment_new))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run(engine: Engine, db: DatabaseConnection) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, db, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, db, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
