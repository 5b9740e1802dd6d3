use std::sync::Arc;

use engine::{CenterClock, Engine, JobSchedule, Performer, Period, RecurringJob};
use migration::{Migrator, MigratorTrait};
use tokio::sync::watch;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "lavagna={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.database).await?;
    let clock = CenterClock::from_name(&settings.center.timezone)?;
    let engine = Arc::new(
        Engine::builder()
            .database(db.clone())
            .clock(clock)
            .build()
            .await?,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut tasks = tokio::task::JoinSet::new();

    if let Some(server) = settings.server {
        let engine = engine.as_ref().clone();
        let db = db.clone();
        tasks.spawn(async move {
            let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
            let addr = format!("{}:{}", bind, server.port);
            let listener = match tokio::net::TcpListener::bind(addr).await {
                Ok(listener) => listener,
                Err(err) => {
                    tracing::error!("failed to bind server listener: {err}");
                    return;
                }
            };
            if let Err(err) = server::run_with_listener(engine, db, listener).await {
                tracing::error!("server failed: {err}");
            }
        });
    }

    let lessons_at = settings::parse_wall_time(&settings.jobs.lessons_at)?;
    let journals_at = settings::parse_wall_time(&settings.jobs.journals_at)?;
    let charges_at = settings::parse_wall_time(&settings.jobs.charges_at)?;

    {
        let engine = engine.clone();
        let job = RecurringJob::new(
            "lesson-progression",
            JobSchedule::DailyAt(lessons_at),
            move || {
                let engine = engine.clone();
                async move {
                    let clock = engine.clock();
                    let today = clock.local_date(clock.now_utc());
                    engine.run_daily_progression(today).await
                }
            },
        );
        tasks.spawn(job.run(clock, shutdown_rx.clone()));
    }

    {
        let engine = engine.clone();
        let job = RecurringJob::new(
            "journal-rollover",
            JobSchedule::DailyAt(journals_at),
            move || {
                let engine = engine.clone();
                async move {
                    let clock = engine.clock();
                    let today = clock.local_date(clock.now_utc());
                    engine.roll_forward_journals(today).await
                }
            },
        );
        tasks.spawn(job.run(clock, shutdown_rx.clone()));
    }

    {
        // The charge run is idempotent per (account, group, month), so a
        // daily cadence only picks up enrollments still unpaid this month.
        let engine = engine.clone();
        let job = RecurringJob::new(
            "monthly-charges",
            JobSchedule::DailyAt(charges_at),
            move || {
                let engine = engine.clone();
                async move {
                    let clock = engine.clock();
                    let today = clock.local_date(clock.now_utc());
                    let performer = Performer {
                        id: "scheduler".to_string(),
                        name: "Scheduler".to_string(),
                    };
                    engine.run_monthly_charge(Period::of(today), &performer).await
                }
            },
        );
        tasks.spawn(job.run(clock, shutdown_rx.clone()));
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");
    shutdown_tx.send(true).ok();

    // Job loops exit at their next suspension point; the server is aborted.
    tasks.shutdown().await;
    Ok(())
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match &config.path {
        None => String::from("sqlite::memory:"),
        Some(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
