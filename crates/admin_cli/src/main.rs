use std::error::Error;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use engine::{
    CenterClock, Engine, Money, PayrollContract, PayrollInputs, Performer, Period, PersonKind,
};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection, EntityTrait, Set};
use uuid::Uuid;

mod staff {
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

#[derive(Parser, Debug)]
#[command(name = "lavagna_admin")]
#[command(about = "Admin utilities for Lavagna (bootstrap data, trigger jobs)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./lavagna.db?mode=rwc"
    )]
    database_url: String,

    /// Center timezone used when deriving "today" for job runs.
    #[arg(long, env = "CENTER_TZ", default_value = "Asia/Tashkent")]
    timezone: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a staff login for the HTTP API.
    StaffCreate(StaffCreateArgs),
    /// Create an academic group.
    GroupCreate(GroupCreateArgs),
    /// Mark a group as started.
    GroupStart(GroupStartArgs),
    /// Create a student, optionally with a wallet account.
    StudentCreate(StudentCreateArgs),
    /// Enroll a student into a group.
    Enroll(EnrollArgs),
    /// Top up a student account.
    TopUp(TopUpArgs),
    /// Register a payroll contract.
    ContractCreate(ContractCreateArgs),
    /// Run a recurring job once, outside its timer loop.
    Run(RunArgs),
    /// Calculate one person's payroll for a month.
    PayrollCalculate(PayrollCalculateArgs),
}

#[derive(Args, Debug)]
struct StaffCreateArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    display_name: String,
    #[arg(long, env = "STAFF_PASSWORD")]
    password: String,
}

#[derive(Args, Debug)]
struct GroupCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    mentor: String,
    #[arg(long)]
    start_date: NaiveDate,
    #[arg(long)]
    weeks: u32,
    #[arg(long, default_value_t = 1)]
    lessons_per_day: u32,
    #[arg(long, default_value = "09:00")]
    starts: String,
    #[arg(long, default_value = "10:30")]
    ends: String,
    /// Monthly fee, e.g. "500000" or "500000.00".
    #[arg(long)]
    fee: Money,
    #[arg(long)]
    start: bool,
}

#[derive(Args, Debug)]
struct GroupStartArgs {
    #[arg(long)]
    id: Uuid,
}

#[derive(Args, Debug)]
struct StudentCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    account_code: Option<String>,
}

#[derive(Args, Debug)]
struct EnrollArgs {
    #[arg(long)]
    student: Uuid,
    #[arg(long)]
    group: Uuid,
    #[arg(long, default_value = "0")]
    discount: Money,
}

#[derive(Args, Debug)]
struct TopUpArgs {
    #[arg(long)]
    code: String,
    #[arg(long)]
    amount: Money,
    #[arg(long)]
    note: Option<String>,
}

#[derive(Args, Debug)]
struct ContractCreateArgs {
    #[arg(long)]
    person: String,
    #[arg(long, value_parser = parse_person_kind)]
    kind: PersonKind,
    #[arg(long)]
    center: String,
    #[arg(long, default_value = "0")]
    fixed: Money,
    #[arg(long, default_value = "0")]
    hourly_rate: Money,
    #[arg(long, default_value_t = 0)]
    percentage_bp: i64,
    #[arg(long)]
    from: NaiveDate,
    #[arg(long)]
    to: Option<NaiveDate>,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// One of: lessons, journals, charges.
    job: String,
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long)]
    month: Option<u32>,
    #[arg(long)]
    year: Option<i32>,
}

#[derive(Args, Debug)]
struct PayrollCalculateArgs {
    #[arg(long)]
    person: String,
    #[arg(long, value_parser = parse_person_kind)]
    kind: PersonKind,
    #[arg(long)]
    center: String,
    #[arg(long)]
    month: u32,
    #[arg(long)]
    year: i32,
    #[arg(long, default_value = "0")]
    bonus: Money,
    #[arg(long, default_value = "0")]
    fine: Money,
}

fn parse_person_kind(raw: &str) -> Result<PersonKind, String> {
    PersonKind::try_from(raw).map_err(|err| err.to_string())
}

fn parse_wall_time(raw: &str) -> Result<chrono::NaiveTime, String> {
    chrono::NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| chrono::NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| format!("invalid time: {raw}"))
}

fn cli_performer() -> Performer {
    Performer {
        id: "admin-cli".to_string(),
        name: "Admin CLI".to_string(),
    }
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let clock = CenterClock::from_name(&cli.timezone)?;
    let engine = Engine::builder()
        .database(db.clone())
        .clock(clock)
        .build()
        .await?;

    match cli.command {
        Command::StaffCreate(args) => {
            if staff::Entity::find_by_id(args.username.clone())
                .one(&db)
                .await?
                .is_some()
            {
                eprintln!("staff member already exists: {}", args.username);
                std::process::exit(1);
            }
            let member = staff::ActiveModel {
                username: Set(args.username.clone()),
                password: Set(args.password),
                display_name: Set(args.display_name),
                active: Set(true),
            };
            staff::Entity::insert(member).exec(&db).await?;
            println!("created staff member: {}", args.username);
        }
        Command::GroupCreate(args) => {
            let group = engine::Group::new(
                args.name.clone(),
                args.mentor,
                args.start_date,
                args.weeks,
                args.lessons_per_day,
                parse_wall_time(&args.starts)?,
                parse_wall_time(&args.ends)?,
                args.fee.minor(),
            )?;
            let group = engine.create_group(group).await?;
            if args.start {
                engine.start_group(group.id).await?;
            }
            println!("created group: {} ({})", args.name, group.id);
        }
        Command::GroupStart(args) => {
            engine.start_group(args.id).await?;
            println!("started group: {}", args.id);
        }
        Command::StudentCreate(args) => {
            let student = engine.create_student(&args.name, args.phone).await?;
            if let Some(code) = args.account_code {
                let account = engine.open_account(student.id, &code).await?;
                println!("created student: {} ({}), account {}", args.name, student.id, account.code);
            } else {
                println!("created student: {} ({})", args.name, student.id);
            }
        }
        Command::Enroll(args) => {
            let today = clock.local_date(clock.now_utc());
            let enrollment = engine
                .enroll_student(args.student, args.group, args.discount.minor(), today)
                .await?;
            println!("enrolled: {}", enrollment.id);
        }
        Command::TopUp(args) => {
            let log = engine
                .top_up(&args.code, args.amount.minor(), args.note, &cli_performer())
                .await?;
            let account = engine.account_balance(&args.code).await?;
            println!(
                "top-up {} recorded, balance is now {}",
                Money::new(log.amount_minor),
                Money::new(account.balance_minor)
            );
        }
        Command::ContractCreate(args) => {
            let contract = PayrollContract::new(
                args.person,
                args.kind,
                args.center,
                args.fixed.minor(),
                args.hourly_rate.minor(),
                args.percentage_bp,
                args.from,
                args.to,
            )?;
            let contract = engine.create_contract(contract).await?;
            println!("created contract: {}", contract.id);
        }
        Command::Run(args) => {
            let today = args.date.unwrap_or_else(|| clock.local_date(clock.now_utc()));
            let outcome = match args.job.as_str() {
                "lessons" => engine.run_daily_progression(today).await?,
                "journals" => engine.roll_forward_journals(today).await?,
                "charges" => {
                    let period = match (args.month, args.year) {
                        (Some(month), Some(year)) => Period::new(month, year)?,
                        _ => Period::of(today),
                    };
                    engine.run_monthly_charge(period, &cli_performer()).await?
                }
                other => {
                    eprintln!("unknown job: {other} (expected lessons, journals or charges)");
                    std::process::exit(2);
                }
            };
            println!(
                "done: {} succeeded, {} skipped, {} failed",
                outcome.succeeded,
                outcome.skipped,
                outcome.failures.len()
            );
            for failure in outcome.failures {
                eprintln!("  {}: {}", failure.id, failure.reason);
            }
        }
        Command::PayrollCalculate(args) => {
            let period = Period::new(args.month, args.year)?;
            let record = engine
                .calculate_payroll(
                    &args.person,
                    args.kind,
                    &args.center,
                    period,
                    PayrollInputs {
                        bonus_minor: args.bonus.minor(),
                        fine_minor: args.fine.minor(),
                    },
                )
                .await?;
            println!(
                "record {}: gross {}, net {} ({})",
                record.id,
                Money::new(record.gross_minor),
                Money::new(record.net_minor),
                record.status.as_str()
            );
        }
    }

    Ok(())
}
