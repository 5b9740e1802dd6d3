//! Handles settings for the application. Configuration is written in
//! `settings.toml`.

use chrono::NaiveTime;
use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Center {
    /// IANA timezone name the schedulers reason in.
    pub timezone: String,
}

#[derive(Debug, Deserialize)]
pub struct Database {
    /// Sqlite file path; in-memory when omitted.
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct Jobs {
    pub lessons_at: String,
    pub journals_at: String,
    pub charges_at: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub center: Center,
    pub database: Database,
    pub server: Option<Server>,
    pub jobs: Jobs,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings"))
            .build()?;

        settings.try_deserialize()
    }
}

pub fn parse_wall_time(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| format!("invalid wall-clock time: {raw}"))
}
