//! Handles settings for the application.
//!
//! Configuration is read from an optional `settings.toml` in the working
//! directory, then overridden by `WISHLIST__*` environment variables
//! (`WISHLIST__SERVER__PORT=8080` sets `server.port`).

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    /// Throwaway in-memory SQLite database.
    Memory,
    /// SQLite database file, created when missing.
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct App {
    /// Log level for the workspace crates (`error`, `warn`, `info`, `debug`, `trace`).
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Option<Server>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_config(
            Config::builder()
                .add_source(File::with_name("settings").required(false))
                .add_source(Environment::with_prefix("WISHLIST").separator("__")),
        )
    }

    fn from_config(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        builder
            .set_default("app.level", "info")?
            .build()?
            .try_deserialize()
    }
}
