//! Handles settings for the application.
//!
//! Values come from an optional `settings.toml` next to the binary, then from
//! `DISCOUNTS__`-prefixed environment variables, e.g.
//! `DISCOUNTS__SERVER__PORT=8080`.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    /// Tracing level applied to every workspace crate.
    #[serde(default = "App::default_level")]
    pub level: String,
}

impl App {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Default for Database {
    fn default() -> Self {
        Self::Sqlite("discounts.db".to_string())
    }
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    #[serde(default)]
    pub database: Database,
    /// At least 64 bytes; a random key is generated when absent.
    pub secret_key: Option<String>,
    pub maps_api_key: Option<String>,
    /// bcrypt work factor for new password hashes.
    pub password_cost: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Server,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("server.port", 5000)?
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("DISCOUNTS").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
