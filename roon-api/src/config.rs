//! Service configuration.
//!
//! Values are layered: built-in defaults, then an optional `roon.toml` in the
//! working directory, then `ROON__*` environment variables. Nested keys use a
//! double underscore, so `ROON__LOG__JSON=true` sets `log.json` and
//! `ROON__SEARCH__DEFAULT_PER_PAGE=25` sets `search.default_per_page`.
//!
//! A `.env` file, when present, is loaded into the environment first.

use config::{Config, ConfigError, Environment, File};
use roon_search::SearchConfig;
use serde::Deserialize;

const CONFIG_FILE: &str = "roon";
const ENV_PREFIX: &str = "ROON";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: String,
    /// Reported by `GET /heartbeat?system_version=true`.
    pub system_version: String,
    pub log: LogConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Emit one JSON object per line instead of the compact human format.
    pub json: bool,
    /// Default level for the service crates; `RUST_LOG` overrides it.
    pub level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://roon.db?mode=rwc".to_string(),
            bind_address: "0.0.0.0:8000".to_string(),
            system_version: env!("CARGO_PKG_VERSION").to_string(),
            log: LogConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            json: false,
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `roon.toml` and the environment.
    ///
    /// # Errors
    ///
    /// Returns the `config` crate's error when a source cannot be parsed or a
    /// value has the wrong type.
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env is normal outside development.
        let _ = dotenvy::dotenv();
        Self::from_builder(
            Config::builder()
                .add_source(File::with_name(CONFIG_FILE).required(false))
                .add_source(Self::environment()),
        )
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("search.search_filters")
            .try_parsing(true)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }
}
