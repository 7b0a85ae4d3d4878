pub mod tracing;

use std::time::Duration;

use figment::{
    providers::{Env, Format, Json},
    Figment,
};
use serde::Deserialize;

pub const SETTINGS_FILE: &str = "appsettings.json";

#[derive(Deserialize, Debug, Clone)]
pub struct AppCfg {
    /// Postgres URL. Without one the app runs on the in-memory store.
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_pool_size")]
    pub db_pool_size: usize,
    #[serde(default)]
    pub db_wait_timeout_secs: Option<u64>,
    #[serde(default = "default_templates")]
    pub templates: String,
    #[serde(default)]
    pub log_filter: Option<String>,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".into()
}

fn default_pool_size() -> usize {
    10
}

fn default_templates() -> String {
    "src/templates/**/*".into()
}

fn default_true() -> bool {
    true
}

impl AppCfg {
    pub fn figment() -> Figment {
        Figment::new()
            .merge(Json::file(SETTINGS_FILE))
            .merge(Env::prefixed("APP_"))
    }

    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn db_wait_timeout(&self) -> Option<Duration> {
        self.db_wait_timeout_secs.map(Duration::from_secs)
    }
}
