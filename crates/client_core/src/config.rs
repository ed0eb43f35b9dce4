use std::{collections::HashMap, fs, path::Path, time::Duration};

use serde::Deserialize;

pub const CONFIG_FILE: &str = "client.toml";
pub const MAX_INITIAL_RANGE_DAYS: i64 = 366;
pub const LOAD_WAIT_MARGIN: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSettings {
    pub base_url: String,
    pub database_url: String,
    pub request_timeout_secs: u64,
    pub initial_range_days: i64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".into(),
            database_url: "sqlite://./data/settings.db".into(),
            request_timeout_secs: 30,
            initial_range_days: 2,
        }
    }
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// How long a caller should wait for one load to settle.
    pub fn load_wait_limit(&self) -> Duration {
        self.request_timeout().saturating_add(LOAD_WAIT_MARGIN)
    }
}

/// Defaults, then `client.toml` in the working directory, then environment.
pub fn load_settings() -> ClientSettings {
    load_settings_from(Path::new(CONFIG_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_from(
    config_path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(config_path) {
        match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            Ok(file_cfg) => apply_file_values(&mut settings, &file_cfg),
            Err(err) => tracing::warn!(
                path = %config_path.display(),
                error = %err,
                "ignoring unreadable client config"
            ),
        }
    }

    if let Some(v) = env("SCHEDULE_BASE_URL") {
        settings.base_url = v;
    }
    if let Some(v) = env("APP__BASE_URL") {
        settings.base_url = v;
    }

    if let Some(v) = env("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(parsed) = env("APP__REQUEST_TIMEOUT_SECS").and_then(|v| v.parse::<u64>().ok()) {
        settings.request_timeout_secs = parsed;
    }
    if let Some(parsed) = env("APP__INITIAL_RANGE_DAYS")
        .and_then(|v| v.parse::<i64>().ok())
        .and_then(checked_range_days)
    {
        settings.initial_range_days = parsed;
    }

    settings
}

fn apply_file_values(settings: &mut ClientSettings, file_cfg: &HashMap<String, toml::Value>) {
    if let Some(v) = file_cfg.get("base_url").and_then(toml::Value::as_str) {
        settings.base_url = v.to_string();
    }
    if let Some(v) = file_cfg.get("database_url").and_then(toml::Value::as_str) {
        settings.database_url = v.to_string();
    }
    if let Some(v) = file_cfg
        .get("request_timeout_secs")
        .and_then(toml::Value::as_integer)
        .and_then(|v| u64::try_from(v).ok())
    {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = file_cfg
        .get("initial_range_days")
        .and_then(toml::Value::as_integer)
        .and_then(checked_range_days)
    {
        settings.initial_range_days = v;
    }
}

fn checked_range_days(days: i64) -> Option<i64> {
    if (0..=MAX_INITIAL_RANGE_DAYS).contains(&days) {
        Some(days)
    } else {
        tracing::warn!(
            days,
            max = MAX_INITIAL_RANGE_DAYS,
            "ignoring out of range initial_range_days"
        );
        None
    }
}

/// Turns plain file paths into `sqlite://` urls. Empty input selects the
/// default settings database.
pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return ClientSettings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite:") || raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
