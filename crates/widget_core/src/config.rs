use std::{collections::HashMap, fs, path::Path, time::Duration};

use shared::protocol::DEFAULT_ANSWER_PATH;
use url::Url;

use crate::error::ConfigError;

pub const SETTINGS_FILE: &str = "widget.toml";
const DEFAULT_ANSWER_ORIGIN: &str = "http://127.0.0.1:8000";
const DEFAULT_GRACE_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, PartialEq)]
pub struct WidgetSettings {
    pub answer_endpoint: Url,
    /// Pause between a response arriving and the typing indicator being replaced.
    pub grace_delay: Duration,
    /// Client-side request timeout. `None` leaves only the transport defaults.
    pub request_timeout: Option<Duration>,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            answer_endpoint: Url::parse(&format!("{DEFAULT_ANSWER_ORIGIN}{DEFAULT_ANSWER_PATH}"))
                .expect("default answer endpoint is a valid url"),
            grace_delay: DEFAULT_GRACE_DELAY,
            request_timeout: None,
        }
    }
}

impl WidgetSettings {
    pub fn with_endpoint(endpoint: &str) -> Result<Self, ConfigError> {
        let answer_endpoint = parse_endpoint(endpoint)?;
        Ok(Self {
            answer_endpoint,
            ..Self::default()
        })
    }

    pub fn grace_delay(mut self, grace_delay: Duration) -> Self {
        self.grace_delay = grace_delay;
        self
    }
}

pub fn load_settings() -> WidgetSettings {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the settings file, then environment overrides.
/// Values that fail to parse leave the lower layer in place.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> WidgetSettings {
    let mut settings = WidgetSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("answer_endpoint").and_then(toml_string) {
                    apply_endpoint(&mut settings, &v);
                }
                if let Some(ms) = file_cfg.get("grace_delay_ms").and_then(toml_millis) {
                    settings.grace_delay = Duration::from_millis(ms);
                }
                if let Some(ms) = file_cfg.get("request_timeout_ms").and_then(toml_millis) {
                    settings.request_timeout = Some(Duration::from_millis(ms));
                }
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable settings file");
            }
        }
    }

    if let Some(v) = env("WIDGET_ANSWER_ENDPOINT") {
        apply_endpoint(&mut settings, &v);
    }
    if let Some(v) = env("APP__ANSWER_ENDPOINT") {
        apply_endpoint(&mut settings, &v);
    }

    if let Some(v) = env("APP__GRACE_DELAY_MS") {
        if let Ok(ms) = v.trim().parse::<u64>() {
            settings.grace_delay = Duration::from_millis(ms);
        }
    }
    if let Some(v) = env("APP__REQUEST_TIMEOUT_MS") {
        if let Ok(ms) = v.trim().parse::<u64>() {
            settings.request_timeout = Some(Duration::from_millis(ms));
        }
    }

    settings
}

fn apply_endpoint(settings: &mut WidgetSettings, raw: &str) {
    match parse_endpoint(raw) {
        Ok(url) => settings.answer_endpoint = url,
        Err(err) => tracing::warn!(error = %err, "keeping previous answer endpoint"),
    }
}

fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let raw = raw.trim();
    Url::parse(raw).map_err(|source| ConfigError::InvalidEndpoint {
        value: raw.to_string(),
        source,
    })
}

fn toml_string(value: &toml::Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn toml_millis(value: &toml::Value) -> Option<u64> {
    match value {
        toml::Value::Integer(ms) => u64::try_from(*ms).ok(),
        toml::Value::String(ms) => ms.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
