use std::time::Duration;

use serde::Deserialize;

use crate::args::{NetworkStack, parse_duration_value};
use crate::error::{AppError, AppResult, ConfigError};

/// On-disk configuration. Every field is optional; CLI values win.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    pub urls: Option<Vec<String>>,
    pub headers: Option<Vec<String>>,
    pub duration: Option<DurationValue>,
    pub timeout: Option<DurationValue>,
    pub interval: Option<DurationValue>,
    pub network: Option<NetworkStack>,
    pub skip_tls_verify: Option<bool>,
    pub follow_redirects: Option<bool>,
    pub http2: Option<bool>,
    pub debug: Option<bool>,
    pub export: Option<ExportConfig>,
    pub ipstack: Option<IpstackConfig>,
    pub failures: Option<FailureConfig>,
}

/// `[export]` table.
#[derive(Debug, Default, Deserialize)]
pub struct ExportConfig {
    /// Post results to the bulk endpoint.
    pub enabled: Option<bool>,
    pub to_file: Option<bool>,
    pub file_path: Option<String>,
    pub url: Option<String>,
    pub index: Option<String>,
    pub timeout: Option<DurationValue>,
}

/// `[ipstack]` table.
#[derive(Debug, Default, Deserialize)]
pub struct IpstackConfig {
    pub enabled: Option<bool>,
    pub api_key: Option<String>,
    pub timeout: Option<DurationValue>,
    pub url: Option<String>,
}

/// `[failures]` table.
#[derive(Debug, Default, Deserialize)]
pub struct FailureConfig {
    pub max_consecutive: Option<u32>,
    pub backoff: Option<DurationValue>,
}

/// Either a number of seconds or a string such as `"250ms"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self, field: &'static str) -> AppResult<Duration> {
        let parsed = match self {
            Self::Seconds(secs) => parse_duration_value(&secs.to_string()),
            Self::Text(text) => parse_duration_value(text),
        };
        parsed.map_err(|err| AppError::config(ConfigError::InvalidDuration { field, source: err }))
    }
}
