//! Client configuration from the environment.

use std::path::PathBuf;
use std::time::Duration;

use wms_auth::FileSessionStorage;

use crate::error::{ClientError, ClientResult};

pub const API_URL_ENV: &str = "WMS_API_URL";
pub const TIMEOUT_ENV: &str = "WMS_TIMEOUT_SECS";
pub const USE_MOCK_ENV: &str = "WMS_USE_MOCK";
pub const SESSION_FILE_ENV: &str = "WMS_SESSION_FILE";

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every request path is appended to.
    pub api_url: String,
    pub timeout: Duration,
    /// Serve fixtures instead of calling the backend.
    pub use_mock: bool,
    /// Where the session is persisted.
    pub session_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            use_mock: false,
            session_file: FileSessionStorage::default_path(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> ClientResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> ClientResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            config.api_url = url.trim().trim_end_matches('/').to_string();
        }

        if let Some(raw) = lookup(TIMEOUT_ENV) {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ClientError::Config(format!("{TIMEOUT_ENV} must be a number of seconds, got '{raw}'")))?;
            config.timeout = Duration::from_secs(secs);
        }

        if let Some(raw) = lookup(USE_MOCK_ENV) {
            config.use_mock = parse_flag(&raw)
                .ok_or_else(|| ClientError::Config(format!("{USE_MOCK_ENV} must be a boolean, got '{raw}'")))?;
        }

        if let Some(path) = lookup(SESSION_FILE_ENV).filter(|v| !v.trim().is_empty()) {
            config.session_file = PathBuf::from(path);
        }

        Ok(config)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
