//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `VP_BASE_URL` - Backend origin (default: `http://127.0.0.1:8000`)
//! - `VP_SESSION_FILE` - Path of the local session store
//!   (default: `<data dir>/visit-panel/session.json`)
//! - `VP_POLL_INTERVAL_SECS` - Task list polling period (default: 10)
//! - `VP_STOP_REFRESH_DELAY_MS` - Delay before refreshing tasks after a stop
//!   request (default: 1500)
//! - `VP_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: none)
//! - `VP_LOG_FORMAT` - `text` or `json` (default: `text`)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
const DEFAULT_STOP_REFRESH_DELAY_MS: u64 = 1500;
const SESSION_DIR: &str = "visit-panel";
const SESSION_FILE: &str = "session.json";
const FALLBACK_SESSION_FILE: &str = ".vp_session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Visit Panel client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend origin; endpoint paths are joined onto it
    pub base_url: Url,
    /// Local session store file
    pub session_file: PathBuf,
    /// Period of the background task list refresh
    pub poll_interval: Duration,
    /// Delay between a stop request and the follow-up refresh
    pub stop_refresh_delay: Duration,
    /// Optional per-request timeout
    pub request_timeout: Option<Duration>,
    pub log_format: LogFormat,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let base_url = get("VP_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("VP_BASE_URL".to_string(), e.to_string()))?;

        let session_file = get("VP_SESSION_FILE").map_or_else(default_session_file, PathBuf::from);

        let poll_secs = parse_u64(get("VP_POLL_INTERVAL_SECS"), "VP_POLL_INTERVAL_SECS")?
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);
        if poll_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "VP_POLL_INTERVAL_SECS".to_string(),
                "must be greater than 0".to_string(),
            ));
        }

        let stop_delay_ms =
            parse_u64(get("VP_STOP_REFRESH_DELAY_MS"), "VP_STOP_REFRESH_DELAY_MS")?
                .unwrap_or(DEFAULT_STOP_REFRESH_DELAY_MS);

        let request_timeout =
            parse_u64(get("VP_REQUEST_TIMEOUT_SECS"), "VP_REQUEST_TIMEOUT_SECS")?
                .map(Duration::from_secs);

        let log_format = match get("VP_LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidEnvVar(
                    "VP_LOG_FORMAT".to_string(),
                    format!("expected 'text' or 'json', got '{other}'"),
                ));
            }
        };

        Ok(Self {
            base_url,
            session_file,
            poll_interval: Duration::from_secs(poll_secs),
            stop_refresh_delay: Duration::from_millis(stop_delay_ms),
            request_timeout,
            log_format,
        })
    }
}

fn parse_u64(value: Option<String>, key: &str) -> Result<Option<u64>, ConfigError> {
    value
        .map(|v| {
            v.trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
        .transpose()
}

/// Platform data directory, or the working directory when there is none.
fn default_session_file() -> PathBuf {
    dirs::data_local_dir().map_or_else(
        || PathBuf::from(FALLBACK_SESSION_FILE),
        |dir| dir.join(SESSION_DIR).join(SESSION_FILE),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.base_url.as_str(), "http://127.0.0.1:8000/");
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.stop_refresh_delay, Duration::from_millis(1500));
        assert!(config.request_timeout.is_none());
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(
            config.session_file.ends_with("session.json")
                || config.session_file.ends_with(".vp_session.json")
        );
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("VP_BASE_URL", "https://panel.example.com"),
            ("VP_SESSION_FILE", "/tmp/vp.json"),
            ("VP_POLL_INTERVAL_SECS", "30"),
            ("VP_STOP_REFRESH_DELAY_MS", "0"),
            ("VP_REQUEST_TIMEOUT_SECS", "15"),
            ("VP_LOG_FORMAT", "json"),
        ])
        .unwrap();

        assert_eq!(config.base_url.host_str(), Some("panel.example.com"));
        assert_eq!(config.session_file, PathBuf::from("/tmp/vp.json"));
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.stop_refresh_delay, Duration::ZERO);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = config_from(&[("VP_POLL_INTERVAL_SECS", "  ")]).unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_base_url() {
        let err = config_from(&[("VP_BASE_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "VP_BASE_URL"));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        assert!(config_from(&[("VP_POLL_INTERVAL_SECS", "0")]).is_err());
    }

    #[test]
    fn test_invalid_number() {
        let err = config_from(&[("VP_STOP_REFRESH_DELAY_MS", "soon")]).unwrap_err();
        assert!(err.to_string().contains("VP_STOP_REFRESH_DELAY_MS"));
    }

    #[test]
    fn test_invalid_log_format() {
        assert!(config_from(&[("VP_LOG_FORMAT", "yaml")]).is_err());
    }
}
