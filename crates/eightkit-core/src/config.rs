//! Configuration: API credentials, client tuning and environment loading
//!
//! Environment files are plain `KEY=VALUE` lines. Call `load_environment()`
//! early, before reading credentials from the environment:
//!
//! ```no_run
//! use eightkit_core::config::{load_environment, Credentials};
//!
//! load_environment();
//! let credentials = Credentials::from_env().expect("EIGHTKIT_HOST_URL not set");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Environment variable holding the API host URL
pub const HOST_URL_VAR: &str = "EIGHTKIT_HOST_URL";
/// Environment variable holding the API key
pub const API_KEY_VAR: &str = "EIGHTKIT_API_KEY";

/// Environment variable naming an explicit environment file
pub const ENV_FILE_VAR: &str = "EIGHTKIT_ENV_FILE";

/// Fallback environment files, in order of priority
pub const ENV_FILE_PATHS: &[&str] = &["/etc/eightkit/environment", ".env"];

/// Credentials of one 8kit application
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub host_url: String,
    #[serde(default)]
    pub api_key: String,
}

impl Credentials {
    pub fn new(host_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            host_url: host_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Read `EIGHTKIT_HOST_URL` / `EIGHTKIT_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let host_url = env_var(HOST_URL_VAR)
            .ok_or_else(|| Error::configuration(format!("{} is not set", HOST_URL_VAR)))?;
        let api_key = env_var(API_KEY_VAR).unwrap_or_default();
        Ok(Self::new(host_url, api_key))
    }

    /// Host URL without surrounding whitespace or trailing slashes.
    pub fn base_url(&self) -> Result<String> {
        let trimmed = self.host_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(Error::configuration(
                "Host URL is not configured in credentials",
            ));
        }
        Ok(trimmed.to_string())
    }

    /// API key safe to print: first four characters only.
    pub fn masked_key(&self) -> String {
        mask_secret(&self.api_key)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host_url", &self.host_url)
            .field("api_key", &self.masked_key())
            .finish()
    }
}

/// Mask a secret for logging
pub fn mask_secret(value: &str) -> String {
    if value.chars().count() > 4 {
        let prefix: String = value.chars().take(4).collect();
        format!("{}...", prefix)
    } else {
        "****".to_string()
    }
}

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Tuning of the resilient HTTP client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Per-attempt timeout in milliseconds; 0 selects the default
    pub timeout_ms: u64,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Fixed delay between attempts in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_retries: 3,
            retry_delay_ms: 1000,
        }
    }
}

impl ClientConfig {
    /// Defaults overridden by `EIGHTKIT_TIMEOUT_MS`, `EIGHTKIT_MAX_RETRIES`
    /// and `EIGHTKIT_RETRY_DELAY_MS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            timeout_ms: env_parse::<u64>("EIGHTKIT_TIMEOUT_MS")
                .filter(|ms| *ms > 0)
                .unwrap_or(defaults.timeout_ms),
            max_retries: env_parse("EIGHTKIT_MAX_RETRIES").unwrap_or(defaults.max_retries),
            retry_delay_ms: env_parse("EIGHTKIT_RETRY_DELAY_MS").unwrap_or(defaults.retry_delay_ms),
        }
    }

    /// A timeout of 0 keeps the default of 30 s.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = if timeout_ms == 0 {
            DEFAULT_TIMEOUT_MS
        } else {
            timeout_ms
        };
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay_ms(mut self, retry_delay_ms: u64) -> Self {
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    pub fn timeout(&self) -> Duration {
        match self.timeout_ms {
            0 => Duration::from_millis(DEFAULT_TIMEOUT_MS),
            ms => Duration::from_millis(ms),
        }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Names of the environment files [`load_environment`] considers, in
/// order: `$EIGHTKIT_ENV_FILE`, then [`ENV_FILE_PATHS`].
fn env_file_candidates() -> Vec<PathBuf> {
    env_var(ENV_FILE_VAR)
        .map(PathBuf::from)
        .into_iter()
        .chain(ENV_FILE_PATHS.iter().map(PathBuf::from))
        .collect()
}

/// Export the entries of the first readable environment file.
///
/// Variables already present in the process environment win over the
/// file. Returns the path that was applied.
pub fn load_environment() -> Option<PathBuf> {
    let Some((path, content)) = env_file_candidates()
        .into_iter()
        .find_map(|path| fs::read_to_string(&path).ok().map(|content| (path, content)))
    else {
        debug!("No environment file found");
        return None;
    };

    let entries = parse_env_file(&content);
    let mut applied = 0;
    for (key, value) in &entries {
        if std::env::var_os(key).is_none() {
            std::env::set_var(key, value);
            applied += 1;
        }
    }

    info!(
        path = %path.display(),
        applied,
        already_set = entries.len() - applied,
        "Environment file applied"
    );
    Some(path)
}

/// `KEY=VALUE` entries of an environment file.
///
/// Blank lines and `#` comments are ignored, an `export ` prefix is
/// allowed and values may be wrapped in single or double quotes.
fn parse_env_file(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            (!key.is_empty()).then(|| (key.to_string(), unquote(value.trim()).to_string()))
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|q| value.strip_prefix(*q)?.strip_suffix(*q))
        .unwrap_or(value)
}

/// Non-empty environment variable
pub fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Environment variable parsed as `T`; unset or malformed values are `None`.
pub fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env_var(key).and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout_ms, 30000);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay_ms, 1000);
        assert_eq!(config.retry_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_zero_timeout_means_default() {
        let config = ClientConfig::default().with_timeout_ms(0);
        assert_eq!(config.timeout_ms, 30000);

        let raw = ClientConfig {
            timeout_ms: 0,
            ..ClientConfig::default()
        };
        assert_eq!(raw.timeout(), Duration::from_secs(30));
        assert_eq!(ClientConfig::default().with_timeout_ms(250).timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_base_url_trims_trailing_slashes() {
        let creds = Credentials::new("  https://api.example.com//  ", "st_key");
        assert_eq!(creds.base_url().unwrap(), "https://api.example.com");
    }

    #[test]
    fn test_base_url_required() {
        let err = Credentials::new(" / ", "").base_url().unwrap_err();
        assert!(err.to_string().contains("Host URL is not configured"));
    }

    #[test]
    fn test_debug_masks_key() {
        let creds = Credentials::new("http://localhost:3000", "st_abcdef123456");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("st_a..."));
        assert!(!printed.contains("abcdef123456"));
        assert_eq!(mask_secret("abc"), "****");
    }

    #[test]
    fn test_parse_env_file() {
        let content = "# 8kit\n\nEIGHTKIT_HOST_URL=\"http://h\"\nexport KEY='v'\n=value\nnovalue\nEMPTY=\n";
        assert_eq!(
            parse_env_file(content),
            vec![
                ("EIGHTKIT_HOST_URL".to_string(), "http://h".to_string()),
                ("KEY".to_string(), "v".to_string()),
                ("EMPTY".to_string(), String::new()),
            ]
        );
        assert_eq!(unquote("\"a"), "\"a");
    }
}
