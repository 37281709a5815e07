//! Console configuration read from the environment (and `.env` via dotenv)

use std::path::PathBuf;

use crate::error::{AdminError, Result};

/// Local development backend the console talks to by default
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

/// TLS certificate pair for serving the console over HTTPS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    /// Path to certificate PEM file (cert + CA bundle)
    pub cert_path: PathBuf,
    /// Path to private key PEM file
    pub key_path: PathBuf,
}

/// Firebase project used for sign-in and the `adminlogs` collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub project_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Base URL of the TaraG REST backend
    pub api_base_url: String,
    /// Base URL for the alerts endpoints (may point at a separate service)
    pub alerts_base_url: String,
    /// Port the console listens on
    pub port: u16,
    pub tls: Option<TlsConfig>,
    /// Fallback session lifetime when the access token carries no expiry
    pub session_ttl_secs: u64,
    /// Number of log lines kept for the logs page
    pub log_buffer_size: usize,
    pub firebase: Option<FirebaseConfig>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            alerts_base_url: DEFAULT_API_BASE_URL.to_string(),
            port: 3000,
            tls: None,
            session_ttl_secs: 86400,
            log_buffer_size: 1000,
            firebase: None,
        }
    }
}

impl ConsoleConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let api_base_url = lookup("API_BASE_URL")
            .map(|url| normalize_base_url(&url))
            .unwrap_or(defaults.api_base_url);
        let alerts_base_url = lookup("ALERTS_API_BASE_URL")
            .map(|url| normalize_base_url(&url))
            .unwrap_or_else(|| api_base_url.clone());

        let tls = match (lookup("TLS_CERT_PATH"), lookup("TLS_KEY_PATH")) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert_path: PathBuf::from(cert),
                key_path: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => {
                return Err(AdminError::Config {
                    message: "TLS_CERT_PATH and TLS_KEY_PATH must be set together".to_string(),
                })
            }
        };

        let firebase = match (lookup("FIREBASE_API_KEY"), lookup("FIREBASE_PROJECT_ID")) {
            (Some(api_key), Some(project_id)) => Some(FirebaseConfig { api_key, project_id }),
            _ => None,
        };

        let config = Self {
            api_base_url,
            alerts_base_url,
            port: parse_or(&lookup, "CONSOLE_PORT", defaults.port)?,
            tls,
            session_ttl_secs: parse_or(&lookup, "SESSION_TTL_SECS", defaults.session_ttl_secs)?,
            log_buffer_size: parse_or(&lookup, "LOG_BUFFER_SIZE", defaults.log_buffer_size)?,
            firebase,
        };
        config.validate()?;
        Ok(config)
    }

    /// Override the backend URL; the alerts URL follows unless set separately
    pub fn with_api_base_url(mut self, url: &str) -> Self {
        let url = normalize_base_url(url);
        if self.alerts_base_url == self.api_base_url {
            self.alerts_base_url = url.clone();
        }
        self.api_base_url = url;
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("API_BASE_URL", &self.api_base_url),
            ("ALERTS_API_BASE_URL", &self.alerts_base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(AdminError::Config {
                    message: format!("{} must be an http(s) URL, got '{}'", name, url),
                });
            }
        }
        if self.log_buffer_size == 0 {
            return Err(AdminError::Config {
                message: "LOG_BUFFER_SIZE must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T> {
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| AdminError::Config {
            message: format!("{} has an invalid value: '{}'", key, raw),
        }),
        None => Ok(default),
    }
}
