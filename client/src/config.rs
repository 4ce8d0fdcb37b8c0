//! Client configuration loaded via OrthoConfig.
//!
//! Values come from CLI flags, `TEAM_SYNC_*` environment variables and
//! config files. [`ClientSettings::validate`] turns the raw strings into a
//! typed [`ClientConfig`].

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::outbound::supabase::SupabaseConfig;
use crate::telemetry::LogFormat;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Raw configuration values.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "TEAM_SYNC")]
pub struct ClientSettings {
    /// Project URL of the hosted backend.
    pub supabase_url: Option<String>,
    /// Publishable (anon) API key.
    pub anon_key: Option<String>,
    /// Per-request HTTP timeout in seconds.
    #[ortho_config(default = 30)]
    pub request_timeout_secs: u64,
    /// `text` or `json`.
    pub log_format: Option<String>,
}

/// Errors raised while validating [`ClientSettings`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required value was not supplied.
    #[error("missing required setting: {name}")]
    Missing {
        /// Setting name as used in flags and config files.
        name: &'static str,
    },
    /// The project URL did not parse.
    #[error("invalid supabase_url '{value}': {message}")]
    InvalidUrl {
        /// Raw value supplied.
        value: String,
        /// Parser message.
        message: String,
    },
    /// The project URL used a scheme other than http(s).
    #[error("supabase_url must use http or https, got '{scheme}'")]
    UnsupportedScheme {
        /// Scheme found in the URL.
        scheme: String,
    },
    /// Timeout of zero seconds.
    #[error("request_timeout_secs must be at least 1")]
    ZeroTimeout,
    /// Unknown log format name.
    #[error("unknown log_format '{value}' (expected text or json)")]
    UnknownLogFormat {
        /// Raw value supplied.
        value: String,
    },
}

/// Validated client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend connection settings.
    pub backend: SupabaseConfig,
    /// Log output format.
    pub log_format: LogFormat,
}

fn required(value: Option<&str>, name: &'static str) -> Result<String, ConfigError> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_owned)
        .ok_or(ConfigError::Missing { name })
}

impl ClientSettings {
    /// Check required values and convert them into a [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a value is missing or malformed.
    pub fn validate(&self) -> Result<ClientConfig, ConfigError> {
        let raw_url = required(self.supabase_url.as_deref(), "supabase_url")?;
        let url = Url::parse(&raw_url).map_err(|err| ConfigError::InvalidUrl {
            value: raw_url.clone(),
            message: err.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme {
                scheme: url.scheme().to_owned(),
            });
        }
        let anon_key = required(self.anon_key.as_deref(), "anon_key")?;
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        let log_format = match self.log_format.as_deref().map(str::trim) {
            None | Some("" | "text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::UnknownLogFormat {
                    value: other.to_owned(),
                });
            }
        };
        Ok(ClientConfig {
            backend: SupabaseConfig {
                url,
                anon_key,
                timeout: Duration::from_secs(self.request_timeout_secs),
            },
            log_format,
        })
    }
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            supabase_url: None,
            anon_key: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            log_format: None,
        }
    }
}
