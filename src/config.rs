//! Runtime configuration loaded from environment variables.

use crate::job::{
    adapters::{gemini::GeminiSettings, postgres::TargetDatabaseSettings},
    services::RetryPolicy,
};
use crate::worker::DEFAULT_POLL_INTERVAL;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 7071));
const DEFAULT_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(300);

/// Configuration loading failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or blank.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable could not be parsed.
    #[error("invalid value for {key}: {reason}")]
    Invalid {
        /// Variable name.
        key: &'static str,
        /// Parse failure description.
        reason: String,
    },
}

/// String value that never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wraps a secret value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the secret value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listen address.
    pub bind_addr: SocketAddr,
    /// `PostgreSQL` URL for session records and queues.
    pub store_url: Secret,
    /// Target database queried on behalf of users.
    pub target: TargetDatabaseSettings,
    /// Language model client settings.
    pub gemini: GeminiSettings,
    /// Idle wait between empty queue polls.
    pub poll_interval: Duration,
    /// Lease length for claimed queue entries.
    pub visibility_timeout: Duration,
    /// Retry schedule for transient target database failures.
    pub retry: RetryPolicy,
}

impl Config {
    /// Loads configuration from the process environment, reading `.env`
    /// first when present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or a value
    /// fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is the normal case outside development.
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or a value
    /// fails to parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Lookup(lookup);

        let mut target = TargetDatabaseSettings::new(
            vars.required("TARGET_DB_HOST")?,
            vars.required("TARGET_DB_USER")?,
            vars.required("TARGET_DB_PASSWORD")?,
            vars.required("TARGET_DB_NAME")?,
        );
        if let Some(port) = vars.parsed::<u16>("TARGET_DB_PORT")? {
            target.port = port;
        }
        if let Some(encrypt) = vars.flag("TARGET_DB_ENCRYPT")? {
            target.require_tls = encrypt;
        }
        if let Some(schema) = vars.optional("TARGET_DB_SCHEMA") {
            target.schema = schema;
        }

        let mut gemini = GeminiSettings::new(vars.required("GEMINI_API_KEY")?);
        if let Some(model) = vars.optional("GEMINI_MODEL") {
            gemini.model = model;
        }
        if let Some(base_url) = vars.optional("GEMINI_BASE_URL") {
            gemini.base_url = base_url;
        }
        if let Some(seconds) = vars.parsed::<u64>("GEMINI_TIMEOUT_SECS")? {
            gemini.timeout = Duration::from_secs(seconds);
        }

        let default_retry = RetryPolicy::default();
        let retry = RetryPolicy::new(
            vars.parsed("DATALAB_EXECUTOR_MAX_ATTEMPTS")?
                .unwrap_or(default_retry.max_attempts()),
            vars.parsed::<u64>("DATALAB_EXECUTOR_RETRY_DELAY_MS")?
                .map_or(default_retry.delay(), Duration::from_millis),
        );

        Ok(Self {
            bind_addr: vars
                .parsed("DATALAB_BIND_ADDR")?
                .unwrap_or(DEFAULT_BIND_ADDR),
            store_url: Secret::new(vars.required("DATALAB_STORE_URL")?),
            target,
            gemini,
            poll_interval: vars
                .parsed::<u64>("DATALAB_POLL_INTERVAL_MS")?
                .map_or(DEFAULT_POLL_INTERVAL, Duration::from_millis),
            visibility_timeout: vars
                .parsed::<u64>("DATALAB_VISIBILITY_TIMEOUT_SECS")?
                .map_or(DEFAULT_VISIBILITY_TIMEOUT, Duration::from_secs),
            retry,
        })
    }
}

struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.optional(key).ok_or(ConfigError::Missing(key))
    }

    fn parsed<T>(&self, key: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.optional(key)
            .map(|raw| {
                raw.parse::<T>().map_err(|err| ConfigError::Invalid {
                    key,
                    reason: err.to_string(),
                })
            })
            .transpose()
    }

    fn flag(&self, key: &'static str) -> Result<Option<bool>, ConfigError> {
        self.optional(key)
            .map(|raw| match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                _ => Err(ConfigError::Invalid {
                    key,
                    reason: format!("expected a boolean, got {raw:?}"),
                }),
            })
            .transpose()
    }
}
