//! Scoped environment overrides for integration tests.

use std::env;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, OnceLock};

static ENV_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();

/// Every variable read by `Config::from_env`.
pub const CONFIG_KEYS: [&str; 17] = [
    "DATALAB_BIND_ADDR",
    "DATALAB_STORE_URL",
    "DATALAB_POLL_INTERVAL_MS",
    "DATALAB_VISIBILITY_TIMEOUT_SECS",
    "DATALAB_EXECUTOR_MAX_ATTEMPTS",
    "DATALAB_EXECUTOR_RETRY_DELAY_MS",
    "TARGET_DB_HOST",
    "TARGET_DB_PORT",
    "TARGET_DB_USER",
    "TARGET_DB_PASSWORD",
    "TARGET_DB_NAME",
    "TARGET_DB_ENCRYPT",
    "TARGET_DB_SCHEMA",
    "GEMINI_API_KEY",
    "GEMINI_MODEL",
    "GEMINI_BASE_URL",
    "GEMINI_TIMEOUT_SECS",
];

/// Guard holding the process environment in a known configuration.
///
/// Prior values are restored on drop. Guards serialise through a global
/// mutex, so only one exists at a time.
pub struct EnvVarGuard {
    previous: Vec<(OsString, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvVarGuard {
    /// Unsets every configuration variable, then sets `values`.
    pub fn configure(values: &[(&str, &str)]) -> Self {
        let lock = env_lock();
        let previous = CONFIG_KEYS
            .iter()
            .map(|key| (OsString::from(key), env::var_os(key)))
            .collect();

        for key in CONFIG_KEYS {
            unsafe {
                // SAFETY: the global mutex serializes environment mutations in tests.
                env::remove_var(key);
            }
        }
        for (key, value) in values {
            unsafe {
                // SAFETY: the global mutex serializes environment mutations in tests.
                env::set_var(key, value);
            }
        }

        Self {
            previous,
            _lock: lock,
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        for (key, value) in self.previous.drain(..) {
            unsafe {
                // SAFETY: the global mutex serializes environment mutations in tests.
                match value {
                    Some(previous) => env::set_var(&key, &previous),
                    None => env::remove_var(&key),
                }
            }
        }
    }
}

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_MUTEX
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
