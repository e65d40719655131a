//! Runtime configuration.

use std::time::Duration;

use tracing::warn;

use crate::search::DEFAULT_DEBOUNCE;

const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for the HTTP client and the search debouncer.
#[derive(Debug, Clone)]
pub struct Config {
    /// API root; the client appends `/tasks`, `/tasks/:id`, ...
    pub base_url: String,
    pub request_timeout: Duration,
    pub search_debounce: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: DEFAULT_TIMEOUT,
            search_debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl Config {
    /// Build from environment variables, falling back to defaults:
    /// `SITEBOARD_API_URL`, `SITEBOARD_TIMEOUT_SECS`, `SITEBOARD_DEBOUNCE_MS`.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_url =
            std::env::var("SITEBOARD_API_URL").unwrap_or_else(|_| defaults.base_url.clone());

        let request_timeout = parse_duration_var(
            "SITEBOARD_TIMEOUT_SECS",
            Duration::from_secs,
            defaults.request_timeout,
        );
        let search_debounce = parse_duration_var(
            "SITEBOARD_DEBOUNCE_MS",
            Duration::from_millis,
            defaults.search_debounce,
        );

        Self {
            base_url,
            request_timeout,
            search_debounce,
        }
    }
}

fn parse_duration_var(name: &str, make: fn(u64) -> Duration, default: Duration) -> Duration {
    match std::env::var(name) {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(value) => make(value),
            Err(_) => {
                warn!("Ignoring invalid {}: {:?}", name, raw);
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_backend_dev_setup() {
        let config = Config::default();
        assert_eq!(config.base_url, "http://localhost:5000/api");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.search_debounce, Duration::from_millis(300));
    }
}
