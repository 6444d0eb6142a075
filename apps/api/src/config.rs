use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::scanning::scrape::ScrapeOptions;
use crate::scanning::session::DEFAULT_USER_AGENT;

/// Backend configuration loaded from environment variables (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub max_upload_bytes: usize,
    pub navigation_timeout_secs: u64,
    pub field_wait_timeout_secs: u64,
    pub browser_user_agent: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: parse_env("PORT", 3004)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            navigation_timeout_secs: parse_env("NAVIGATION_TIMEOUT_SECS", 30)?,
            field_wait_timeout_secs: parse_env("FIELD_WAIT_TIMEOUT_SECS", 5)?,
            browser_user_agent: std::env::var("BROWSER_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
        })
    }

    pub fn scrape_options(&self) -> ScrapeOptions {
        ScrapeOptions {
            navigation_timeout: Duration::from_secs(self.navigation_timeout_secs),
            field_wait_timeout: Duration::from_secs(self.field_wait_timeout_secs),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 3004,
            rust_log: "info".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            navigation_timeout_secs: 30,
            field_wait_timeout_secs: 5,
            browser_user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Settings for the autofill agent (background + page components).
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub backend_url: String,
    pub request_timeout_secs: u64,
    pub observation_window_secs: u64,
    pub rust_log: String,
}

impl AgentConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(AgentConfig {
            backend_url: std::env::var("BACKEND_URL")
                .unwrap_or_else(|_| "http://localhost:3004".to_string()),
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", 30)?,
            observation_window_secs: parse_env("OBSERVATION_WINDOW_SECS", 15)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn observation_window(&self) -> Duration {
        Duration::from_secs(self.observation_window_secs)
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u64 = parse_env("FORMFILL_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("FORMFILL_TEST_BAD_PORT", "eighty");
        let result: Result<u16> = parse_env("FORMFILL_TEST_BAD_PORT", 80);
        assert!(result.is_err());
        std::env::remove_var("FORMFILL_TEST_BAD_PORT");
    }

    #[test]
    fn test_scrape_options_follow_config() {
        let config = Config {
            navigation_timeout_secs: 12,
            field_wait_timeout_secs: 2,
            ..Config::default()
        };
        let options = config.scrape_options();
        assert_eq!(options.navigation_timeout, Duration::from_secs(12));
        assert_eq!(options.field_wait_timeout, Duration::from_secs(2));
    }
}
