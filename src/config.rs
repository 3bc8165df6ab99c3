use std::env;
use std::net::SocketAddr;
use anyhow::{Context, Result};

const MAX_COOKIE_AGE_DAYS: i64 = 3650;
const MAX_SWEEP_SECONDS: u64 = 86_400;

/// The application's configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the external REST API (no trailing slash).
    pub api_base_url: String,
    /// The address the portal listens on.
    pub bind_addr: SocketAddr,
    /// Timeout applied to every call to the external API.
    pub api_timeout_seconds: u64,
    /// Where unauthenticated users are sent.
    pub signin_path: String,
    /// The paywall.
    pub pricing_path: String,
    /// Lifetime of the `jwt` and category cookies in days.
    pub cookie_max_age_days: i64,
    /// How often finished timed sessions are swept from the registry.
    pub session_sweep_seconds: u64,
    /// Marks cookies `Secure`.
    pub secure_cookies: bool,
}

impl Config {
    /// Builds a configuration with defaults for everything but the API URL.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            api_timeout_seconds: 15,
            signin_path: "/signin".to_string(),
            pricing_path: "/pricing".to_string(),
            cookie_max_age_days: 7,
            session_sweep_seconds: 60,
            secure_cookies: false,
        }
    }

    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let api_base_url = env::var("API_BASE_URL")
            .context("API_BASE_URL must be set (e.g. https://api.example.com/api)")?;

        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            anyhow::bail!("API_BASE_URL must be an http(s) URL");
        }

        let defaults = Self::new(api_base_url);

        let config = Self {
            bind_addr: env::var("BIND_ADDR")
                .unwrap_or_else(|_| defaults.bind_addr.to_string())
                .parse()
                .context("Invalid BIND_ADDR")?,
            api_timeout_seconds: env::var("API_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| defaults.api_timeout_seconds.to_string())
                .parse()
                .context("Invalid API_TIMEOUT_SECONDS")?,
            signin_path: env::var("SIGNIN_PATH").unwrap_or(defaults.signin_path),
            pricing_path: env::var("PRICING_PATH").unwrap_or(defaults.pricing_path),
            cookie_max_age_days: env::var("COOKIE_MAX_AGE_DAYS")
                .unwrap_or_else(|_| defaults.cookie_max_age_days.to_string())
                .parse()
                .context("Invalid COOKIE_MAX_AGE_DAYS")?,
            session_sweep_seconds: env::var("SESSION_SWEEP_SECONDS")
                .unwrap_or_else(|_| defaults.session_sweep_seconds.to_string())
                .parse()
                .context("Invalid SESSION_SWEEP_SECONDS")?,
            secure_cookies: env::var("APP_ENV")
                .unwrap_or_else(|_| "development".to_string())
                == "production",
            api_base_url: defaults.api_base_url,
        };

        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would overflow cookie or sweep durations.
    pub fn validate(&self) -> Result<()> {
        if !(1..=300).contains(&self.api_timeout_seconds) {
            anyhow::bail!("API_TIMEOUT_SECONDS must be between 1 and 300");
        }
        if !(1..=MAX_COOKIE_AGE_DAYS).contains(&self.cookie_max_age_days) {
            anyhow::bail!("COOKIE_MAX_AGE_DAYS must be between 1 and {}", MAX_COOKIE_AGE_DAYS);
        }
        if !(1..=MAX_SWEEP_SECONDS).contains(&self.session_sweep_seconds) {
            anyhow::bail!("SESSION_SWEEP_SECONDS must be between 1 and {}", MAX_SWEEP_SECONDS);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_strips_trailing_slash_and_sets_defaults() {
        let config = Config::new("https://api.example.com/api/");
        assert_eq!(config.api_base_url, "https://api.example.com/api");
        assert_eq!(config.signin_path, "/signin");
        assert_eq!(config.pricing_path, "/pricing");
        assert!(!config.secure_cookies);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn out_of_range_durations_are_rejected() {
        let mut config = Config::new("https://api.example.com/api");
        config.cookie_max_age_days = i64::MAX;
        assert!(config.validate().is_err());

        let mut config = Config::new("https://api.example.com/api");
        config.cookie_max_age_days = 0;
        assert!(config.validate().is_err());

        let mut config = Config::new("https://api.example.com/api");
        config.session_sweep_seconds = u64::MAX;
        assert!(config.validate().is_err());

        let mut config = Config::new("https://api.example.com/api");
        config.api_timeout_seconds = 0;
        assert!(config.validate().is_err());

        let mut config = Config::new("https://api.example.com/api");
        config.cookie_max_age_days = 3650;
        config.session_sweep_seconds = 86_400;
        assert!(config.validate().is_ok());
    }
}
