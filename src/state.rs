use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::services::access_gate::AccessGate;
use crate::services::api::ApiClient;
use crate::services::credentials::{ClearLedger, CookiePolicy};
use crate::services::navigation::NavigationPaths;
use crate::services::sessions::SessionRegistry;

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Config,
    /// Client for the external REST API.
    pub api: Arc<ApiClient>,
    /// Subscription gate shared by every content kind.
    pub gate: AccessGate<ApiClient>,
    /// Timed sessions of mounted pages.
    pub sessions: SessionRegistry,
    /// Denial destinations.
    pub paths: NavigationPaths,
    /// Clears shared across requests for the same token.
    pub clear_ledger: ClearLedger,
}

impl AppState {
    /// Creates a new `AppState`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub fn new(config: &Config) -> Result<Self> {
        config
            .validate()
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let api = ApiClient::new(
            &config.api_base_url,
            Duration::from_secs(config.api_timeout_seconds),
        )
        .map_err(|e| AppError::Internal(e.to_string()))?;
        let api = Arc::new(api);
        tracing::info!("✅ API client initialized for {}", api.base_url());

        let gate = AccessGate::new(Arc::clone(&api));
        let sessions = SessionRegistry::new();
        tracing::info!("✅ Session registry initialized");

        Ok(AppState {
            config: config.clone(),
            gate,
            api,
            sessions,
            paths: NavigationPaths {
                signin: config.signin_path.clone(),
                pricing: config.pricing_path.clone(),
            },
            clear_ledger: ClearLedger::new(),
        })
    }

    /// Cookie attributes for credential cookies.
    pub fn cookie_policy(&self) -> CookiePolicy {
        CookiePolicy {
            max_age_days: self.config.cookie_max_age_days,
            secure: self.config.secure_cookies,
        }
    }
}
