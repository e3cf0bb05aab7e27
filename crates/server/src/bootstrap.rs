use std::sync::Arc;
use std::time::Duration;

use parley_agent::{LlmClient, OpenRouterClient};
use parley_core::config::{AppConfig, ConfigError};
use parley_core::{builtin_roster, ModelRef, SellerProfile};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::info;

/// Shared handles every route needs: immutable config, the LLM client, and
/// the seller roster.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub llm: Arc<dyn LlmClient>,
    pub roster: Arc<Vec<SellerProfile>>,
}

pub struct Application {
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("llm client initialization failed: {0}")]
    LlmInit(String),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        llm_configured = config.llm.api_key.is_some(),
        "starting application bootstrap"
    );

    let llm = OpenRouterClient::new(
        config.llm.base_url.clone(),
        config.llm.api_key.as_ref().map(|key| key.expose_secret().to_string()),
        ModelRef(config.llm.fallback_model.clone()),
        Duration::from_secs(config.llm.timeout_secs),
    )
    .map_err(|error| BootstrapError::LlmInit(error.to_string()))?;

    let roster = builtin_roster();
    info!(
        event_name = "system.bootstrap.roster_loaded",
        sellers = roster.len(),
        "seller roster loaded"
    );

    Ok(Application {
        state: AppState {
            config: Arc::new(config),
            llm: Arc::new(llm),
            roster: Arc::new(roster),
        },
    })
}
