use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::seller::Flexibility;
use crate::verdict::VerdictThresholds;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub negotiation: NegotiationConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    /// OpenAI-compatible chat completions endpoint base.
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub buyer_model: String,
    pub rationale_model: String,
    /// Single fallback model attempted once when the primary call fails.
    pub fallback_model: String,
    pub timeout_secs: u64,
}

/// Per-round price concession rate by seller flexibility tier. Hand-tuned
/// constants preserved from the previous service; treated as defaults, not
/// derived values.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConcessionRates {
    pub very_high: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for ConcessionRates {
    fn default() -> Self {
        Self { very_high: 0.08, high: 0.06, medium: 0.04, low: 0.02 }
    }
}

impl ConcessionRates {
    pub fn rate_for(&self, flexibility: Flexibility) -> f64 {
        match flexibility {
            Flexibility::VeryHigh => self.very_high,
            Flexibility::High => self.high,
            Flexibility::Medium => self.medium,
            Flexibility::Low => self.low,
        }
    }
}

#[derive(Clone, Debug)]
pub struct NegotiationConfig {
    pub marketplace_rounds: u32,
    pub direct_rounds: u32,
    /// Unit price never drops below this fraction of base price.
    pub marketplace_price_floor: f64,
    pub direct_price_floor: f64,
    /// Client-facing stream pacing. Purely cosmetic; disabled in tests.
    pub pacing: bool,
    pub concession: ConcessionRates,
    pub thresholds: VerdictThresholds,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            marketplace_rounds: 6,
            direct_rounds: 4,
            marketplace_price_floor: 0.80,
            direct_price_floor: 0.75,
            pacing: true,
            concession: ConcessionRates::default(),
            thresholds: VerdictThresholds::default(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub llm_base_url: Option<String>,
    pub llm_api_key: Option<String>,
    pub buyer_model: Option<String>,
    pub log_level: Option<String>,
    pub pacing: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            llm: LlmConfig {
                base_url: "https://openrouter.ai/api/v1".to_string(),
                api_key: None,
                buyer_model: "gpt-4o-mini".to_string(),
                rationale_model: "anthropic/claude-3-opus".to_string(),
                fallback_model: "anthropic/claude-3-haiku".to_string(),
                timeout_secs: 30,
            },
            negotiation: NegotiationConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    llm: Option<LlmPatch>,
    negotiation: Option<NegotiationPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    buyer_model: Option<String>,
    rationale_model: Option<String>,
    fallback_model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct NegotiationPatch {
    marketplace_rounds: Option<u32>,
    direct_rounds: Option<u32>,
    marketplace_price_floor: Option<f64>,
    direct_price_floor: Option<f64>,
    pacing: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("parley.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(api_key_value) = llm.api_key {
                self.llm.api_key = Some(api_key_value.into());
            }
            if let Some(buyer_model) = llm.buyer_model {
                self.llm.buyer_model = buyer_model;
            }
            if let Some(rationale_model) = llm.rationale_model {
                self.llm.rationale_model = rationale_model;
            }
            if let Some(fallback_model) = llm.fallback_model {
                self.llm.fallback_model = fallback_model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(negotiation) = patch.negotiation {
            if let Some(marketplace_rounds) = negotiation.marketplace_rounds {
                self.negotiation.marketplace_rounds = marketplace_rounds;
            }
            if let Some(direct_rounds) = negotiation.direct_rounds {
                self.negotiation.direct_rounds = direct_rounds;
            }
            if let Some(floor) = negotiation.marketplace_price_floor {
                self.negotiation.marketplace_price_floor = floor;
            }
            if let Some(floor) = negotiation.direct_price_floor {
                self.negotiation.direct_price_floor = floor;
            }
            if let Some(pacing) = negotiation.pacing {
                self.negotiation.pacing = pacing;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(bind_address) = env::var("PARLEY_SERVER_BIND_ADDRESS") {
            self.server.bind_address = bind_address;
        }
        if let Ok(port) = env::var("PARLEY_SERVER_PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                key: "PARLEY_SERVER_PORT".to_string(),
                value: port.clone(),
            })?;
        }
        if let Ok(base_url) = env::var("PARLEY_LLM_BASE_URL") {
            self.llm.base_url = base_url;
        }
        if let Ok(api_key_value) = env::var("PARLEY_LLM_API_KEY") {
            self.llm.api_key = Some(api_key_value.into());
        }
        if let Ok(buyer_model) = env::var("PARLEY_LLM_BUYER_MODEL") {
            self.llm.buyer_model = buyer_model;
        }
        if let Ok(level) = env::var("PARLEY_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = env::var("PARLEY_LOG_FORMAT") {
            self.logging.format =
                format.parse().map_err(|_| ConfigError::InvalidEnvOverride {
                    key: "PARLEY_LOG_FORMAT".to_string(),
                    value: format.clone(),
                })?;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(base_url) = overrides.llm_base_url {
            self.llm.base_url = base_url;
        }
        if let Some(api_key_value) = overrides.llm_api_key {
            self.llm.api_key = Some(api_key_value.into());
        }
        if let Some(buyer_model) = overrides.buyer_model {
            self.llm.buyer_model = buyer_model;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
        if let Some(pacing) = overrides.pacing {
            self.negotiation.pacing = pacing;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.negotiation.marketplace_rounds == 0 || self.negotiation.direct_rounds == 0 {
            return Err(ConfigError::Validation(
                "negotiation round counts must be at least 1".to_string(),
            ));
        }
        for floor in
            [self.negotiation.marketplace_price_floor, self.negotiation.direct_price_floor]
        {
            if !(0.0..=1.0).contains(&floor) || floor == 0.0 {
                return Err(ConfigError::Validation(format!(
                    "price floor `{floor}` must be within (0, 1]"
                )));
            }
        }
        let thresholds = &self.negotiation.thresholds;
        if !(thresholds.buyer_edge < thresholds.fair_low
            && thresholds.fair_low < thresholds.fair_high
            && thresholds.fair_high < thresholds.seller_edge)
        {
            return Err(ConfigError::Validation(
                "verdict thresholds must be strictly ascending".to_string(),
            ));
        }
        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::Validation("llm.timeout_secs must be positive".to_string()));
        }
        if self.llm.base_url.trim().is_empty() {
            return Err(ConfigError::Validation("llm.base_url must not be empty".to_string()));
        }
        Ok(())
    }
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }
    if let Ok(env_path) = env::var("PARLEY_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        return path.exists().then_some(path);
    }
    let default = PathBuf::from("parley.toml");
    default.exists().then_some(default)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::{AppConfig, ConfigOverrides, LoadOptions, LogFormat};

    #[test]
    fn defaults_pass_validation() {
        let config = AppConfig::load(LoadOptions::default()).expect("defaults load");
        assert_eq!(config.negotiation.marketplace_rounds, 6);
        assert_eq!(config.negotiation.direct_rounds, 4);
        assert_eq!(config.negotiation.concession.very_high, 0.08);
        assert_eq!(config.negotiation.thresholds.buyer_edge, 0.85);
    }

    #[test]
    fn toml_patch_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[server]\nport = 9090\n\n[negotiation]\nmarketplace_rounds = 3\npacing = false\n\n[logging]\nformat = \"json\""
        )
        .expect("write patch");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            ..LoadOptions::default()
        })
        .expect("patched load");

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.negotiation.marketplace_rounds, 3);
        assert!(!config.negotiation.pacing);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let result = AppConfig::load(LoadOptions {
            config_path: Some("definitely-not-here.toml".into()),
            require_file: true,
            ..LoadOptions::default()
        });
        assert!(result.is_err());
    }

    #[test]
    fn programmatic_overrides_win_over_defaults() {
        let config = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                port: Some(7000),
                buyer_model: Some("test-model".to_string()),
                pacing: Some(false),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("load with overrides");

        assert_eq!(config.server.port, 7000);
        assert_eq!(config.llm.buyer_model, "test-model");
        assert!(!config.negotiation.pacing);
    }

    #[test]
    fn zero_round_configuration_fails_validation() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "[negotiation]\nmarketplace_rounds = 0").expect("write patch");

        let result = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            ..LoadOptions::default()
        });
        let message = result.err().expect("validation error").to_string();
        assert!(message.contains("round counts"));
    }

    #[test]
    fn log_format_parse_rejects_unknown_values() {
        assert!("compact".parse::<LogFormat>().is_ok());
        assert!("yaml".parse::<LogFormat>().is_err());
    }
}
