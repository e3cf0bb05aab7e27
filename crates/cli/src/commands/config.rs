use parley_core::config::{AppConfig, LoadOptions};
use serde_json::json;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return json!({
                "command": "config",
                "status": "error",
                "message": error.to_string(),
            })
            .to_string();
        }
    };

    let payload = json!({
        "server": {
            "bind_address": config.server.bind_address,
            "port": config.server.port,
        },
        "llm": {
            "base_url": config.llm.base_url,
            "api_key": if config.llm.api_key.is_some() { "<redacted>" } else { "<unset>" },
            "buyer_model": config.llm.buyer_model,
            "rationale_model": config.llm.rationale_model,
            "fallback_model": config.llm.fallback_model,
            "timeout_secs": config.llm.timeout_secs,
        },
        "negotiation": {
            "marketplace_rounds": config.negotiation.marketplace_rounds,
            "direct_rounds": config.negotiation.direct_rounds,
            "marketplace_price_floor": config.negotiation.marketplace_price_floor,
            "direct_price_floor": config.negotiation.direct_price_floor,
            "pacing": config.negotiation.pacing,
            "concession": config.negotiation.concession,
            "thresholds": config.negotiation.thresholds,
        },
        "logging": {
            "level": config.logging.level,
            "format": config.logging.format,
        },
    });

    serde_json::to_string_pretty(&payload).unwrap_or_else(|error| error.to_string())
}
