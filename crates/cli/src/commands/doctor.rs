use std::collections::HashSet;

use parley_core::builtin_roster;
use parley_core::config::{AppConfig, LoadOptions};
use serde::Serialize;

use super::CommandResult;

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: &'static str,
    detail: String,
}

pub fn run(json: bool) -> CommandResult {
    let mut checks = Vec::new();

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config",
                status: "ok",
                detail: "configuration loaded and validated".to_string(),
            });
            Some(config)
        }
        Err(error) => {
            checks.push(DoctorCheck { name: "config", status: "fail", detail: error.to_string() });
            None
        }
    };

    if let Some(config) = &config {
        if config.llm.api_key.is_some() {
            checks.push(DoctorCheck {
                name: "llm",
                status: "ok",
                detail: format!("api key set, completions via {}", config.llm.base_url),
            });
        } else {
            checks.push(DoctorCheck {
                name: "llm",
                status: "warn",
                detail: "no api key; agent dialogue will use deterministic fallbacks".to_string(),
            });
        }
    }

    let roster = builtin_roster();
    let unique_ids: HashSet<_> = roster.iter().map(|profile| profile.id.0.clone()).collect();
    if roster.is_empty() {
        checks.push(DoctorCheck {
            name: "roster",
            status: "fail",
            detail: "seller roster is empty".to_string(),
        });
    } else if unique_ids.len() != roster.len() {
        checks.push(DoctorCheck {
            name: "roster",
            status: "fail",
            detail: "seller roster contains duplicate ids".to_string(),
        });
    } else if roster.iter().any(|profile| profile.inventory.base_price <= 0.0) {
        checks.push(DoctorCheck {
            name: "roster",
            status: "fail",
            detail: "seller roster contains non-positive base prices".to_string(),
        });
    } else {
        checks.push(DoctorCheck {
            name: "roster",
            status: "ok",
            detail: format!("{} sellers with unique ids and positive terms", roster.len()),
        });
    }

    let failed = checks.iter().any(|check| check.status == "fail");

    let output = if json {
        serde_json::to_string_pretty(&checks).unwrap_or_else(|error| error.to_string())
    } else {
        checks
            .iter()
            .map(|check| format!("[{}] {}: {}", check.status, check.name, check.detail))
            .collect::<Vec<_>>()
            .join("\n")
    };

    CommandResult { exit_code: u8::from(failed), output }
}
