use std::sync::Arc;
use std::time::Duration;

use parley_agent::{EngineConfig, NegotiationEngine, OpenRouterClient};
use parley_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use parley_core::{
    builtin_roster, AgentRole, DirectRequest, ModelRef, NegotiationRequest, NegotiationUpdate,
    Priority, SellerId, UpdateSink,
};
use secrecy::ExposeSecret;

use super::CommandResult;

pub struct RunArgs {
    pub product: String,
    pub quantity: u32,
    pub budget: f64,
    pub priority: String,
    pub buyer_name: String,
    pub seller: Option<String>,
    pub no_pacing: bool,
}

/// Prints every engine update to stdout as it happens.
struct PrinterSink;

impl UpdateSink for PrinterSink {
    fn push(&self, update: NegotiationUpdate) {
        match update {
            NegotiationUpdate::Message { message } => {
                let speaker = match message.role {
                    AgentRole::Buyer => "Buyer".to_string(),
                    AgentRole::Seller => {
                        message.seller_name.unwrap_or_else(|| "Seller".to_string())
                    }
                };
                println!("[{speaker}] {}", message.content);
                if let Some(offer) = message.offer {
                    println!(
                        "    offer: ${} | {:.0}kg CO₂ | {} day{}",
                        offer.price,
                        offer.carbon_footprint,
                        offer.delivery_days,
                        if offer.delivery_days > 1 { "s" } else { "" }
                    );
                }
            }
            NegotiationUpdate::Metric { current_best, progress } => {
                println!(
                    "  -- leading: {} at ${} ({progress}%)",
                    current_best.seller_name, current_best.price
                );
            }
            NegotiationUpdate::Complete { result } => {
                println!();
                println!("=== Decision ===");
                println!(
                    "{} wins at ${} ({} rounds, {}s)",
                    result.winner.seller_name,
                    result.winner.price,
                    result.total_rounds,
                    result.duration
                );
                println!("{}", result.reasoning);
                if result.carbon_saved > 0.0 {
                    println!(
                        "Carbon saved: {:.0}kg CO₂ (≈ {} miles not driven)",
                        result.carbon_saved, result.carbon_saved_in_miles
                    );
                }
                for alternative in result.alternatives {
                    println!(
                        "Runner-up: {} at ${}",
                        alternative.seller_name, alternative.price
                    );
                }
                if let Some(verdict) = result.verdict {
                    println!("Outcome: {verdict:?} side of the deal");
                }
            }
        }
    }
}

pub fn run(args: RunArgs) -> CommandResult {
    let priority: Priority = match args.priority.parse() {
        Ok(priority) => priority,
        Err(error) => return CommandResult::failure("run", "invalid_priority", error.to_string(), 2),
    };

    let config = match AppConfig::load(LoadOptions {
        overrides: ConfigOverrides {
            pacing: args.no_pacing.then_some(false),
            ..ConfigOverrides::default()
        },
        ..LoadOptions::default()
    }) {
        Ok(config) => config,
        Err(error) => return CommandResult::failure("run", "configuration", error.to_string(), 2),
    };

    let llm = match OpenRouterClient::new(
        config.llm.base_url.clone(),
        config.llm.api_key.as_ref().map(|key| key.expose_secret().to_string()),
        ModelRef(config.llm.fallback_model.clone()),
        Duration::from_secs(config.llm.timeout_secs),
    ) {
        Ok(client) => Arc::new(client),
        Err(error) => return CommandResult::failure("run", "llm_init", error.to_string(), 2),
    };

    let request = NegotiationRequest {
        product: args.product,
        quantity: args.quantity,
        budget: args.budget,
        priority,
        buyer_name: args.buyer_name,
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => return CommandResult::failure("run", "runtime", error.to_string(), 2),
    };

    let outcome = runtime.block_on(async {
        match args.seller {
            Some(seller_id) => {
                let mut engine = NegotiationEngine::new(
                    EngineConfig::direct(&config),
                    llm,
                    builtin_roster(),
                );
                let direct = DirectRequest {
                    request,
                    seller_id: SellerId(seller_id),
                    buyer_model: None,
                };
                engine.run_direct(&direct, &PrinterSink).await.map(|()| None)
            }
            None => {
                let mut engine = NegotiationEngine::new(
                    EngineConfig::marketplace(&config),
                    llm,
                    builtin_roster(),
                );
                engine.run_marketplace(&request, &PrinterSink).await.map(Some)
            }
        }
    });

    match outcome {
        Ok(result) => {
            let message = match result {
                Some(result) => format!(
                    "negotiation completed: {} at ${}",
                    result.winner.seller_name, result.winner.price
                ),
                None => "negotiation completed".to_string(),
            };
            CommandResult::success("run", message)
        }
        Err(error) => CommandResult::failure("run", "negotiation", error.to_string(), 1),
    }
}

#[cfg(test)]
mod tests {
    use super::{run, RunArgs};

    fn args(priority: &str, seller: Option<&str>) -> RunArgs {
        RunArgs {
            product: "bamboo toothbrushes".to_string(),
            quantity: 5,
            budget: 150.0,
            priority: priority.to_string(),
            buyer_name: "Alex".to_string(),
            seller: seller.map(str::to_string),
            no_pacing: true,
        }
    }

    #[test]
    fn rejects_an_unknown_priority() {
        let result = run(args("fastest", None));
        assert_eq!(result.exit_code, 2);
        assert!(result.output.contains("invalid_priority"));
    }

    #[test]
    fn marketplace_run_completes_offline_on_fallbacks() {
        let result = run(args("price", None));
        assert_eq!(result.exit_code, 0, "output: {}", result.output);
        assert!(result.output.contains("negotiation completed"));
    }

    #[test]
    fn direct_run_reports_unknown_sellers() {
        let result = run(args("price", Some("seller_missing")));
        assert_eq!(result.exit_code, 1);
        assert!(result.output.contains("seller_missing"));
    }
}
