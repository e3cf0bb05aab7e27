use std::sync::Arc;

use parley_core::{best_offer, ModelRef, Offer, Priority};

use crate::llm::LlmClient;

/// Hard limits the buyer agent negotiates within, derived from the chosen
/// priority. Speed buyers will pay over budget; price buyers will not.
#[derive(Clone, Debug, PartialEq)]
pub struct BuyerConstraints {
    pub max_price: f64,
    pub max_carbon: Option<f64>,
    pub max_days: u32,
    pub style: &'static str,
}

impl BuyerConstraints {
    pub fn for_priority(priority: Priority, budget: f64) -> Self {
        match priority {
            Priority::Speed => Self {
                max_price: budget * 1.3,
                max_carbon: None,
                max_days: 2,
                style: "urgent",
            },
            Priority::Carbon => Self {
                max_price: budget * 1.1,
                max_carbon: Some(15.0),
                max_days: 14,
                style: "analytical",
            },
            Priority::Price => {
                Self { max_price: budget, max_carbon: None, max_days: 7, style: "aggressive" }
            }
        }
    }
}

/// The buyer side of a negotiation. Text comes from the backing model when
/// it cooperates and from deterministic priority-keyed templates when it
/// does not; either way these methods never fail.
pub struct BuyerAgent {
    llm: Arc<dyn LlmClient>,
    model: ModelRef,
    name: String,
    constraints: BuyerConstraints,
}

impl BuyerAgent {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        model: ModelRef,
        name: impl Into<String>,
        constraints: BuyerConstraints,
    ) -> Self {
        Self { llm, model, name: name.into(), constraints }
    }

    pub fn model(&self) -> &ModelRef {
        &self.model
    }

    pub async fn opening_request(&self, product: &str, quantity: u32, priority: Priority) -> String {
        let priority_description = match priority {
            Priority::Speed => "fastest possible delivery",
            Priority::Carbon => "lowest environmental impact with verified sustainability",
            Priority::Price => "best price while maintaining quality",
        };
        let carbon_line = self
            .constraints
            .max_carbon
            .map(|max| format!("Target carbon: Under {max:.0}kg CO₂\n"))
            .unwrap_or_default();

        let prompt = format!(
            "You are a professional buyer agent representing {name}.\n\n\
             Product needed: {quantity} {product}\n\
             Primary priority: {priority_description}\n\
             Budget: ${max_price:.0}\n\
             {carbon_line}\
             Max delivery time: {max_days} days\n\n\
             Write a clear, professional opening request to sellers (2-3 sentences).\n\
             Start with \"Dear Seller,\" and sign off with \"Best regards, {name}\".\n\
             Emphasize your priority ({priority}) and be specific about requirements.\n\
             Keep it under 60 words total.",
            name = self.name,
            max_price = self.constraints.max_price,
            max_days = self.constraints.max_days,
        );

        match self.llm.complete(&self.model, &prompt).await {
            Ok(content) => content,
            Err(error) => {
                tracing::debug!(
                    event_name = "buyer.opening_fallback",
                    model = %self.model,
                    error = %error,
                    "buyer opening request fell back to template"
                );
                self.opening_fallback(product, quantity, priority)
            }
        }
    }

    pub async fn counter(
        &self,
        product: &str,
        quantity: u32,
        priority: Priority,
        offers: &[Offer],
        round: u32,
        total_rounds: u32,
    ) -> String {
        let offers_text = offers
            .iter()
            .map(|offer| {
                format!(
                    "{}: ${}, {:.0}kg CO₂, {} days, [{}]",
                    offer.seller_name,
                    offer.price,
                    offer.carbon_footprint,
                    offer.delivery_days,
                    if offer.certifications.is_empty() {
                        "No certs".to_string()
                    } else {
                        offer.certifications.join(", ")
                    }
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let best = best_offer(offers, priority).ok();
        let best_line = best
            .map(|offer| format!("Current best offer (by your priority): {}", offer.seller_name))
            .unwrap_or_default();

        let prompt = format!(
            "You are a strategic buyer agent representing {name}. Round {round}/{total_rounds} \
             of negotiation.\n\n\
             Your priority: {priority}\n\
             Your negotiation style: {style}\n\
             Product: {quantity} {product}\n\n\
             Current offers:\n{offers_text}\n\n\
             {best_line}\n\n\
             Task: Respond strategically to push for better terms on your PRIMARY goal \
             ({priority}).\n\
             - Reference specific sellers and their offers\n\
             - Be persuasive but professional\n\
             - Keep under 50 words\n\n\
             Your response:",
            name = self.name,
            style = self.constraints.style,
        );

        match self.llm.complete(&self.model, &prompt).await {
            Ok(content) => content,
            Err(error) => {
                tracing::debug!(
                    event_name = "buyer.counter_fallback",
                    model = %self.model,
                    round,
                    error = %error,
                    "buyer counter fell back to template"
                );
                self.counter_fallback(priority, best)
            }
        }
    }

    fn opening_fallback(&self, product: &str, quantity: u32, priority: Priority) -> String {
        match priority {
            Priority::Speed => format!(
                "Dear Seller, I am seeking {quantity} {product} with fastest possible delivery \
                 (ideally 1-2 days). Budget is flexible for speed. Please confirm availability \
                 and delivery within 7 days. Best regards, {}",
                self.name
            ),
            Priority::Carbon => format!(
                "Dear Seller, Seeking {quantity} {product} with lowest carbon footprint. Must \
                 have verified sustainability certifications. Willing to wait for eco-friendly \
                 options. Best regards, {}",
                self.name
            ),
            Priority::Price => format!(
                "Dear Seller, I need {quantity} {product} at best possible price. Must deliver \
                 within {} days. Best regards, {}",
                self.constraints.max_days, self.name
            ),
        }
    }

    fn counter_fallback(&self, priority: Priority, best: Option<&Offer>) -> String {
        let Some(best) = best else {
            return "We are reviewing the market. Please send your best terms.".to_string();
        };

        if priority == Priority::Speed && best.delivery_days > 1 {
            format!(
                "@{} - Can you deliver faster than {} days? We need this urgently.",
                best.seller_name, best.delivery_days
            )
        } else if priority == Priority::Carbon {
            format!(
                "@{} - Your carbon footprint looks good. Can you provide detailed breakdown \
                 and certifications?",
                best.seller_name
            )
        } else {
            format!(
                "@{} - Competitive price, but can you go lower? We're comparing multiple \
                 suppliers.",
                best.seller_name
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parley_core::{ModelRef, Offer, Priority, SellerId};

    use crate::llm::{FailingClient, StaticClient};

    use super::{BuyerAgent, BuyerConstraints};

    fn agent(priority: Priority, llm: Arc<dyn crate::llm::LlmClient>) -> BuyerAgent {
        BuyerAgent::new(
            llm,
            ModelRef("gpt-4o-mini".to_owned()),
            "Alex",
            BuyerConstraints::for_priority(priority, 100.0),
        )
    }

    fn offer(seller: &str, price: i64, days: u32, carbon: f64) -> Offer {
        Offer::new(SellerId(seller.to_owned()), seller.to_uppercase(), price, carbon, days, vec![])
    }

    #[test]
    fn constraints_scale_with_priority() {
        let speed = BuyerConstraints::for_priority(Priority::Speed, 100.0);
        assert_eq!(speed.max_price, 130.0);
        assert_eq!(speed.max_days, 2);

        let carbon = BuyerConstraints::for_priority(Priority::Carbon, 100.0);
        assert_eq!(carbon.max_carbon, Some(15.0));

        let price = BuyerConstraints::for_priority(Priority::Price, 100.0);
        assert_eq!(price.max_price, 100.0);
        assert_eq!(price.max_days, 7);
    }

    #[tokio::test]
    async fn opening_request_uses_the_model_reply_when_available() {
        let agent = agent(Priority::Price, Arc::new(StaticClient::new("Dear Seller, quote me.")));
        let text = agent.opening_request("toothbrushes", 50, Priority::Price).await;
        assert_eq!(text, "Dear Seller, quote me.");
    }

    #[tokio::test]
    async fn opening_request_falls_back_per_priority_when_the_model_fails() {
        let agent = agent(Priority::Carbon, Arc::new(FailingClient));
        let text = agent.opening_request("toothbrushes", 50, Priority::Carbon).await;
        assert!(text.contains("lowest carbon footprint"));
        assert!(text.ends_with("Best regards, Alex"));
    }

    #[tokio::test]
    async fn counter_fallback_targets_the_best_offer_for_the_priority() {
        let agent = agent(Priority::Speed, Arc::new(FailingClient));
        let offers = vec![offer("quick", 95, 2, 18.0), offer("slow", 70, 10, 22.0)];

        let text = agent.counter("toothbrushes", 50, Priority::Speed, &offers, 2, 6).await;
        assert!(text.contains("@QUICK"));
        assert!(text.contains("faster than 2 days"));
    }

    #[tokio::test]
    async fn counter_tolerates_a_singleton_offer_set() {
        let agent = agent(Priority::Price, Arc::new(FailingClient));
        let offers = vec![offer("solo", 80, 3, 10.0)];

        let text = agent.counter("shoes", 2, Priority::Price, &offers, 1, 4).await;
        assert!(text.contains("@SOLO"));
    }

    #[tokio::test]
    async fn counter_survives_an_empty_offer_set() {
        let agent = agent(Priority::Price, Arc::new(FailingClient));
        let text = agent.counter("shoes", 2, Priority::Price, &[], 1, 4).await;
        assert!(text.contains("best terms"));
    }
}
