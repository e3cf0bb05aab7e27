use std::sync::Arc;

use parley_core::{Offer, Priority, PriceTier, SellerProfile, SustainabilityFocus};

use crate::llm::LlmClient;
use crate::policy::OfferPolicy;
use crate::rng::RandomSource;

/// One seller participant: commercial terms come from the local offer
/// policy, dialogue from the backing model with a profile-keyed fallback.
pub struct SellerAgent {
    llm: Arc<dyn LlmClient>,
    profile: SellerProfile,
    policy: OfferPolicy,
}

impl SellerAgent {
    pub fn new(llm: Arc<dyn LlmClient>, profile: SellerProfile, policy: OfferPolicy) -> Self {
        Self { llm, profile, policy }
    }

    pub fn profile(&self) -> &SellerProfile {
        &self.profile
    }

    /// Next-round commercial terms. Local arithmetic, never a model call.
    pub fn make_offer(
        &self,
        quantity: u32,
        buyer_message: &str,
        round: u32,
        priority: Priority,
        rng: &mut dyn RandomSource,
    ) -> Offer {
        self.policy.generate(&self.profile, quantity, buyer_message, round, priority, rng)
    }

    /// The natural-language message accompanying an offer.
    pub async fn reply(
        &self,
        product: &str,
        quantity: u32,
        buyer_message: &str,
        offer: &Offer,
        buyer_name: &str,
    ) -> String {
        let tactics = self.profile.tactics.join("; ");
        let prompt = format!(
            "You are {name}, a seller with these characteristics:\n\
             - Sustainability focus: {focus:?}\n\
             - Price point: {tier:?}\n\
             - Tactics: {tactics}\n\
             - Your current offer: ${price} total, {carbon:.0}kg CO₂, {days} days delivery\n\
             - Your certifications: {certifications}\n\n\
             Product: {quantity} {product}\n\n\
             Buyer ({buyer_name}) said: \"{buyer_message}\"\n\n\
             Respond as this seller in 1-2 sentences. Address the buyer by their name \
             \"{buyer_name}\". Be strategic, stay in character, and highlight your strengths.\n\
             Keep it under 50 words. Be persuasive but not pushy.",
            name = self.profile.name,
            focus = self.profile.personality.sustainability_focus,
            tier = self.profile.personality.price_tier,
            price = offer.price,
            carbon = offer.carbon_footprint,
            days = offer.delivery_days,
            certifications = if offer.certifications.is_empty() {
                "None".to_string()
            } else {
                offer.certifications.join(", ")
            },
        );

        match self.llm.complete(&self.profile.model, &prompt).await {
            Ok(content) => content,
            Err(error) => {
                tracing::debug!(
                    event_name = "seller.reply_fallback",
                    seller = %self.profile.id,
                    model = %self.profile.model,
                    error = %error,
                    "seller reply fell back to template"
                );
                self.reply_fallback(product, quantity, offer, buyer_name)
            }
        }
    }

    fn reply_fallback(
        &self,
        product: &str,
        quantity: u32,
        offer: &Offer,
        buyer_name: &str,
    ) -> String {
        if self.profile.personality.sustainability_focus == SustainabilityFocus::VeryHigh {
            format!(
                "Dear {buyer_name}, we offer premium sustainable {product} with {} \
                 certifications at ${}.",
                offer.certifications.join(" & "),
                offer.price
            )
        } else if self.profile.personality.price_tier == PriceTier::Budget {
            format!(
                "Dear {buyer_name}, best price in the market - ${} for {quantity} units. Ready \
                 to ship in {} days!",
                offer.price, offer.delivery_days
            )
        } else {
            format!(
                "Dear {buyer_name}, we can deliver {quantity} {product} in {} day{} for ${}.",
                offer.delivery_days,
                if offer.delivery_days > 1 { "s" } else { "" },
                offer.price
            )
        }
    }
}
