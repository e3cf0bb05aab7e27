//! Budget-ratio classification for single-counterparty runs: how did the
//! final price land relative to the buyer's budget, and who effectively won.

use serde::{Deserialize, Serialize};

use crate::domain::offer::Offer;
use crate::domain::outcome::Verdict;
use crate::domain::request::Priority;

/// Hand-tuned ratio boundaries carried over from the previous service.
/// Changing them changes observable negotiation outcomes, so they stay
/// configuration defaults rather than derived values.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerdictThresholds {
    /// At or below: the buyer extracted a large discount.
    pub buyer_edge: f64,
    /// At or below: moderate discount, still a fair outcome.
    pub fair_low: f64,
    /// At or below: landed near budget, fair outcome.
    pub fair_high: f64,
    /// At or below: moderately over budget, seller ahead. Above: seller won
    /// outright.
    pub seller_edge: f64,
}

impl Default for VerdictThresholds {
    fn default() -> Self {
        Self { buyer_edge: 0.85, fair_low: 0.95, fair_high: 1.05, seller_edge: 1.15 }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OutcomeAssessment {
    pub verdict: Verdict,
    /// Final price-per-unit over budget-per-unit.
    pub ratio: f64,
    pub reasoning: String,
}

pub fn classify_outcome(
    final_offer: &Offer,
    budget_per_unit: f64,
    quantity: u32,
    priority: Priority,
    thresholds: &VerdictThresholds,
) -> OutcomeAssessment {
    let price_per_unit = final_offer.price_per_unit(quantity);
    let ratio = price_per_unit / budget_per_unit;
    let seller = &final_offer.seller_name;
    let price = final_offer.price;
    let days = final_offer.delivery_days;
    let carbon = final_offer.carbon_footprint;
    let budget_total = (budget_per_unit * f64::from(quantity)).round() as i64;
    let pct_under = ((1.0 - ratio) * 100.0).round() as i64;
    let pct_over = ((ratio - 1.0) * 100.0).round() as i64;

    let (verdict, reasoning) = if ratio <= thresholds.buyer_edge {
        let saved = ((budget_per_unit - price_per_unit) * f64::from(quantity)).round() as i64;
        (
            Verdict::Buyer,
            format!(
                "Excellent negotiation! {seller} agreed to ${price} ({pct_under}% under your \
                 budget). You saved ${saved} with {days} days delivery and {carbon:.0}kg CO₂ \
                 footprint. {seller} made concessions to win your business."
            ),
        )
    } else if ratio <= thresholds.fair_low {
        (
            Verdict::Fair,
            format!(
                "Good negotiation! {seller} offered ${price} ({pct_under}% under budget). Fair \
                 deal with {days} days delivery and {carbon:.0}kg CO₂. Both parties made \
                 reasonable compromises."
            ),
        )
    } else if ratio <= thresholds.fair_high {
        (
            Verdict::Fair,
            format!(
                "{seller} held firm at ${price} (near your ${budget_total} budget). They \
                 maintained their pricing but delivered on {days} days and {carbon:.0}kg CO₂. \
                 Market-rate deal."
            ),
        )
    } else if ratio <= thresholds.seller_edge {
        let quality = if final_offer.certifications.is_empty() {
            "quality"
        } else {
            "certified quality"
        };
        (
            Verdict::Seller,
            format!(
                "{seller} stayed strong at ${price} ({pct_over}% over your ${budget_total} \
                 budget). They defended their premium pricing for {days}-day delivery and \
                 {carbon:.0}kg CO₂. Consider if the {quality} justifies the premium."
            ),
        )
    } else {
        let bet = match priority {
            Priority::Speed => format!("fast {days}-day delivery"),
            Priority::Carbon => format!("low {carbon:.0}kg carbon footprint"),
            Priority::Price => "quality and certifications".to_owned(),
        };
        (
            Verdict::Seller,
            format!(
                "{seller} held firm at ${price} ({pct_over}% over budget). They maintained \
                 premium pricing, betting on their {bet}. They won this negotiation by not \
                 backing down."
            ),
        )
    };

    OutcomeAssessment { verdict, ratio, reasoning }
}

#[cfg(test)]
mod tests {
    use crate::domain::offer::{Offer, SellerId};
    use crate::domain::outcome::Verdict;
    use crate::domain::request::Priority;

    use super::{classify_outcome, VerdictThresholds};

    fn offer(price: i64) -> Offer {
        Offer::new(SellerId("seller_eco_premium".to_owned()), "EcoSupply", price, 12.0, 5, vec![])
    }

    fn classify(price: i64) -> Verdict {
        classify_outcome(&offer(price), 100.0, 1, Priority::Price, &VerdictThresholds::default())
            .verdict
    }

    #[test]
    fn large_discount_is_a_buyer_win() {
        assert_eq!(classify(80), Verdict::Buyer);
    }

    #[test]
    fn near_budget_is_fair() {
        assert_eq!(classify(100), Verdict::Fair);
        assert_eq!(classify(90), Verdict::Fair);
    }

    #[test]
    fn significantly_over_budget_is_a_seller_win() {
        assert_eq!(classify(120), Verdict::Seller);
        assert_eq!(classify(110), Verdict::Seller);
    }

    #[test]
    fn boundary_ratios_stay_in_the_lower_tier() {
        assert_eq!(classify(85), Verdict::Buyer);
        assert_eq!(classify(105), Verdict::Fair);
        assert_eq!(classify(115), Verdict::Seller);
    }

    #[test]
    fn reasoning_cites_concrete_terms() {
        let assessment = classify_outcome(
            &offer(80),
            100.0,
            1,
            Priority::Price,
            &VerdictThresholds::default(),
        );

        assert!(assessment.reasoning.contains("$80"));
        assert!(assessment.reasoning.contains("20% under"));
        assert!(assessment.reasoning.contains("EcoSupply"));
    }

    #[test]
    fn speed_priority_shapes_the_blowout_rationale() {
        let assessment = classify_outcome(
            &offer(130),
            100.0,
            1,
            Priority::Speed,
            &VerdictThresholds::default(),
        );

        assert_eq!(assessment.verdict, Verdict::Seller);
        assert!(assessment.reasoning.contains("5-day delivery"));
    }
}
