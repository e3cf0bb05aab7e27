use serde::{Deserialize, Serialize};

use crate::domain::offer::Offer;

/// Qualitative read of who came out ahead. Only meaningful for
/// single-counterparty runs; marketplace runs have no single adversary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Buyer,
    Seller,
    Fair,
}

/// Terminal artifact of a negotiation run. Created exactly once, at the end.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationResult {
    pub winner: Offer,
    pub reasoning: String,
    /// Aggregate kg CO2-equivalent saved versus the industry average, never
    /// negative. Zero in single-counterparty mode (no baseline).
    pub carbon_saved: f64,
    pub carbon_saved_in_miles: i64,
    pub alternatives: Vec<Offer>,
    pub total_rounds: u32,
    /// Wall-clock seconds the run took.
    pub duration: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<Verdict>,
}

#[cfg(test)]
mod tests {
    use crate::domain::offer::{Offer, SellerId};

    use super::{NegotiationResult, Verdict};

    #[test]
    fn marketplace_results_omit_the_verdict_on_the_wire() {
        let result = NegotiationResult {
            winner: Offer::new(SellerId("s".to_owned()), "S", 90, 12.0, 2, vec![]),
            reasoning: "Best price.".to_owned(),
            carbon_saved: 13.0,
            carbon_saved_in_miles: 33,
            alternatives: vec![],
            total_rounds: 6,
            duration: 12,
            verdict: None,
        };

        let json = serde_json::to_value(&result).expect("serialize");
        assert!(json.get("verdict").is_none());
        assert_eq!(json["carbonSavedInMiles"], 33);
    }

    #[test]
    fn verdict_uses_lowercase_labels() {
        assert_eq!(serde_json::to_value(Verdict::Buyer).expect("serialize"), "buyer");
        assert_eq!(serde_json::to_value(Verdict::Fair).expect("serialize"), "fair");
    }
}
