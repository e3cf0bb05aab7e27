use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OfferId(pub String);

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SellerId(pub String);

impl std::fmt::Display for SellerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One seller's commercial terms for the requested quantity, frozen at the
/// moment a round produced them. Later offers from the same seller supersede
/// earlier ones but never mutate them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: OfferId,
    pub seller_id: SellerId,
    pub seller_name: String,
    /// Total price for the full requested quantity, in whole currency units.
    pub price: i64,
    /// Aggregate footprint for the order, kg CO2-equivalent.
    pub carbon_footprint: f64,
    pub delivery_days: u32,
    pub certifications: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_score: Option<f64>,
}

impl Offer {
    pub fn new(
        seller_id: SellerId,
        seller_name: impl Into<String>,
        price: i64,
        carbon_footprint: f64,
        delivery_days: u32,
        certifications: Vec<String>,
    ) -> Self {
        Self {
            id: OfferId(format!("offer_{}_{}", seller_id.0, Uuid::new_v4())),
            seller_id,
            seller_name: seller_name.into(),
            price,
            carbon_footprint,
            delivery_days,
            certifications,
            trust_score: None,
        }
    }

    pub fn price_per_unit(&self, quantity: u32) -> f64 {
        self.price as f64 / f64::from(quantity.max(1))
    }
}
