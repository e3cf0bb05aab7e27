use serde::{Deserialize, Serialize};

use crate::domain::message::ModelRef;
use crate::domain::offer::SellerId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SustainabilityFocus {
    VeryHigh,
    High,
    Medium,
    Low,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTier {
    Premium,
    Mid,
    Budget,
}

/// How aggressively a seller concedes price per round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flexibility {
    VeryHigh,
    High,
    Medium,
    Low,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SellerPersonality {
    pub sustainability_focus: SustainabilityFocus,
    pub price_tier: PriceTier,
    pub flexibility: Flexibility,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SellerInventory {
    /// Base unit price before any round concessions.
    pub base_price: f64,
    /// Base per-unit footprint, kg CO2-equivalent.
    pub base_carbon: f64,
    pub base_delivery_days: u32,
    pub certifications: Vec<String>,
}

/// Static characterization of one seller. Supplied by the caller; the engine
/// treats `model` and `tactics` as opaque prompt material.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SellerProfile {
    pub id: SellerId,
    pub name: String,
    pub model: ModelRef,
    pub personality: SellerPersonality,
    pub inventory: SellerInventory,
    pub tactics: Vec<String>,
}

/// The default marketplace roster: a premium sustainability-led seller, a
/// fast mid-tier trader, and a budget undercutter.
pub fn builtin_roster() -> Vec<SellerProfile> {
    vec![
        SellerProfile {
            id: SellerId("seller_eco_premium".to_owned()),
            name: "EcoSupply".to_owned(),
            model: ModelRef("gpt-4o".to_owned()),
            personality: SellerPersonality {
                sustainability_focus: SustainabilityFocus::VeryHigh,
                price_tier: PriceTier::Premium,
                flexibility: Flexibility::Medium,
            },
            inventory: SellerInventory {
                base_price: 120.0,
                base_carbon: 12.0,
                base_delivery_days: 5,
                certifications: vec![
                    "B-Corp".to_owned(),
                    "Carbon-Neutral".to_owned(),
                    "Fair Trade".to_owned(),
                ],
            },
            tactics: vec![
                "Emphasize quality and certifications".to_owned(),
                "Provide detailed carbon breakdowns".to_owned(),
                "Willing to slightly reduce price for bulk orders".to_owned(),
            ],
        },
        SellerProfile {
            id: SellerId("seller_fast_trader".to_owned()),
            name: "QuickShip".to_owned(),
            model: ModelRef("gpt-4o-mini".to_owned()),
            personality: SellerPersonality {
                sustainability_focus: SustainabilityFocus::Medium,
                price_tier: PriceTier::Mid,
                flexibility: Flexibility::VeryHigh,
            },
            inventory: SellerInventory {
                base_price: 95.0,
                base_carbon: 18.0,
                base_delivery_days: 1,
                certifications: vec!["ISO-14001".to_owned()],
            },
            tactics: vec![
                "Lead with speed and convenience".to_owned(),
                "Aggressive price matching".to_owned(),
                "Offer tiered delivery options".to_owned(),
            ],
        },
        SellerProfile {
            id: SellerId("seller_budget".to_owned()),
            name: "ValueGreen".to_owned(),
            model: ModelRef("gpt-4o-mini".to_owned()),
            personality: SellerPersonality {
                sustainability_focus: SustainabilityFocus::Low,
                price_tier: PriceTier::Budget,
                flexibility: Flexibility::VeryHigh,
            },
            inventory: SellerInventory {
                base_price: 75.0,
                base_carbon: 22.0,
                base_delivery_days: 10,
                certifications: vec![],
            },
            tactics: vec![
                "Undercut all competitors on price".to_owned(),
                "Bulk discount offers".to_owned(),
                "Fast to respond and adapt".to_owned(),
            ],
        },
    ]
}
