use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::offer::{Offer, SellerId};

/// Opaque label naming the backing model for an agent turn. The engine never
/// inspects the value; it only routes it to the generator that was injected
/// for it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelRef(pub String);

impl std::fmt::Display for ModelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    Buyer,
    Seller,
}

/// One turn of dialogue in a negotiation transcript. Append-only: produced
/// once, never edited, ordered by creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMessage {
    pub id: String,
    pub role: AgentRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_id: Option<SellerId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer: Option<Offer>,
}

impl AgentMessage {
    pub fn buyer(content: impl Into<String>, model: Option<ModelRef>) -> Self {
        Self {
            id: format!("msg_{}", Uuid::new_v4()),
            role: AgentRole::Buyer,
            content: content.into(),
            timestamp: Utc::now(),
            seller_id: None,
            seller_name: None,
            model,
            offer: None,
        }
    }

    pub fn seller(
        content: impl Into<String>,
        seller_id: SellerId,
        seller_name: impl Into<String>,
        model: Option<ModelRef>,
        offer: Option<Offer>,
    ) -> Self {
        Self {
            id: format!("msg_{}", Uuid::new_v4()),
            role: AgentRole::Seller,
            content: content.into(),
            timestamp: Utc::now(),
            seller_id: Some(seller_id),
            seller_name: Some(seller_name.into()),
            model,
            offer,
        }
    }
}
