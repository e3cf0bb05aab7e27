use serde::{Deserialize, Serialize};

use crate::domain::message::ModelRef;
use crate::domain::offer::SellerId;
use crate::errors::DomainError;

/// The single optimization objective a run is ranked against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Speed,
    Carbon,
    Price,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Speed => "speed",
            Self::Carbon => "carbon",
            Self::Price => "price",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "speed" => Ok(Self::Speed),
            "carbon" => Ok(Self::Carbon),
            "price" => Ok(Self::Price),
            other => Err(DomainError::InvariantViolation(format!(
                "unsupported priority `{other}` (expected speed|carbon|price)"
            ))),
        }
    }
}

/// Immutable per-run inputs for a marketplace negotiation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationRequest {
    pub product: String,
    pub quantity: u32,
    /// Per-unit budget cap. A cap, not a guarantee.
    pub budget: f64,
    pub priority: Priority,
    #[serde(default = "default_buyer_name")]
    pub buyer_name: String,
}

fn default_buyer_name() -> String {
    "Customer".to_owned()
}

impl NegotiationRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.product.trim().is_empty() {
            return Err(DomainError::InvariantViolation("product must not be empty".to_owned()));
        }
        if self.quantity == 0 {
            return Err(DomainError::InvariantViolation("quantity must be positive".to_owned()));
        }
        if self.budget <= 0.0 {
            return Err(DomainError::InvariantViolation("budget must be positive".to_owned()));
        }
        Ok(())
    }
}

/// Marketplace inputs narrowed to a single counterparty, plus the model used
/// for buyer turns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectRequest {
    #[serde(flatten)]
    pub request: NegotiationRequest,
    pub seller_id: SellerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer_model: Option<ModelRef>,
}
