pub mod carbon;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ranking;
pub mod updates;
pub mod verdict;

pub use domain::message::{AgentMessage, AgentRole, ModelRef};
pub use domain::offer::{Offer, OfferId, SellerId};
pub use domain::outcome::{NegotiationResult, Verdict};
pub use domain::request::{DirectRequest, NegotiationRequest, Priority};
pub use domain::seller::{
    builtin_roster, Flexibility, PriceTier, SellerInventory, SellerPersonality, SellerProfile,
    SustainabilityFocus,
};
pub use errors::DomainError;
pub use ranking::{alternatives, best_offer, latest_offers};
pub use updates::{InMemoryUpdateSink, NegotiationUpdate, UpdateSink};
pub use verdict::{classify_outcome, OutcomeAssessment, VerdictThresholds};
