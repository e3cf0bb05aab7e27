//! Negotiation agents and the orchestration engine.
//!
//! This crate is the "brain" of the parley system:
//! - **Agent layer** (`llm`, `buyer`, `seller`) - buyer and seller
//!   participants behind a capability contract, backed by a pluggable LLM
//!   client with deterministic fallbacks
//! - **Offer policy** (`policy`, `rng`) - the stochastic pricing/logistics
//!   simulation sellers run each round, behind an injectable random source
//! - **Engine** (`engine`) - the bounded multi-round state machine that
//!   drives buyer and seller turns, streams progress events, and produces
//!   the final explained decision
//! - **Intake** (`intake`) - deterministic extraction of product, quantity,
//!   and budget from free-form chat
//!
//! # Safety principle
//!
//! The LLM only writes dialogue. Commercial terms - prices, delivery days,
//! carbon figures - come from the deterministic offer policy, and the final
//! ranking is pure arithmetic in `parley-core`. A failed or absent model
//! never changes an outcome, only the wording around it.

pub mod buyer;
pub mod engine;
pub mod intake;
pub mod llm;
pub mod policy;
pub mod rng;
pub mod seller;

pub use buyer::{BuyerAgent, BuyerConstraints};
pub use engine::{EngineConfig, EngineError, NegotiationEngine, Pacing};
pub use intake::{IntakeExtractor, ShoppingIntent};
pub use llm::{FailingClient, LlmClient, OpenRouterClient, StaticClient};
pub use policy::{OfferPolicy, ProviderVariant};
pub use rng::{EntropySource, RandomSource, SequenceSource};
pub use seller::SellerAgent;
