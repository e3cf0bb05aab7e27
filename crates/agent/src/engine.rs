//! The negotiation orchestrator: a bounded multi-round state machine that
//! interleaves buyer and seller turns, streams progress into an update sink,
//! and terminates with a final explained decision.
//!
//! One engine covers both shapes of run: the marketplace run ranks a roster
//! of sellers against each other, the direct run negotiates with a single
//! counterparty and classifies the outcome against the buyer's budget.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

use parley_core::config::{AppConfig, ConcessionRates};
use parley_core::{
    alternatives, best_offer, carbon, classify_outcome, latest_offers, AgentMessage,
    DirectRequest, DomainError, ModelRef, NegotiationRequest, NegotiationResult,
    NegotiationUpdate, Offer, SellerProfile, UpdateSink, VerdictThresholds,
};

use crate::buyer::{BuyerAgent, BuyerConstraints};
use crate::llm::LlmClient;
use crate::policy::{OfferPolicy, ProviderVariant};
use crate::rng::{EntropySource, RandomSource};
use crate::seller::SellerAgent;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Client-visible stream pacing. Cosmetic only: correctness never depends on
/// these delays and tests run with all of them at zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pacing {
    pub after_buyer: Duration,
    pub after_seller: Duration,
    pub after_metric: Duration,
}

impl Pacing {
    pub fn standard() -> Self {
        Self {
            after_buyer: Duration::from_millis(500),
            after_seller: Duration::from_millis(300),
            after_metric: Duration::from_millis(600),
        }
    }

    pub fn none() -> Self {
        Self {
            after_buyer: Duration::ZERO,
            after_seller: Duration::ZERO,
            after_metric: Duration::ZERO,
        }
    }
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub rounds: u32,
    pub price_floor: f64,
    pub concession: ConcessionRates,
    pub thresholds: VerdictThresholds,
    pub variant: ProviderVariant,
    pub pacing: Pacing,
    pub buyer_model: ModelRef,
    pub rationale_model: ModelRef,
}

impl EngineConfig {
    pub fn marketplace(config: &AppConfig) -> Self {
        Self {
            rounds: config.negotiation.marketplace_rounds,
            price_floor: config.negotiation.marketplace_price_floor,
            concession: config.negotiation.concession,
            thresholds: config.negotiation.thresholds,
            variant: ProviderVariant::default(),
            pacing: if config.negotiation.pacing { Pacing::standard() } else { Pacing::none() },
            buyer_model: ModelRef(config.llm.buyer_model.clone()),
            rationale_model: ModelRef(config.llm.rationale_model.clone()),
        }
    }

    pub fn direct(config: &AppConfig) -> Self {
        Self {
            rounds: config.negotiation.direct_rounds,
            price_floor: config.negotiation.direct_price_floor,
            ..Self::marketplace(config)
        }
    }
}

pub struct NegotiationEngine {
    config: EngineConfig,
    llm: Arc<dyn LlmClient>,
    roster: Vec<SellerProfile>,
    rng: Box<dyn RandomSource>,
}

impl NegotiationEngine {
    pub fn new(config: EngineConfig, llm: Arc<dyn LlmClient>, roster: Vec<SellerProfile>) -> Self {
        Self::with_random_source(config, llm, roster, Box::new(EntropySource))
    }

    pub fn with_random_source(
        config: EngineConfig,
        llm: Arc<dyn LlmClient>,
        roster: Vec<SellerProfile>,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        Self { config, llm, roster, rng }
    }

    /// Run a full marketplace negotiation against the whole roster. Streams
    /// every event into `sink` and resolves with the same result the final
    /// `complete` event carries.
    pub async fn run_marketplace(
        &mut self,
        request: &NegotiationRequest,
        sink: &dyn UpdateSink,
    ) -> Result<NegotiationResult, EngineError> {
        request.validate()?;
        let started = Instant::now();
        let rounds = self.config.rounds;

        tracing::info!(
            event_name = "negotiation.marketplace_started",
            product = %request.product,
            quantity = request.quantity,
            priority = %request.priority,
            sellers = self.roster.len(),
            rounds,
            "marketplace negotiation started"
        );

        let buyer = self.buyer_agent(request, None);
        let sellers = self.seller_agents();
        let mut all_offers: Vec<Offer> = Vec::new();

        for round in 1..=rounds {
            let buyer_message = if round == 1 {
                buyer.opening_request(&request.product, request.quantity, request.priority).await
            } else {
                buyer
                    .counter(
                        &request.product,
                        request.quantity,
                        request.priority,
                        &all_offers,
                        round,
                        rounds,
                    )
                    .await
            };
            sink.push(NegotiationUpdate::Message {
                message: AgentMessage::buyer(buyer_message.clone(), Some(buyer.model().clone())),
            });
            self.pause(self.config.pacing.after_buyer).await;

            for seller in &sellers {
                let offer = seller.make_offer(
                    request.quantity,
                    &buyer_message,
                    round,
                    request.priority,
                    self.rng.as_mut(),
                );
                let reply = seller
                    .reply(
                        &request.product,
                        request.quantity,
                        &buyer_message,
                        &offer,
                        &request.buyer_name,
                    )
                    .await;

                all_offers.push(offer.clone());
                sink.push(NegotiationUpdate::Message {
                    message: AgentMessage::seller(
                        reply,
                        offer.seller_id.clone(),
                        offer.seller_name.clone(),
                        Some(seller.profile().model.clone()),
                        Some(offer),
                    ),
                });
                self.pause(self.config.pacing.after_seller).await;
            }

            let latest = latest_offers(&all_offers);
            let current_best = best_offer(&latest, request.priority)?.clone();
            sink.push(NegotiationUpdate::Metric {
                current_best,
                progress: progress(round, rounds),
            });
            self.pause(self.config.pacing.after_metric).await;

            tracing::debug!(
                event_name = "negotiation.round_completed",
                round,
                offers = all_offers.len(),
                "negotiation round completed"
            );
        }

        let latest = latest_offers(&all_offers);
        let winner = best_offer(&latest, request.priority)?.clone();
        let runner_ups = alternatives(&latest, &winner, request.priority);

        let average = carbon::industry_average(&request.product);
        let saved_per_unit = carbon::carbon_savings(
            winner.carbon_footprint / f64::from(request.quantity),
            average,
        );
        let carbon_saved = saved_per_unit * f64::from(request.quantity);

        let reasoning = self.rationale(request, &winner, &runner_ups).await;

        let result = NegotiationResult {
            winner,
            reasoning,
            carbon_saved,
            carbon_saved_in_miles: carbon::carbon_to_miles(carbon_saved),
            alternatives: runner_ups,
            total_rounds: rounds,
            duration: started.elapsed().as_secs(),
            verdict: None,
        };

        tracing::info!(
            event_name = "negotiation.marketplace_completed",
            winner = %result.winner.seller_id,
            price = result.winner.price,
            carbon_saved = result.carbon_saved,
            "marketplace negotiation completed"
        );

        sink.push(NegotiationUpdate::Complete { result: result.clone() });
        Ok(result)
    }

    /// Run a negotiation against exactly one counterparty. Completion is
    /// signaled only through the `complete` event on the sink.
    pub async fn run_direct(
        &mut self,
        direct: &DirectRequest,
        sink: &dyn UpdateSink,
    ) -> Result<(), EngineError> {
        let request = &direct.request;
        request.validate()?;

        let profile = self
            .roster
            .iter()
            .find(|profile| profile.id == direct.seller_id)
            .cloned()
            .ok_or_else(|| DomainError::UnknownSeller(direct.seller_id.clone()))?;

        let started = Instant::now();
        let rounds = self.config.rounds;

        tracing::info!(
            event_name = "negotiation.direct_started",
            product = %request.product,
            seller = %profile.id,
            rounds,
            "direct negotiation started"
        );

        let buyer = self.buyer_agent(request, direct.buyer_model.clone());
        let seller = SellerAgent::new(self.llm.clone(), profile, self.offer_policy());

        let mut buyer_message =
            buyer.opening_request(&request.product, request.quantity, request.priority).await;
        sink.push(NegotiationUpdate::Message {
            message: AgentMessage::buyer(buyer_message.clone(), Some(buyer.model().clone())),
        });
        self.pause(self.config.pacing.after_buyer).await;

        let mut current_offer: Option<Offer> = None;

        for round in 1..=rounds {
            let offer = seller.make_offer(
                request.quantity,
                &buyer_message,
                round,
                request.priority,
                self.rng.as_mut(),
            );
            let reply = seller
                .reply(
                    &request.product,
                    request.quantity,
                    &buyer_message,
                    &offer,
                    &request.buyer_name,
                )
                .await;

            sink.push(NegotiationUpdate::Message {
                message: AgentMessage::seller(
                    reply,
                    offer.seller_id.clone(),
                    offer.seller_name.clone(),
                    Some(seller.profile().model.clone()),
                    Some(offer.clone()),
                ),
            });
            self.pause(self.config.pacing.after_seller).await;

            sink.push(NegotiationUpdate::Metric {
                current_best: offer.clone(),
                progress: progress(round, rounds),
            });
            self.pause(self.config.pacing.after_metric).await;

            current_offer = Some(offer.clone());

            if round < rounds {
                buyer_message = buyer
                    .counter(
                        &request.product,
                        request.quantity,
                        request.priority,
                        std::slice::from_ref(&offer),
                        round,
                        rounds,
                    )
                    .await;
                sink.push(NegotiationUpdate::Message {
                    message: AgentMessage::buyer(
                        buyer_message.clone(),
                        Some(buyer.model().clone()),
                    ),
                });
                self.pause(self.config.pacing.after_buyer).await;
            }
        }

        let final_offer = current_offer.ok_or_else(|| {
            DomainError::InvariantViolation("direct run produced no offer".to_owned())
        })?;

        let assessment = classify_outcome(
            &final_offer,
            request.budget,
            request.quantity,
            request.priority,
            &self.config.thresholds,
        );

        tracing::info!(
            event_name = "negotiation.direct_completed",
            seller = %final_offer.seller_id,
            price = final_offer.price,
            verdict = ?assessment.verdict,
            "direct negotiation completed"
        );

        // No cross-seller baseline in this mode: carbon savings are reported
        // as zero, not omitted.
        sink.push(NegotiationUpdate::Complete {
            result: NegotiationResult {
                winner: final_offer,
                reasoning: assessment.reasoning,
                carbon_saved: 0.0,
                carbon_saved_in_miles: 0,
                alternatives: Vec::new(),
                total_rounds: rounds,
                duration: started.elapsed().as_secs(),
                verdict: Some(assessment.verdict),
            },
        });
        Ok(())
    }

    fn buyer_agent(&self, request: &NegotiationRequest, model: Option<ModelRef>) -> BuyerAgent {
        BuyerAgent::new(
            self.llm.clone(),
            model.unwrap_or_else(|| self.config.buyer_model.clone()),
            request.buyer_name.clone(),
            BuyerConstraints::for_priority(request.priority, request.budget),
        )
    }

    fn seller_agents(&self) -> Vec<SellerAgent> {
        self.roster
            .iter()
            .map(|profile| {
                SellerAgent::new(self.llm.clone(), profile.clone(), self.offer_policy())
            })
            .collect()
    }

    fn offer_policy(&self) -> OfferPolicy {
        OfferPolicy::new(self.config.price_floor, self.config.concession, self.config.variant)
    }

    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }

    async fn rationale(
        &self,
        request: &NegotiationRequest,
        winner: &Offer,
        runner_ups: &[Offer],
    ) -> String {
        let alternatives_text = runner_ups
            .iter()
            .map(|offer| {
                format!(
                    "{}: ${}, {:.0}kg CO₂, {} days",
                    offer.seller_name, offer.price, offer.carbon_footprint, offer.delivery_days
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "You are explaining a purchasing decision to a user who prioritized \
             \"{priority}\".\n\n\
             Winning offer: {seller}\n\
             - Price: ${price}\n\
             - Carbon: {carbon:.0}kg CO₂\n\
             - Delivery: {days} days\n\
             - Certifications: {certifications}\n\n\
             Alternatives considered:\n{alternatives_text}\n\n\
             Explain in 2-3 sentences why {seller} won based on the \"{priority}\" priority.\n\
             Be specific about trade-offs. Keep it under 80 words.",
            priority = request.priority,
            seller = winner.seller_name,
            price = winner.price,
            carbon = winner.carbon_footprint,
            days = winner.delivery_days,
            certifications = if winner.certifications.is_empty() {
                "None".to_string()
            } else {
                winner.certifications.join(", ")
            },
        );

        match self.llm.complete(&self.config.rationale_model, &prompt).await {
            Ok(content) => content,
            Err(error) => {
                tracing::debug!(
                    event_name = "negotiation.rationale_fallback",
                    model = %self.config.rationale_model,
                    error = %error,
                    "final rationale fell back to template"
                );
                rationale_fallback(request.priority, winner)
            }
        }
    }
}

fn progress(round: u32, total_rounds: u32) -> u8 {
    (round * 100 / total_rounds) as u8
}

fn rationale_fallback(priority: parley_core::Priority, winner: &Offer) -> String {
    use parley_core::Priority;

    match priority {
        Priority::Speed => format!(
            "{} won with the fastest delivery time of {} day{}, meeting your urgent needs while \
             maintaining reasonable pricing.",
            winner.seller_name,
            winner.delivery_days,
            if winner.delivery_days > 1 { "s" } else { "" }
        ),
        Priority::Carbon => {
            if winner.certifications.is_empty() {
                format!(
                    "{} had the lowest carbon footprint at {:.0}kg CO₂, making it the most \
                     sustainable choice.",
                    winner.seller_name, winner.carbon_footprint
                )
            } else {
                format!(
                    "{} had the lowest carbon footprint at {:.0}kg CO₂ with verified {} \
                     certifications, making it the most sustainable choice.",
                    winner.seller_name,
                    winner.carbon_footprint,
                    winner.certifications.join(" and ")
                )
            }
        }
        Priority::Price => format!(
            "{} offered the best value at ${}, saving you money while meeting delivery \
             requirements and maintaining quality standards.",
            winner.seller_name, winner.price
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parley_core::config::AppConfig;
    use parley_core::{
        builtin_roster, DirectRequest, InMemoryUpdateSink, NegotiationRequest, NegotiationUpdate,
        Priority, SellerId, Verdict,
    };

    use crate::llm::FailingClient;
    use crate::rng::SequenceSource;

    use super::{EngineConfig, EngineError, NegotiationEngine, Pacing};

    fn test_config(kind: fn(&AppConfig) -> EngineConfig) -> EngineConfig {
        let mut config = kind(&AppConfig::default());
        config.pacing = Pacing::none();
        config
    }

    fn engine(config: EngineConfig) -> NegotiationEngine {
        NegotiationEngine::new(config, Arc::new(FailingClient), builtin_roster())
    }

    fn request(priority: Priority) -> NegotiationRequest {
        NegotiationRequest {
            product: "bamboo toothbrushes".to_owned(),
            quantity: 50,
            budget: 2.0,
            priority,
            buyer_name: "Alex".to_owned(),
        }
    }

    #[tokio::test]
    async fn marketplace_run_emits_the_exact_event_shape() {
        let sink = InMemoryUpdateSink::default();
        let result = engine(test_config(EngineConfig::marketplace))
            .run_marketplace(&request(Priority::Price), &sink)
            .await
            .expect("run completes on fallbacks alone");

        let updates = sink.updates();
        let messages =
            updates.iter().filter(|u| matches!(u, NegotiationUpdate::Message { .. })).count();
        let metrics =
            updates.iter().filter(|u| matches!(u, NegotiationUpdate::Metric { .. })).count();
        let completes =
            updates.iter().filter(|u| matches!(u, NegotiationUpdate::Complete { .. })).count();

        // 6 rounds x (1 buyer + 3 sellers) messages, one metric per round,
        // one terminal complete.
        assert_eq!(messages, 24);
        assert_eq!(metrics, 6);
        assert_eq!(completes, 1);
        assert!(matches!(updates.last(), Some(NegotiationUpdate::Complete { .. })));
        assert_eq!(result.total_rounds, 6);
    }

    #[tokio::test]
    async fn progress_is_monotone_and_ends_at_one_hundred() {
        let sink = InMemoryUpdateSink::default();
        engine(test_config(EngineConfig::marketplace))
            .run_marketplace(&request(Priority::Carbon), &sink)
            .await
            .expect("run completes");

        let progress: Vec<u8> = sink
            .updates()
            .iter()
            .filter_map(|update| match update {
                NegotiationUpdate::Metric { progress, .. } => Some(*progress),
                _ => None,
            })
            .collect();

        assert!(progress.windows(2).all(|pair| pair[0] <= pair[1]));
        assert_eq!(progress.last().copied(), Some(100));
    }

    #[tokio::test]
    async fn fallback_only_run_still_produces_a_full_transcript() {
        let sink = InMemoryUpdateSink::default();
        let result = engine(test_config(EngineConfig::marketplace))
            .run_marketplace(&request(Priority::Speed), &sink)
            .await
            .expect("run completes");

        for update in sink.updates() {
            if let NegotiationUpdate::Message { message } = update {
                assert!(!message.content.trim().is_empty());
            }
        }
        assert!(!result.reasoning.is_empty());
        assert!(result.alternatives.len() <= 2);
    }

    #[tokio::test]
    async fn every_offer_respects_the_price_floor() {
        let sink = InMemoryUpdateSink::default();
        engine(test_config(EngineConfig::marketplace))
            .run_marketplace(&request(Priority::Price), &sink)
            .await
            .expect("run completes");

        let roster = builtin_roster();
        for update in sink.updates() {
            let NegotiationUpdate::Message { message } = update else { continue };
            let Some(offer) = message.offer else { continue };
            let profile = roster
                .iter()
                .find(|profile| profile.id == offer.seller_id)
                .expect("offer maps to a roster seller");
            let minimum = profile.inventory.base_price * 0.80 * 50.0;
            assert!(offer.price as f64 >= minimum - 0.5);
        }
    }

    #[tokio::test]
    async fn urgent_speed_runs_never_quote_zero_delivery_days() {
        let sink = InMemoryUpdateSink::default();
        let mut request = request(Priority::Speed);
        request.product = "urgent fast sneakers".to_owned();

        engine(test_config(EngineConfig::marketplace))
            .run_marketplace(&request, &sink)
            .await
            .expect("run completes");

        for update in sink.updates() {
            if let NegotiationUpdate::Message { message } = update {
                if let Some(offer) = message.offer {
                    assert!(offer.delivery_days >= 1);
                }
            }
        }
    }

    #[tokio::test]
    async fn carbon_savings_are_never_negative() {
        let sink = InMemoryUpdateSink::default();
        let result = engine(test_config(EngineConfig::marketplace))
            .run_marketplace(&request(Priority::Carbon), &sink)
            .await
            .expect("run completes");

        assert!(result.carbon_saved >= 0.0);
        assert!(result.carbon_saved_in_miles >= 0);
    }

    #[tokio::test]
    async fn direct_run_streams_and_classifies() {
        let sink = InMemoryUpdateSink::default();
        let direct = DirectRequest {
            request: request(Priority::Price),
            seller_id: SellerId("seller_budget".to_owned()),
            buyer_model: None,
        };

        engine(test_config(EngineConfig::direct))
            .run_direct(&direct, &sink)
            .await
            .expect("direct run completes");

        let updates = sink.updates();
        let messages =
            updates.iter().filter(|u| matches!(u, NegotiationUpdate::Message { .. })).count();
        let metrics =
            updates.iter().filter(|u| matches!(u, NegotiationUpdate::Metric { .. })).count();

        // 1 opening + 4 seller messages + 3 buyer counters.
        assert_eq!(messages, 8);
        assert_eq!(metrics, 4);

        let Some(NegotiationUpdate::Complete { result }) = updates.last() else {
            panic!("direct run must end with a complete event");
        };
        assert!(result.verdict.is_some());
        assert!(result.alternatives.is_empty());
        assert_eq!(result.carbon_saved, 0.0);
        assert_eq!(result.carbon_saved_in_miles, 0);
    }

    #[tokio::test]
    async fn direct_run_with_generous_budget_is_a_buyer_win() {
        let sink = InMemoryUpdateSink::default();
        let mut base = request(Priority::Price);
        // ValueGreen's floor is 75 * 0.75; a per-unit budget of 200 puts any
        // possible final price far under the buyer-win threshold.
        base.budget = 200.0;
        let direct = DirectRequest {
            request: base,
            seller_id: SellerId("seller_budget".to_owned()),
            buyer_model: None,
        };

        engine(test_config(EngineConfig::direct))
            .run_direct(&direct, &sink)
            .await
            .expect("direct run completes");

        let Some(NegotiationUpdate::Complete { result }) = sink.updates().into_iter().last()
        else {
            panic!("missing complete event");
        };
        assert_eq!(result.verdict, Some(Verdict::Buyer));
    }

    #[tokio::test]
    async fn direct_run_rejects_unknown_sellers_before_any_event() {
        let sink = InMemoryUpdateSink::default();
        let direct = DirectRequest {
            request: request(Priority::Price),
            seller_id: SellerId("seller_missing".to_owned()),
            buyer_model: None,
        };

        let error = engine(test_config(EngineConfig::direct))
            .run_direct(&direct, &sink)
            .await
            .expect_err("unknown seller must abort");

        assert!(matches!(
            error,
            EngineError::Domain(parley_core::DomainError::UnknownSeller(_))
        ));
        assert!(sink.updates().is_empty());
    }

    #[tokio::test]
    async fn invalid_requests_abort_before_any_event() {
        let sink = InMemoryUpdateSink::default();
        let mut bad = request(Priority::Price);
        bad.quantity = 0;

        let result = engine(test_config(EngineConfig::marketplace))
            .run_marketplace(&bad, &sink)
            .await;

        assert!(result.is_err());
        assert!(sink.updates().is_empty());
    }

    #[tokio::test]
    async fn scripted_randomness_makes_runs_reproducible() {
        let run = |_: ()| async {
            let sink = InMemoryUpdateSink::default();
            let mut engine = NegotiationEngine::with_random_source(
                test_config(EngineConfig::marketplace),
                Arc::new(FailingClient),
                builtin_roster(),
                Box::new(SequenceSource::new(vec![0.7, 0.0, 0.9, 0.4, 0.1])),
            );
            engine.run_marketplace(&request(Priority::Price), &sink).await.expect("run");
            sink.updates()
                .into_iter()
                .filter_map(|update| match update {
                    NegotiationUpdate::Message { message } => message.offer.map(|o| o.price),
                    _ => None,
                })
                .collect::<Vec<_>>()
        };

        let first = run(()).await;
        let second = run(()).await;
        assert_eq!(first, second);
        assert_eq!(first.len(), 18);
    }
}
