use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::domain::message::AgentMessage;
use crate::domain::offer::Offer;
use crate::domain::outcome::NegotiationResult;

/// One event pushed to the client while a run is in flight. A successful run
/// ends its stream with exactly one `Complete`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum NegotiationUpdate {
    Message {
        message: AgentMessage,
    },
    #[serde(rename_all = "camelCase")]
    Metric {
        current_best: Offer,
        /// Percentage in [0, 100], monotonically non-decreasing per run.
        progress: u8,
    },
    Complete {
        result: NegotiationResult,
    },
}

/// Write-only channel the engine pushes updates into. Implementations must
/// tolerate being written from a single logical sequence; the engine never
/// writes one run from two tasks.
pub trait UpdateSink: Send + Sync {
    fn push(&self, update: NegotiationUpdate);
}

#[derive(Clone, Default)]
pub struct InMemoryUpdateSink {
    updates: Arc<Mutex<Vec<NegotiationUpdate>>>,
}

impl InMemoryUpdateSink {
    pub fn updates(&self) -> Vec<NegotiationUpdate> {
        match self.updates.lock() {
            Ok(updates) => updates.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl UpdateSink for InMemoryUpdateSink {
    fn push(&self, update: NegotiationUpdate) {
        match self.updates.lock() {
            Ok(mut updates) => updates.push(update),
            Err(poisoned) => poisoned.into_inner().push(update),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::message::AgentMessage;
    use crate::domain::offer::{Offer, SellerId};

    use super::{InMemoryUpdateSink, NegotiationUpdate, UpdateSink};

    fn offer() -> Offer {
        Offer::new(SellerId("seller_budget".to_owned()), "ValueGreen", 70, 22.0, 10, vec![])
    }

    #[test]
    fn in_memory_sink_preserves_push_order() {
        let sink = InMemoryUpdateSink::default();
        sink.push(NegotiationUpdate::Message { message: AgentMessage::buyer("hi", None) });
        sink.push(NegotiationUpdate::Metric { current_best: offer(), progress: 17 });

        let updates = sink.updates();
        assert_eq!(updates.len(), 2);
        assert!(matches!(updates[0], NegotiationUpdate::Message { .. }));
        assert!(matches!(updates[1], NegotiationUpdate::Metric { progress: 17, .. }));
    }

    #[test]
    fn updates_serialize_with_type_and_data_envelope() {
        let json = serde_json::to_value(NegotiationUpdate::Metric {
            current_best: offer(),
            progress: 50,
        })
        .expect("serialize");

        assert_eq!(json["type"], "metric");
        assert_eq!(json["data"]["progress"], 50);
        assert_eq!(json["data"]["currentBest"]["sellerName"], "ValueGreen");
    }

    #[test]
    fn message_updates_nest_the_message_payload() {
        let json = serde_json::to_value(NegotiationUpdate::Message {
            message: AgentMessage::buyer("Dear Seller,", None),
        })
        .expect("serialize");

        assert_eq!(json["type"], "message");
        assert_eq!(json["data"]["message"]["role"], "buyer");
    }
}
