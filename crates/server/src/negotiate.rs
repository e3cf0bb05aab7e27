//! SSE streaming endpoints for negotiation runs.
//!
//! - `POST /api/negotiate`        — marketplace run against the full roster
//! - `POST /api/negotiate/direct` — single-counterparty run
//!
//! Every engine update becomes one `data:` frame. If the engine fails, a
//! terminal `{"type":"error"}` frame is forwarded before the stream closes.
//! If the client disconnects, the run is cancelled rather than left running.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::post,
    Json, Router,
};
use futures::stream::Stream;
use tokio::sync::mpsc;

use parley_agent::{EngineConfig, NegotiationEngine};
use parley_core::{DirectRequest, NegotiationRequest, NegotiationUpdate, UpdateSink};

use crate::bootstrap::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/negotiate", post(negotiate))
        .route("/api/negotiate/direct", post(negotiate_direct))
        .with_state(state)
}

/// One frame of the outgoing event stream.
#[derive(Clone, Debug, PartialEq)]
pub enum StreamFrame {
    Update(NegotiationUpdate),
    Error { message: String },
}

impl StreamFrame {
    pub fn to_sse_data(&self) -> String {
        match self {
            Self::Update(update) => serde_json::to_string(update).unwrap_or_else(|error| {
                format!("{{\"type\":\"error\",\"data\":{{\"error\":\"{error}\"}}}}")
            }),
            Self::Error { message } => {
                serde_json::json!({ "type": "error", "data": { "error": message } }).to_string()
            }
        }
    }
}

struct ChannelSink {
    tx: mpsc::UnboundedSender<StreamFrame>,
}

impl UpdateSink for ChannelSink {
    fn push(&self, update: NegotiationUpdate) {
        // A closed receiver means the client went away; the run task notices
        // separately and stops.
        let _ = self.tx.send(StreamFrame::Update(update));
    }
}

pub async fn negotiate(
    State(state): State<AppState>,
    Json(request): Json<NegotiationRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = spawn_marketplace(state, request);
    sse_response(rx)
}

pub async fn negotiate_direct(
    State(state): State<AppState>,
    Json(request): Json<DirectRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = spawn_direct(state, request);
    sse_response(rx)
}

pub fn spawn_marketplace(
    state: AppState,
    request: NegotiationRequest,
) -> mpsc::UnboundedReceiver<StreamFrame> {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut engine = NegotiationEngine::new(
        EngineConfig::marketplace(&state.config),
        state.llm.clone(),
        state.roster.as_ref().clone(),
    );

    tokio::spawn(async move {
        let sink = ChannelSink { tx: tx.clone() };
        tokio::select! {
            result = engine.run_marketplace(&request, &sink) => {
                if let Err(error) = result {
                    tracing::error!(
                        event_name = "negotiation.marketplace_failed",
                        error = %error,
                        "marketplace negotiation failed"
                    );
                    let _ = tx.send(StreamFrame::Error { message: error.to_string() });
                }
            }
            _ = tx.closed() => {
                tracing::debug!(
                    event_name = "negotiation.client_disconnected",
                    "client disconnected, cancelling marketplace run"
                );
            }
        }
    });

    rx
}

pub fn spawn_direct(
    state: AppState,
    request: DirectRequest,
) -> mpsc::UnboundedReceiver<StreamFrame> {
    let (tx, rx) = mpsc::unbounded_channel();
    let mut engine = NegotiationEngine::new(
        EngineConfig::direct(&state.config),
        state.llm.clone(),
        state.roster.as_ref().clone(),
    );

    tokio::spawn(async move {
        let sink = ChannelSink { tx: tx.clone() };
        tokio::select! {
            result = engine.run_direct(&request, &sink) => {
                if let Err(error) = result {
                    tracing::error!(
                        event_name = "negotiation.direct_failed",
                        error = %error,
                        "direct negotiation failed"
                    );
                    let _ = tx.send(StreamFrame::Error { message: error.to_string() });
                }
            }
            _ = tx.closed() => {
                tracing::debug!(
                    event_name = "negotiation.client_disconnected",
                    "client disconnected, cancelling direct run"
                );
            }
        }
    });

    rx
}

fn sse_response(
    rx: mpsc::UnboundedReceiver<StreamFrame>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = futures::stream::unfold(rx, |mut rx| async move {
        let frame = rx.recv().await?;
        Some((Ok(Event::default().data(frame.to_sse_data())), rx))
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parley_agent::FailingClient;
    use parley_core::config::{AppConfig, ConfigOverrides, LoadOptions};
    use parley_core::{builtin_roster, NegotiationRequest, NegotiationUpdate, Priority, SellerId};

    use crate::bootstrap::AppState;

    use super::{spawn_direct, spawn_marketplace, StreamFrame};

    fn test_state() -> AppState {
        let config = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides { pacing: Some(false), ..ConfigOverrides::default() },
            ..LoadOptions::default()
        })
        .expect("config loads");

        AppState {
            config: Arc::new(config),
            llm: Arc::new(FailingClient),
            roster: Arc::new(builtin_roster()),
        }
    }

    fn request() -> NegotiationRequest {
        NegotiationRequest {
            product: "bamboo toothbrushes".to_owned(),
            quantity: 50,
            budget: 2.0,
            priority: Priority::Price,
            buyer_name: "Alex".to_owned(),
        }
    }

    async fn collect(mut rx: tokio::sync::mpsc::UnboundedReceiver<StreamFrame>) -> Vec<StreamFrame> {
        let mut frames = Vec::new();
        while let Some(frame) = rx.recv().await {
            frames.push(frame);
        }
        frames
    }

    #[tokio::test]
    async fn marketplace_stream_ends_with_a_complete_frame() {
        let frames = collect(spawn_marketplace(test_state(), request())).await;

        // 24 messages + 6 metrics + 1 complete.
        assert_eq!(frames.len(), 31);
        let Some(StreamFrame::Update(NegotiationUpdate::Complete { .. })) = frames.last() else {
            panic!("stream must end with a complete update");
        };
    }

    #[tokio::test]
    async fn direct_stream_fails_fast_for_unknown_sellers() {
        let direct = parley_core::DirectRequest {
            request: request(),
            seller_id: SellerId("seller_missing".to_owned()),
            buyer_model: None,
        };

        let frames = collect(spawn_direct(test_state(), direct)).await;
        assert_eq!(frames.len(), 1);
        let StreamFrame::Error { message } = &frames[0] else {
            panic!("expected a terminal error frame");
        };
        assert!(message.contains("seller_missing"));
    }

    #[tokio::test]
    async fn frames_serialize_in_the_client_wire_shape() {
        let frames = collect(spawn_marketplace(test_state(), request())).await;

        let first = frames.first().expect("at least one frame").to_sse_data();
        let parsed: serde_json::Value = serde_json::from_str(&first).expect("valid json");
        assert_eq!(parsed["type"], "message");
        assert_eq!(parsed["data"]["message"]["role"], "buyer");

        let error = StreamFrame::Error { message: "boom".to_owned() }.to_sse_data();
        let parsed: serde_json::Value = serde_json::from_str(&error).expect("valid json");
        assert_eq!(parsed["type"], "error");
        assert_eq!(parsed["data"]["error"], "boom");
    }

    #[tokio::test]
    async fn dropping_the_receiver_cancels_the_run() {
        let rx = spawn_marketplace(test_state(), request());
        drop(rx);

        // The spawned task observes the closed channel and stops; nothing to
        // assert beyond not hanging.
        tokio::task::yield_now().await;
    }
}
