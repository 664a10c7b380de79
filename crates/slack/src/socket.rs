use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::events::{
    AckResponse, EventContext, EventDispatcher, SlackEnvelope, SlackEvent, SubmissionAck,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport failed to connect: {0}")]
    Connect(String),
    #[error("transport read failed: {0}")]
    Receive(String),
    #[error("transport ack failed: {0}")]
    Acknowledge(String),
    #[error("transport disconnect failed: {0}")]
    Disconnect(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 250, max_delay_ms: 5_000 }
    }
}

impl ReconnectPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// The ack now carries the handler's response; for view submissions that
/// payload is what keeps the modal moving, so it must ride on the ack frame
/// itself rather than a later API call.
#[async_trait]
pub trait SocketTransport: Send + Sync {
    async fn connect(&self) -> Result<(), TransportError>;
    async fn next_envelope(&self) -> Result<Option<SlackEnvelope>, TransportError>;
    async fn acknowledge(
        &self,
        envelope_id: &str,
        response: &AckResponse,
    ) -> Result<(), TransportError>;
    async fn disconnect(&self) -> Result<(), TransportError>;
}

/// Wire payload for an ack frame, `None` when the ack is empty. Slash-command
/// texts ack as ephemeral messages; submission acks use the platform's
/// `response_action` vocabulary.
pub fn ack_payload(response: &AckResponse) -> Option<serde_json::Value> {
    match response {
        AckResponse::None => None,
        AckResponse::Message(text) => {
            Some(json!({ "response_type": "ephemeral", "text": text }))
        }
        AckResponse::Submission(SubmissionAck::Accept) => None,
        AckResponse::Submission(SubmissionAck::Clear) => {
            Some(json!({ "response_action": "clear" }))
        }
        AckResponse::Submission(SubmissionAck::Update(view)) => {
            Some(json!({ "response_action": "update", "view": view }))
        }
    }
}

#[derive(Default)]
pub struct NoopSocketTransport;

#[async_trait]
impl SocketTransport for NoopSocketTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn next_envelope(&self) -> Result<Option<SlackEnvelope>, TransportError> {
        Ok(None)
    }

    async fn acknowledge(
        &self,
        _envelope_id: &str,
        _response: &AckResponse,
    ) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

pub struct SocketModeRunner {
    transport: Arc<dyn SocketTransport>,
    dispatcher: EventDispatcher,
    reconnect_policy: ReconnectPolicy,
}

impl SocketModeRunner {
    pub fn new(
        transport: Arc<dyn SocketTransport>,
        dispatcher: EventDispatcher,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self { transport, dispatcher, reconnect_policy }
    }

    pub async fn start(&self) -> Result<()> {
        for attempt in 0..=self.reconnect_policy.max_retries {
            match self.connect_and_pump(attempt).await {
                Ok(()) => return Ok(()),
                Err(transport_error) => {
                    warn!(
                        attempt,
                        max_retries = self.reconnect_policy.max_retries,
                        error = %transport_error,
                        "socket mode transport failed"
                    );

                    if attempt >= self.reconnect_policy.max_retries {
                        warn!(
                            max_retries = self.reconnect_policy.max_retries,
                            "socket mode retries exhausted; continuing process without crash"
                        );
                        return Ok(());
                    }

                    let delay = self.reconnect_policy.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Ok(())
    }

    async fn connect_and_pump(&self, attempt: u32) -> Result<(), TransportError> {
        info!(attempt, "opening socket mode transport connection");
        self.transport.connect().await?;
        info!(attempt, "socket mode transport connected");

        loop {
            let Some(envelope) = self.transport.next_envelope().await? else {
                info!(attempt, "socket mode transport stream closed");
                self.transport.disconnect().await?;
                return Ok(());
            };
            let fields = correlation_fields(&envelope);

            info!(
                event_name = "ingress.slack.envelope_received",
                envelope_id = %envelope.envelope_id,
                event_type = ?envelope.event.event_type(),
                correlation_id = %envelope.envelope_id,
                callback_id = fields.callback_id.as_deref().unwrap_or("unknown"),
                user_id = fields.user_id.as_deref().unwrap_or("unknown"),
                "received slack envelope"
            );

            let context = EventContext { correlation_id: envelope.envelope_id.clone() };

            // The ack is owed either way; a failed handler still gets an
            // empty ack so the envelope is not redelivered.
            let ack = match self.dispatcher.acknowledge(&envelope, &context) {
                Ok(ack) => ack,
                Err(error) => {
                    warn!(
                        event_name = "ingress.slack.acknowledge_failed",
                        envelope_id = %envelope.envelope_id,
                        correlation_id = %envelope.envelope_id,
                        callback_id = fields.callback_id.as_deref().unwrap_or("unknown"),
                        user_id = fields.user_id.as_deref().unwrap_or("unknown"),
                        error = %error,
                        "acknowledge phase failed; sending empty ack"
                    );
                    AckResponse::None
                }
            };

            if let Err(error) = self.transport.acknowledge(&envelope.envelope_id, &ack).await {
                warn!(
                    event_name = "ingress.slack.ack_sent",
                    envelope_id = %envelope.envelope_id,
                    correlation_id = %envelope.envelope_id,
                    callback_id = fields.callback_id.as_deref().unwrap_or("unknown"),
                    user_id = fields.user_id.as_deref().unwrap_or("unknown"),
                    error = %error,
                    "failed to acknowledge slack envelope"
                );
            } else {
                debug!(
                    event_name = "ingress.slack.ack_sent",
                    envelope_id = %envelope.envelope_id,
                    correlation_id = %envelope.envelope_id,
                    callback_id = fields.callback_id.as_deref().unwrap_or("unknown"),
                    user_id = fields.user_id.as_deref().unwrap_or("unknown"),
                    "acknowledged slack envelope"
                );
            }

            if let Err(error) = self.dispatcher.follow_up(&envelope, &context).await {
                warn!(
                    event_name = "ingress.slack.follow_up_failed",
                    envelope_id = %envelope.envelope_id,
                    correlation_id = %envelope.envelope_id,
                    callback_id = fields.callback_id.as_deref().unwrap_or("unknown"),
                    user_id = fields.user_id.as_deref().unwrap_or("unknown"),
                    error = %error,
                    "follow-up failed; continuing socket loop"
                );
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct CorrelationFields {
    callback_id: Option<String>,
    user_id: Option<String>,
}

fn correlation_fields(envelope: &SlackEnvelope) -> CorrelationFields {
    match &envelope.event {
        SlackEvent::SlashCommand(payload) => CorrelationFields {
            callback_id: Some(payload.command.clone()),
            user_id: Some(payload.user_id.clone()),
        },
        SlackEvent::AppMention(event) => {
            CorrelationFields { callback_id: None, user_id: Some(event.user_id.clone()) }
        }
        SlackEvent::Message(event) => {
            CorrelationFields { callback_id: None, user_id: Some(event.user_id.clone()) }
        }
        SlackEvent::BlockAction(event) => CorrelationFields {
            callback_id: Some(event.action_id.clone()),
            user_id: Some(event.user_id.clone()),
        },
        SlackEvent::ViewSubmission(event) => CorrelationFields {
            callback_id: Some(event.callback_id.clone()),
            user_id: Some(event.user_id.clone()),
        },
        SlackEvent::Unsupported { .. } => CorrelationFields::default(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use super::{
        ack_payload, ReconnectPolicy, SocketModeRunner, SocketTransport, TransportError,
    };
    use crate::events::{
        AckResponse, EventDispatcher, SlackEnvelope, SlackEvent, SubmissionAck,
    };
    use crate::views::error_view;
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct ScriptedTransport {
        state: Mutex<ScriptedState>,
    }

    #[derive(Default)]
    struct ScriptedState {
        connect_results: VecDeque<Result<(), TransportError>>,
        envelopes: VecDeque<Result<Option<SlackEnvelope>, TransportError>>,
        disconnect_results: VecDeque<Result<(), TransportError>>,
        connect_attempts: usize,
        acknowledgements: Vec<(String, AckResponse)>,
        disconnect_calls: usize,
    }

    impl ScriptedTransport {
        fn with_script(
            connect_results: Vec<Result<(), TransportError>>,
            envelopes: Vec<Result<Option<SlackEnvelope>, TransportError>>,
            disconnect_results: Vec<Result<(), TransportError>>,
        ) -> Self {
            Self {
                state: Mutex::new(ScriptedState {
                    connect_results: connect_results.into(),
                    envelopes: envelopes.into(),
                    disconnect_results: disconnect_results.into(),
                    connect_attempts: 0,
                    acknowledgements: Vec::new(),
                    disconnect_calls: 0,
                }),
            }
        }

        async fn connect_attempts(&self) -> usize {
            self.state.lock().await.connect_attempts
        }

        async fn acknowledgements(&self) -> Vec<(String, AckResponse)> {
            self.state.lock().await.acknowledgements.clone()
        }
    }

    #[async_trait]
    impl SocketTransport for ScriptedTransport {
        async fn connect(&self) -> Result<(), TransportError> {
            let mut state = self.state.lock().await;
            state.connect_attempts += 1;
            state.connect_results.pop_front().unwrap_or(Ok(()))
        }

        async fn next_envelope(&self) -> Result<Option<SlackEnvelope>, TransportError> {
            let mut state = self.state.lock().await;
            state.envelopes.pop_front().unwrap_or(Ok(None))
        }

        async fn acknowledge(
            &self,
            envelope_id: &str,
            response: &AckResponse,
        ) -> Result<(), TransportError> {
            let mut state = self.state.lock().await;
            state.acknowledgements.push((envelope_id.to_owned(), response.clone()));
            Ok(())
        }

        async fn disconnect(&self) -> Result<(), TransportError> {
            let mut state = self.state.lock().await;
            state.disconnect_calls += 1;
            state.disconnect_results.pop_front().unwrap_or(Ok(()))
        }
    }

    #[tokio::test]
    async fn reconnects_after_initial_connect_failure() {
        let transport = Arc::new(ScriptedTransport::with_script(
            vec![Err(TransportError::Connect("network down".to_owned())), Ok(())],
            vec![
                Ok(Some(SlackEnvelope {
                    envelope_id: "env-1".to_owned(),
                    event: SlackEvent::Unsupported { event_type: "test".to_owned() },
                })),
                Ok(None),
            ],
            vec![Ok(())],
        ));

        let runner = SocketModeRunner::new(
            transport.clone(),
            EventDispatcher::default(),
            ReconnectPolicy { max_retries: 2, base_delay_ms: 0, max_delay_ms: 0 },
        );

        runner.start().await.expect("runner should not fail");

        assert_eq!(transport.connect_attempts().await, 2);
        assert_eq!(
            transport.acknowledgements().await,
            vec![("env-1".to_owned(), AckResponse::None)]
        );
    }

    #[tokio::test]
    async fn exhausts_retries_without_crashing() {
        let transport = Arc::new(ScriptedTransport::with_script(
            vec![
                Err(TransportError::Connect("fail-1".to_owned())),
                Err(TransportError::Connect("fail-2".to_owned())),
                Err(TransportError::Connect("fail-3".to_owned())),
            ],
            vec![],
            vec![],
        ));

        let runner = SocketModeRunner::new(
            transport.clone(),
            EventDispatcher::default(),
            ReconnectPolicy { max_retries: 2, base_delay_ms: 0, max_delay_ms: 0 },
        );

        runner.start().await.expect("runner should degrade gracefully");
        assert_eq!(transport.connect_attempts().await, 3);
    }

    #[tokio::test]
    async fn unregistered_events_are_acked_empty() {
        let transport = Arc::new(ScriptedTransport::with_script(
            vec![Ok(())],
            vec![
                Ok(Some(SlackEnvelope {
                    envelope_id: "env-a".to_owned(),
                    event: SlackEvent::Unsupported { event_type: "team_join".to_owned() },
                })),
                Ok(Some(SlackEnvelope {
                    envelope_id: "env-b".to_owned(),
                    event: SlackEvent::Unsupported { event_type: "reaction_added".to_owned() },
                })),
                Ok(None),
            ],
            vec![Ok(())],
        ));

        let runner = SocketModeRunner::new(
            transport.clone(),
            EventDispatcher::default(),
            ReconnectPolicy { max_retries: 0, base_delay_ms: 0, max_delay_ms: 0 },
        );

        runner.start().await.expect("runner should not fail");

        let acks = transport.acknowledgements().await;
        assert_eq!(acks.len(), 2);
        assert!(acks.iter().all(|(_, response)| *response == AckResponse::None));
    }

    #[test]
    fn ack_payload_covers_the_response_vocabulary() {
        assert_eq!(ack_payload(&AckResponse::None), None);
        assert_eq!(ack_payload(&AckResponse::Submission(SubmissionAck::Accept)), None);
        assert_eq!(
            ack_payload(&AckResponse::Message("Fetching users...".to_owned())),
            Some(json!({ "response_type": "ephemeral", "text": "Fetching users..." }))
        );
        assert_eq!(
            ack_payload(&AckResponse::Submission(SubmissionAck::Clear)),
            Some(json!({ "response_action": "clear" }))
        );

        let update = ack_payload(&AckResponse::Submission(SubmissionAck::Update(error_view())))
            .expect("update payload");
        assert_eq!(update["response_action"], "update");
        assert_eq!(update["view"]["callback_id"], "feedback.error.v1");
    }
}
