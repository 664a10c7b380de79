use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use peerly_core::wizard::{CollectError, StateError, SubmittedValues};

use crate::{
    blocks::{mention_greeting, MessageBuilder},
    client::{ApiError, SlackApi},
    commands::SlashCommandPayload,
    views::{ModalView, RenderError},
};

#[derive(Clone, Debug, PartialEq)]
pub struct SlackEnvelope {
    pub envelope_id: String,
    pub event: SlackEvent,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SlackEvent {
    SlashCommand(SlashCommandPayload),
    AppMention(AppMentionEvent),
    Message(MessageEvent),
    BlockAction(BlockActionEvent),
    ViewSubmission(ViewSubmissionEvent),
    Unsupported { event_type: String },
}

impl SlackEvent {
    pub fn event_type(&self) -> SlackEventType {
        match self {
            Self::SlashCommand(_) => SlackEventType::SlashCommand,
            Self::AppMention(_) => SlackEventType::AppMention,
            Self::Message(_) => SlackEventType::Message,
            Self::BlockAction(_) => SlackEventType::BlockAction,
            Self::ViewSubmission(_) => SlackEventType::ViewSubmission,
            Self::Unsupported { .. } => SlackEventType::Unsupported,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SlackEventType {
    SlashCommand,
    AppMention,
    Message,
    BlockAction,
    ViewSubmission,
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppMentionEvent {
    pub channel_id: String,
    pub user_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageEvent {
    pub channel_id: String,
    pub user_id: String,
    pub text: String,
}

/// An interactive component firing outside a submission. Back buttons arrive
/// this way, carrying the open modal's handle so the follow-up phase can
/// replace the screen via `views.update`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockActionEvent {
    pub action_id: String,
    pub value: Option<String>,
    pub user_id: String,
    pub response_url: Option<String>,
    pub trigger_id: Option<String>,
    pub view: Option<ViewHandle>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewHandle {
    pub view_id: String,
    pub private_metadata: String,
}

/// A modal submission. `private_metadata` is the opaque state blob written by
/// whichever screen the user just submitted; `values` is the flattened input
/// map the transport extracted from `view.state.values`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewSubmissionEvent {
    pub callback_id: String,
    pub view_id: String,
    pub private_metadata: String,
    pub values: SubmittedValues,
    pub user_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

/// What the bounded-latency phase hands back to the transport. Slash commands
/// may carry an ephemeral text; view submissions answer with a response
/// action; everything else acks empty.
#[derive(Clone, Debug, PartialEq)]
pub enum AckResponse {
    None,
    Message(String),
    Submission(SubmissionAck),
}

/// The platform's `response_action` vocabulary: accept the submission as-is,
/// clear the whole modal stack, or replace the screen.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmissionAck {
    Accept,
    Clear,
    Update(ModalView),
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Collect(#[from] CollectError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// One callback is handled in two phases. `acknowledge` is the bounded path:
/// pure state transition plus render, no I/O, returns what the transport
/// should answer synchronously. `follow_up` is the unbounded path that runs
/// after the ack went out; its failures are logged by the runner and never
/// reach the closed dialog.
#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> SlackEventType;

    fn acknowledge(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<AckResponse, HandlerError>;

    async fn follow_up(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<(), HandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<SlackEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    /// Bounded phase. An event type with no handler acks empty, which is the
    /// deliberate no-op for unrecognized callbacks.
    pub fn acknowledge(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<AckResponse, HandlerError> {
        match self.handlers.get(&envelope.event.event_type()) {
            Some(handler) => handler.acknowledge(envelope, ctx),
            None => Ok(AckResponse::None),
        }
    }

    /// Unbounded phase, run after the transport delivered the ack.
    pub async fn follow_up(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<(), HandlerError> {
        match self.handlers.get(&envelope.event.event_type()) {
            Some(handler) => handler.follow_up(envelope, ctx).await,
            None => Ok(()),
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

/// Greets a mention with the hello card in the mention's channel.
pub struct AppMentionHandler {
    api: Arc<dyn SlackApi>,
}

impl AppMentionHandler {
    pub fn new(api: Arc<dyn SlackApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl EventHandler for AppMentionHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::AppMention
    }

    fn acknowledge(
        &self,
        _envelope: &SlackEnvelope,
        _ctx: &EventContext,
    ) -> Result<AckResponse, HandlerError> {
        Ok(AckResponse::None)
    }

    async fn follow_up(
        &self,
        envelope: &SlackEnvelope,
        _ctx: &EventContext,
    ) -> Result<(), HandlerError> {
        let SlackEvent::AppMention(event) = &envelope.event else {
            return Ok(());
        };

        self.api.post_message(&event.channel_id, &mention_greeting(&event.user_id)).await?;
        Ok(())
    }
}

/// Replies "Hey!" to a literal "Hello"; every other posted message is only
/// logged.
pub struct MessageHandler {
    api: Arc<dyn SlackApi>,
}

impl MessageHandler {
    pub fn new(api: Arc<dyn SlackApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl EventHandler for MessageHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::Message
    }

    fn acknowledge(
        &self,
        _envelope: &SlackEnvelope,
        _ctx: &EventContext,
    ) -> Result<AckResponse, HandlerError> {
        Ok(AckResponse::None)
    }

    async fn follow_up(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<(), HandlerError> {
        let SlackEvent::Message(event) = &envelope.event else {
            return Ok(());
        };

        if event.text.contains("Hello") {
            self.api
                .post_message(&event.channel_id, &MessageBuilder::new("Hey!").build())
                .await?;
            return Ok(());
        }

        debug!(
            event_name = "ingress.slack.message_observed",
            correlation_id = %ctx.correlation_id,
            channel_id = %event.channel_id,
            "observed channel message"
        );
        Ok(())
    }
}
