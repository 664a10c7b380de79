use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use peerly_core::wizard::WizardState;

use crate::{
    blocks::roster_message,
    client::{active_users, SlackApi},
    events::{
        AckResponse, EventContext, EventHandler, HandlerError, SlackEnvelope, SlackEvent,
        SlackEventType,
    },
    views::subject_select_view,
};

/// The raw slash-command payload as the transport hands it over. `trigger_id`
/// is only valid for a few seconds, so modal opens must happen promptly in
/// the follow-up phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashCommandPayload {
    pub command: String,
    pub text: String,
    pub channel_id: String,
    pub user_id: String,
    pub trigger_id: String,
    pub response_url: String,
    pub request_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedbackCommand {
    Feedback,
    ListUsers,
    Unknown { command: String },
}

pub fn parse_command(command: &str) -> FeedbackCommand {
    match command.trim() {
        "/feedback" => FeedbackCommand::Feedback,
        "/list-users" => FeedbackCommand::ListUsers,
        other => FeedbackCommand::Unknown { command: other.to_owned() },
    }
}

pub fn usage_message() -> String {
    "Unknown command. Try `/feedback` to give peer feedback or `/list-users` to see who is around."
        .to_owned()
}

/// Routes the two supported slash commands. `/feedback` acks empty and opens
/// the subject-selection modal in follow-up; `/list-users` acks with a
/// holding message and posts the roster through the response URL.
pub struct SlashCommandHandler {
    api: Arc<dyn SlackApi>,
}

impl SlashCommandHandler {
    pub fn new(api: Arc<dyn SlackApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl EventHandler for SlashCommandHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::SlashCommand
    }

    fn acknowledge(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<AckResponse, HandlerError> {
        let SlackEvent::SlashCommand(payload) = &envelope.event else {
            return Ok(AckResponse::None);
        };

        match parse_command(&payload.command) {
            FeedbackCommand::Feedback => Ok(AckResponse::None),
            FeedbackCommand::ListUsers => Ok(AckResponse::Message("Fetching users...".to_owned())),
            FeedbackCommand::Unknown { command } => {
                debug!(
                    event_name = "ingress.slack.unknown_command",
                    correlation_id = %ctx.correlation_id,
                    command = %command,
                    "unsupported slash command"
                );
                Ok(AckResponse::Message(usage_message()))
            }
        }
    }

    async fn follow_up(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<(), HandlerError> {
        let SlackEvent::SlashCommand(payload) = &envelope.event else {
            return Ok(());
        };

        match parse_command(&payload.command) {
            FeedbackCommand::Feedback => {
                let state = WizardState::begin(&payload.channel_id, &payload.user_id);
                let view = subject_select_view(&state)?;
                self.api.open_view(&payload.trigger_id, &view).await?;
                Ok(())
            }
            FeedbackCommand::ListUsers => {
                let users = match self.api.list_users().await {
                    Ok(users) => users,
                    Err(error) => {
                        // The "Fetching users..." ack already went out; a
                        // failed listing only costs the roster reply.
                        warn!(
                            event_name = "ingress.slack.roster_failed",
                            correlation_id = %ctx.correlation_id,
                            error = %error,
                            "users.list failed"
                        );
                        return Ok(());
                    }
                };
                let roster = roster_message(&active_users(&users));
                self.api.respond(&payload.response_url, &roster).await?;
                Ok(())
            }
            FeedbackCommand::Unknown { .. } => Ok(()),
        }
    }
}
