use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use peerly_core::wizard::{apply, Disposition, WizardEvent, WizardState, WizardStep};

use crate::{
    blocks::MessageBuilder,
    client::SlackApi,
    events::{
        AckResponse, BlockActionEvent, EventContext, EventHandler, HandlerError, SlackEnvelope,
        SlackEvent, SlackEventType, SubmissionAck, ViewSubmissionEvent,
    },
    summary::compose_summary,
    views::{callbacks, error_view, view_for},
};

/// Demo button carried on the mention greeting.
pub const PING_ACTION: &str = "hello.ping.v1";

/// Maps a view-submission callback id onto the wizard event it represents.
/// `None` means the callback does not belong to the wizard and is acked as a
/// deliberate no-op.
pub fn classify_submission(event: &ViewSubmissionEvent) -> Option<WizardEvent> {
    if event.callback_id == callbacks::SUBJECT {
        return Some(WizardEvent::Submitted {
            step: WizardStep::SelectingSubject,
            values: event.values.clone(),
        });
    }
    if event.callback_id == callbacks::REVIEW {
        return Some(WizardEvent::Confirmed);
    }
    for step in [
        WizardStep::RatingPerformance,
        WizardStep::RatingCollaboration,
        WizardStep::RatingSkills,
        WizardStep::Overall,
    ] {
        if event.callback_id == callbacks::step(step) {
            return Some(WizardEvent::Submitted { step, values: event.values.clone() });
        }
    }
    None
}

/// Handles every wizard modal submission. The acknowledge phase is the whole
/// state machine turn: reconstruct the run from the blob, apply one event,
/// answer with the next screen (or clear on confirmation). The follow-up
/// phase posts the summary once the run confirmed.
pub struct FeedbackSubmissionHandler {
    api: Arc<dyn SlackApi>,
}

impl FeedbackSubmissionHandler {
    pub fn new(api: Arc<dyn SlackApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl EventHandler for FeedbackSubmissionHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::ViewSubmission
    }

    fn acknowledge(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<AckResponse, HandlerError> {
        let SlackEvent::ViewSubmission(event) = &envelope.event else {
            return Ok(AckResponse::None);
        };

        let Some(wizard_event) = classify_submission(event) else {
            debug!(
                event_name = "wizard.callback_ignored",
                correlation_id = %ctx.correlation_id,
                callback_id = %event.callback_id,
                "unrecognized view submission acknowledged as no-op"
            );
            return Ok(AckResponse::Submission(SubmissionAck::Accept));
        };

        let state = match WizardState::from_metadata(&event.private_metadata) {
            Ok(state) => state,
            Err(error) => {
                // The blob is the run's only storage; if it does not parse
                // the run is gone and guessing defaults would fake progress.
                warn!(
                    event_name = "wizard.metadata_malformed",
                    correlation_id = %ctx.correlation_id,
                    callback_id = %event.callback_id,
                    error = %error,
                    "wizard metadata failed to decode"
                );
                return Ok(AckResponse::Submission(SubmissionAck::Update(error_view())));
            }
        };

        let outcome = match apply(wizard_event, state) {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(
                    event_name = "wizard.transition_failed",
                    correlation_id = %ctx.correlation_id,
                    callback_id = %event.callback_id,
                    error = %error,
                    "wizard transition rejected; dialog left unchanged"
                );
                return Ok(AckResponse::Submission(SubmissionAck::Accept));
            }
        };

        match outcome.disposition {
            Disposition::Submitted => Ok(AckResponse::Submission(SubmissionAck::Clear)),
            Disposition::Continue => {
                let view = view_for(&outcome.state)?;
                Ok(AckResponse::Submission(SubmissionAck::Update(view)))
            }
        }
    }

    async fn follow_up(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<(), HandlerError> {
        let SlackEvent::ViewSubmission(event) = &envelope.event else {
            return Ok(());
        };
        if event.callback_id != callbacks::REVIEW {
            return Ok(());
        }

        // The dialog already cleared; any failure here is logged and the run
        // still counts as complete from the user's side.
        let state = match WizardState::from_metadata(&event.private_metadata) {
            Ok(state) => state,
            Err(error) => {
                warn!(
                    event_name = "wizard.summary_post_failed",
                    correlation_id = %ctx.correlation_id,
                    error = %error,
                    "confirmed run carried undecodable metadata; summary not posted"
                );
                return Ok(());
            }
        };

        let summary = compose_summary(&state, Utc::now());
        if let Err(error) = self.api.post_message(&state.channel_id, &summary).await {
            warn!(
                event_name = "wizard.summary_post_failed",
                correlation_id = %ctx.correlation_id,
                channel_id = %state.channel_id,
                error = %error,
                "summary post failed after confirmation"
            );
        }
        Ok(())
    }
}

/// Handles block actions: wizard back buttons (re-render the target screen
/// via `views.update`) and the greeting card's demo button. Unknown action
/// ids are no-ops.
pub struct FeedbackActionHandler {
    api: Arc<dyn SlackApi>,
}

impl FeedbackActionHandler {
    pub fn new(api: Arc<dyn SlackApi>) -> Self {
        Self { api }
    }

    async fn handle_back(
        &self,
        event: &BlockActionEvent,
        ctx: &EventContext,
    ) -> Result<(), HandlerError> {
        let Some(view) = &event.view else {
            debug!(
                event_name = "wizard.back_without_view",
                correlation_id = %ctx.correlation_id,
                "back action arrived without a view handle"
            );
            return Ok(());
        };

        let target = event
            .value
            .as_deref()
            .and_then(|value| value.parse::<u8>().ok())
            .and_then(|number| WizardStep::try_from(number).ok());
        let Some(target) = target else {
            debug!(
                event_name = "wizard.callback_ignored",
                correlation_id = %ctx.correlation_id,
                value = event.value.as_deref().unwrap_or(""),
                "back action carried no usable target step"
            );
            return Ok(());
        };

        let state = match WizardState::from_metadata(&view.private_metadata) {
            Ok(state) => state,
            Err(error) => {
                warn!(
                    event_name = "wizard.metadata_malformed",
                    correlation_id = %ctx.correlation_id,
                    error = %error,
                    "back action metadata failed to decode"
                );
                self.api.update_view(&view.view_id, &error_view()).await?;
                return Ok(());
            }
        };

        // Back never collects; the machine only moves the step pointer.
        let outcome = apply(WizardEvent::Back { target }, state)?;
        let screen = view_for(&outcome.state)?;
        self.api.update_view(&view.view_id, &screen).await?;
        Ok(())
    }

    async fn handle_ping(&self, event: &BlockActionEvent) -> Result<(), HandlerError> {
        let Some(response_url) = &event.response_url else {
            return Ok(());
        };
        self.api
            .respond(response_url, &MessageBuilder::new("Now working on it ...").build())
            .await?;
        self.api
            .respond(response_url, &MessageBuilder::new("It's done :white_check_mark:").build())
            .await?;
        Ok(())
    }
}

#[async_trait]
impl EventHandler for FeedbackActionHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::BlockAction
    }

    fn acknowledge(
        &self,
        _envelope: &SlackEnvelope,
        _ctx: &EventContext,
    ) -> Result<AckResponse, HandlerError> {
        // Block actions are acked empty; the work happens in follow-up.
        Ok(AckResponse::None)
    }

    async fn follow_up(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<(), HandlerError> {
        let SlackEvent::BlockAction(event) = &envelope.event else {
            return Ok(());
        };

        if event.action_id == callbacks::BACK_ACTION {
            return self.handle_back(event, ctx).await;
        }
        if event.action_id == PING_ACTION {
            return self.handle_ping(event).await;
        }

        debug!(
            event_name = "wizard.callback_ignored",
            correlation_id = %ctx.correlation_id,
            action_id = %event.action_id,
            "unrecognized block action ignored"
        );
        Ok(())
    }
}
