use serde::Serialize;
use thiserror::Error;

use peerly_core::catalog::{Category, Rating};
use peerly_core::wizard::{inputs, StateError, WizardState, WizardStep};

use crate::blocks::{
    ActionsBuilder, Block, ButtonElement, ContextBuilder, InputElement, PlainTextInput,
    SectionBuilder, SelectOption, StaticSelect, TextObject, UsersSelect,
};

/// Interactive callback vocabulary shared by the renderers and the handlers
/// that decode submissions. Ids are versioned like every interactive id in
/// this crate.
pub mod callbacks {
    use peerly_core::wizard::WizardStep;

    pub const SUBJECT: &str = "feedback.subject.v1";
    pub const REVIEW: &str = "feedback.review.v1";
    pub const BACK_ACTION: &str = "feedback.back.v1";

    pub fn step(step: WizardStep) -> String {
        format!("feedback.step.{}.v1", step.number())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("no dialog screen renders step {0:?}")]
    InvalidStep(WizardStep),
    #[error(transparent)]
    State(#[from] StateError),
}

/// A `views.open`/`views.update` payload. `private_metadata` carries the
/// serialized wizard state; the platform echoes it back untouched on the next
/// callback, which is the only persistence this bot has.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModalView {
    #[serde(rename = "type")]
    pub view_type: String,
    pub callback_id: String,
    pub title: TextObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit: Option<TextObject>,
    pub close: TextObject,
    pub blocks: Vec<Block>,
    pub private_metadata: String,
}

pub struct ViewBuilder {
    callback_id: String,
    title: TextObject,
    submit: Option<TextObject>,
    close: TextObject,
    private_metadata: String,
    blocks: Vec<Block>,
}

impl ViewBuilder {
    pub fn modal(callback_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            callback_id: callback_id.into(),
            title: TextObject::plain(title),
            submit: None,
            close: TextObject::plain("Cancel"),
            private_metadata: String::new(),
            blocks: Vec::new(),
        }
    }

    pub fn submit(mut self, label: impl Into<String>) -> Self {
        self.submit = Some(TextObject::plain(label));
        self
    }

    pub fn close(mut self, label: impl Into<String>) -> Self {
        self.close = TextObject::plain(label);
        self
    }

    pub fn private_metadata(mut self, blob: impl Into<String>) -> Self {
        self.private_metadata = blob.into();
        self
    }

    pub fn section<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        self.blocks.push(builder.build(block_id.into()));
        self
    }

    pub fn divider(mut self) -> Self {
        self.blocks.push(Block::Divider);
        self
    }

    pub fn input(
        mut self,
        block_id: impl Into<String>,
        label: impl Into<String>,
        element: impl Into<InputElement>,
    ) -> Self {
        self.blocks.push(Block::Input {
            block_id: block_id.into(),
            label: TextObject::plain(label),
            element: element.into(),
            optional: false,
        });
        self
    }

    pub fn optional_input(
        mut self,
        block_id: impl Into<String>,
        label: impl Into<String>,
        element: impl Into<InputElement>,
    ) -> Self {
        self.blocks.push(Block::Input {
            block_id: block_id.into(),
            label: TextObject::plain(label),
            element: element.into(),
            optional: true,
        });
        self
    }

    pub fn actions<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ActionsBuilder),
    {
        let mut builder = ActionsBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Actions { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn context<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ContextBuilder),
    {
        let mut builder = ContextBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Context { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn build(self) -> ModalView {
        ModalView {
            view_type: "modal".to_owned(),
            callback_id: self.callback_id,
            title: self.title,
            submit: self.submit,
            close: self.close,
            blocks: self.blocks,
            private_metadata: self.private_metadata,
        }
    }
}

/// Screen for the wizard's current step. Every renderer serializes the state
/// into the view it returns, so whatever the user does next hands the full
/// run back to us.
pub fn view_for(state: &WizardState) -> Result<ModalView, RenderError> {
    match state.step {
        WizardStep::SelectingSubject => subject_select_view(state),
        WizardStep::RatingPerformance
        | WizardStep::RatingCollaboration
        | WizardStep::RatingSkills
        | WizardStep::Overall => step_view(state.step, state),
        WizardStep::Review => review_view(state),
    }
}

pub fn subject_select_view(state: &WizardState) -> Result<ModalView, RenderError> {
    let mut select = UsersSelect::new("selected_user", "Select a user");
    if let Some(user) = &state.selected_user {
        select = select.initial_user(user.clone());
    }

    Ok(ViewBuilder::modal(callbacks::SUBJECT, "Give Feedback")
        .submit("Next")
        .private_metadata(state.to_metadata()?)
        .section("feedback.subject.intro.v1", |section| {
            section.mrkdwn("Select a team member to give feedback to:");
        })
        .input(inputs::SUBJECT, "Team Member", select)
        .build())
}

/// Input screens 2..5. Previously captured answers are rendered back as
/// initial values so revisiting a step never loses work.
pub fn step_view(step: WizardStep, state: &WizardState) -> Result<ModalView, RenderError> {
    let position = step.position().ok_or(RenderError::InvalidStep(step))?;
    let previous = step.previous().ok_or(RenderError::InvalidStep(step))?;
    let subject = state.selected_user.as_deref().unwrap_or("unknown");

    let (title, phase) = match step {
        WizardStep::RatingPerformance => ("Performance", "Performance Evaluation"),
        WizardStep::RatingCollaboration => ("Collaboration", "Collaboration & Teamwork"),
        WizardStep::RatingSkills => ("Skills & Growth", "Skills & Growth"),
        WizardStep::Overall => ("Overall Feedback", "Overall Feedback"),
        WizardStep::SelectingSubject | WizardStep::Review => {
            return Err(RenderError::InvalidStep(step))
        }
    };
    let back_label =
        if step == WizardStep::RatingPerformance { "← Change User" } else { "← Back" };
    let submit_label = if step == WizardStep::Overall { "Review" } else { "Next" };

    let mut view = ViewBuilder::modal(callbacks::step(step), title)
        .submit(submit_label)
        .private_metadata(state.to_metadata()?)
        .section("feedback.step.header.v1", |section| {
            section
                .mrkdwn(format!("*Feedback for <@{subject}>*\n\nStep {position} of 4: {phase}"));
        })
        .divider();

    view = match step.category() {
        Some(category) => category_inputs(view, category, state),
        None => overall_inputs(view, state),
    };

    Ok(view
        .actions("feedback.nav.v1", |actions| {
            actions.button(
                ButtonElement::new(callbacks::BACK_ACTION, back_label)
                    .value(previous.number().to_string()),
            );
        })
        .build())
}

fn category_inputs(view: ViewBuilder, category: Category, state: &WizardState) -> ViewBuilder {
    let (rating_label, notes_label, notes_action, notes_placeholder) = match category {
        Category::Performance => {
            ("Overall Performance", "Comments", "comments", "Share specific examples...")
        }
        Category::Collaboration => {
            ("Collaboration Rating", "Comments", "comments", "How well do they work with others?")
        }
        Category::Skills => (
            "Technical/Professional Skills",
            "Growth Areas",
            "areas",
            "What skills should they develop?",
        ),
    };

    let options = category
        .rating_options()
        .iter()
        .map(|option| SelectOption::new(option.label, option.rating.value()))
        .collect();
    let mut select = StaticSelect::new("rating", "Select rating", options);
    let mut notes = PlainTextInput::new(notes_action, notes_placeholder).multiline();
    if let Some(feedback) = state.category(category) {
        select = select.initial_option(scale_option(category, feedback.rating));
        if !feedback.comments.is_empty() {
            notes = notes.initial_value(feedback.comments.clone());
        }
    }

    view.input(category.rating_input_id(), rating_label, select).optional_input(
        category.notes_input_id(),
        notes_label,
        notes,
    )
}

fn overall_inputs(view: ViewBuilder, state: &WizardState) -> ViewBuilder {
    let mut strengths = PlainTextInput::new("text", "What are their key strengths?").multiline();
    let mut improvements = PlainTextInput::new("text", "What could they improve?").multiline();
    let mut additional = PlainTextInput::new("text", "Any other feedback?").multiline();
    if let Some(overall) = &state.overall {
        if !overall.strengths.is_empty() {
            strengths = strengths.initial_value(overall.strengths.clone());
        }
        if !overall.improvements.is_empty() {
            improvements = improvements.initial_value(overall.improvements.clone());
        }
        if !overall.additional.is_empty() {
            additional = additional.initial_value(overall.additional.clone());
        }
    }

    view.input(inputs::STRENGTHS, "Key Strengths", strengths)
        .input(inputs::IMPROVEMENTS, "Areas for Improvement", improvements)
        .optional_input(inputs::ADDITIONAL, "Additional Comments", additional)
}

/// Read-only recap shown before final submission. The Edit button returns to
/// the overall screen so every earlier answer stays reachable through the
/// back chain.
pub fn review_view(state: &WizardState) -> Result<ModalView, RenderError> {
    let subject = state.selected_user.as_deref().unwrap_or("unknown");

    let mut recap = format!(
        "*Strengths:*\n{}\n\n*Areas for Improvement:*\n{}",
        non_empty_or(state.overall.as_ref().map(|overall| overall.strengths.as_str())),
        non_empty_or(state.overall.as_ref().map(|overall| overall.improvements.as_str())),
    );
    if let Some(additional) = state
        .overall
        .as_ref()
        .map(|overall| overall.additional.as_str())
        .filter(|additional| !additional.is_empty())
    {
        recap.push_str("\n\n*Additional Comments:*\n");
        recap.push_str(additional);
    }

    Ok(ViewBuilder::modal(callbacks::REVIEW, "Review Feedback")
        .submit("Submit Feedback")
        .private_metadata(state.to_metadata()?)
        .section("feedback.review.header.v1", |section| {
            section.mrkdwn(format!("*Review your feedback for <@{subject}>*"));
        })
        .divider()
        .section("feedback.review.ratings.v1", |section| {
            for category in Category::ALL {
                section.mrkdwn_field(format!(
                    "*{}:* {}\n{}",
                    category.label(),
                    state.rating_or_median(category).short_label(),
                    notes_or_placeholder(state, category),
                ));
            }
        })
        .section("feedback.review.overall.v1", |section| {
            section.mrkdwn(recap);
        })
        .context("feedback.review.context.v1", |context| {
            context.mrkdwn(
                "This feedback will be posted to the channel where you initiated the command.",
            );
        })
        .actions("feedback.review.nav.v1", |actions| {
            actions.button(
                ButtonElement::new(callbacks::BACK_ACTION, "← Edit Feedback")
                    .value(WizardStep::Overall.number().to_string()),
            );
        })
        .build())
}

/// Shown when a callback arrives with metadata we cannot decode. The run is
/// unrecoverable at that point; the user starts over instead of us guessing
/// defaults.
pub fn error_view() -> ModalView {
    ViewBuilder::modal("feedback.error.v1", "Peer Feedback")
        .close("Close")
        .section("feedback.error.summary.v1", |section| {
            section.mrkdwn(
                ":warning: Something went wrong while processing your feedback. \
                 Close this dialog and start again with `/feedback`.",
            );
        })
        .build()
}

fn scale_option(category: Category, rating: Rating) -> SelectOption {
    let label = category
        .rating_options()
        .iter()
        .find(|option| option.rating == rating)
        .map(|option| option.label)
        .unwrap_or_else(|| rating.detailed_label());
    SelectOption::new(label, rating.value())
}

fn non_empty_or(value: Option<&str>) -> &str {
    match value {
        Some(text) if !text.is_empty() => text,
        _ => "_Not provided_",
    }
}

fn notes_or_placeholder(state: &WizardState, category: Category) -> String {
    let placeholder = match category {
        Category::Skills => "_No growth areas specified_",
        Category::Performance | Category::Collaboration => "_No comments_",
    };
    state
        .category(category)
        .map(|feedback| feedback.comments.as_str())
        .filter(|comments| !comments.is_empty())
        .unwrap_or(placeholder)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use peerly_core::catalog::Rating;
    use peerly_core::wizard::{CategoryFeedback, OverallFeedback, WizardState, WizardStep};

    use super::{
        callbacks, error_view, review_view, step_view, subject_select_view, view_for, Block,
        InputElement, ModalView, RenderError, TextObject,
    };

    fn mid_run_state() -> WizardState {
        WizardState {
            channel_id: "C042".to_string(),
            user_id: "U100".to_string(),
            selected_user: Some("U123".to_string()),
            step: WizardStep::RatingPerformance,
            performance: None,
            collaboration: None,
            skills: None,
            overall: None,
        }
    }

    fn input_block<'a>(view: &'a ModalView, block_id: &str) -> Option<&'a Block> {
        view.blocks.iter().find(
            |block| matches!(block, Block::Input { block_id: id, .. } if id == block_id),
        )
    }

    fn header_text(view: &ModalView) -> Option<&str> {
        view.blocks.iter().find_map(|block| match block {
            Block::Section { text: Some(TextObject::Mrkdwn { text }), .. } => Some(text.as_str()),
            _ => None,
        })
    }

    fn back_button(view: &ModalView) -> Option<(&str, &str)> {
        view.blocks.iter().find_map(|block| match block {
            Block::Actions { elements, .. } => elements
                .iter()
                .find(|element| element.action_id == callbacks::BACK_ACTION)
                .and_then(|element| {
                    let label = match &element.text {
                        TextObject::Plain { text } => text.as_str(),
                        TextObject::Mrkdwn { text } => text.as_str(),
                    };
                    element.value.as_deref().map(|value| (label, value))
                }),
            _ => None,
        })
    }

    #[test]
    fn subject_screen_round_trips_state_through_metadata() {
        let state = WizardState::begin("C042", "U100");
        let view = subject_select_view(&state).expect("subject screen renders");

        assert_eq!(view.callback_id, callbacks::SUBJECT);
        assert!(matches!(&view.submit, Some(TextObject::Plain { text }) if text == "Next"));
        assert!(input_block(&view, "user_select").is_some(), "expected the user select input");

        let decoded =
            WizardState::from_metadata(&view.private_metadata).expect("metadata decodes");
        assert_eq!(decoded, state);
    }

    #[test]
    fn subject_screen_prefills_the_previous_choice() {
        let mut state = mid_run_state();
        state.step = WizardStep::SelectingSubject;
        let view = subject_select_view(&state).expect("subject screen renders");

        let element = match input_block(&view, "user_select") {
            Some(Block::Input { element: InputElement::UsersSelect(select), .. }) => Some(select),
            _ => None,
        };
        let select = element.expect("users select present");
        assert_eq!(select.initial_user.as_deref(), Some("U123"));
    }

    #[test]
    fn performance_screen_uses_the_original_copy() {
        let view =
            step_view(WizardStep::RatingPerformance, &mid_run_state()).expect("screen renders");

        assert_eq!(view.callback_id, "feedback.step.2.v1");
        assert!(matches!(&view.title, TextObject::Plain { text } if text == "Performance"));
        let header = header_text(&view).expect("header section present");
        assert!(header.contains("*Feedback for <@U123>*"));
        assert!(header.contains("Step 1 of 4: Performance Evaluation"));

        assert!(input_block(&view, "performance_rating").is_some());
        assert!(matches!(
            input_block(&view, "performance_comments"),
            Some(Block::Input { optional: true, .. })
        ));
        assert_eq!(back_button(&view), Some(("← Change User", "1")));
    }

    #[test]
    fn rating_options_carry_category_phrasing_over_shared_values() {
        let view =
            step_view(WizardStep::RatingCollaboration, &mid_run_state()).expect("screen renders");

        let select = match input_block(&view, "collaboration_rating") {
            Some(Block::Input { element: InputElement::StaticSelect(select), .. }) => Some(select),
            _ => None,
        };
        let select = select.expect("rating select present");
        assert_eq!(select.options.len(), 5);
        assert!(matches!(
            &select.options[0].text,
            TextObject::Plain { text } if text == "Excellent Team Player"
        ));
        assert_eq!(select.options[0].value, "5");
        assert_eq!(select.options[4].value, "1");
        assert_eq!(back_button(&view), Some(("← Back", "2")));
    }

    #[test]
    fn skills_screen_collects_growth_areas() {
        let view = step_view(WizardStep::RatingSkills, &mid_run_state()).expect("screen renders");

        let header = header_text(&view).expect("header section present");
        assert!(header.contains("Step 3 of 4: Skills & Growth"));
        assert!(matches!(
            input_block(&view, "growth_areas"),
            Some(Block::Input { optional: true, .. })
        ));
        assert_eq!(back_button(&view), Some(("← Back", "3")));
    }

    #[test]
    fn revisited_rating_screen_restores_the_earlier_answer() {
        let mut state = mid_run_state();
        state.performance = Some(CategoryFeedback {
            rating: Rating::Exceptional,
            comments: "Great work".to_string(),
        });

        let view = step_view(WizardStep::RatingPerformance, &state).expect("screen renders");
        let select = match input_block(&view, "performance_rating") {
            Some(Block::Input { element: InputElement::StaticSelect(select), .. }) => Some(select),
            _ => None,
        };
        let initial = select
            .expect("rating select present")
            .initial_option
            .as_ref()
            .expect("earlier rating preselected");
        assert_eq!(initial.value, "5");
        assert!(matches!(&initial.text, TextObject::Plain { text } if text == "Exceeds Expectations"));

        let notes = match input_block(&view, "performance_comments") {
            Some(Block::Input { element: InputElement::PlainTextInput(input), .. }) => Some(input),
            _ => None,
        };
        assert_eq!(
            notes.expect("notes input present").initial_value.as_deref(),
            Some("Great work")
        );
    }

    #[test]
    fn overall_screen_submits_to_review_and_prefills_captured_text() {
        let mut state = mid_run_state();
        state.step = WizardStep::Overall;
        state.overall = Some(OverallFeedback {
            strengths: "Leads well".to_string(),
            improvements: "Delegation".to_string(),
            additional: String::new(),
        });

        let view = step_view(WizardStep::Overall, &state).expect("screen renders");
        assert!(
            matches!(&view.submit, Some(TextObject::Plain { text }) if text == "Review"),
            "final input screen submits to review"
        );
        assert!(matches!(
            input_block(&view, "strengths"),
            Some(Block::Input { optional: false, .. })
        ));
        assert!(matches!(
            input_block(&view, "improvements"),
            Some(Block::Input { optional: false, .. })
        ));
        assert!(matches!(
            input_block(&view, "additional"),
            Some(Block::Input { optional: true, .. })
        ));

        let strengths = match input_block(&view, "strengths") {
            Some(Block::Input { element: InputElement::PlainTextInput(input), .. }) => Some(input),
            _ => None,
        };
        assert_eq!(
            strengths.expect("strengths input present").initial_value.as_deref(),
            Some("Leads well")
        );
        assert_eq!(back_button(&view), Some(("← Back", "4")));
    }

    #[test]
    fn only_input_screens_render_as_steps() {
        let mut state = mid_run_state();
        state.step = WizardStep::SelectingSubject;
        assert_eq!(
            step_view(WizardStep::SelectingSubject, &state).expect_err("subject is not a step"),
            RenderError::InvalidStep(WizardStep::SelectingSubject)
        );
        assert_eq!(
            step_view(WizardStep::Review, &state).expect_err("review is not a step"),
            RenderError::InvalidStep(WizardStep::Review)
        );
    }

    #[test]
    fn review_screen_recaps_ratings_and_falls_back_to_placeholders() {
        let mut state = mid_run_state();
        state.step = WizardStep::Review;
        state.performance = Some(CategoryFeedback {
            rating: Rating::Exceptional,
            comments: "Great work".to_string(),
        });
        state.collaboration =
            Some(CategoryFeedback { rating: Rating::AboveAverage, comments: String::new() });
        state.overall = Some(OverallFeedback {
            strengths: "Leads well".to_string(),
            improvements: "Delegation".to_string(),
            additional: "Mentors juniors".to_string(),
        });

        let view = review_view(&state).expect("review renders");
        assert_eq!(view.callback_id, callbacks::REVIEW);
        assert!(
            matches!(&view.submit, Some(TextObject::Plain { text }) if text == "Submit Feedback")
        );

        let fields = view.blocks.iter().find_map(|block| match block {
            Block::Section { fields, .. } if !fields.is_empty() => Some(fields),
            _ => None,
        });
        let fields = fields.expect("ratings recap present");
        assert_eq!(fields.len(), 3);
        assert!(
            matches!(&fields[0], TextObject::Mrkdwn { text } if text.contains("*Performance:* ⭐⭐⭐⭐⭐") && text.contains("Great work"))
        );
        assert!(
            matches!(&fields[1], TextObject::Mrkdwn { text } if text.contains("_No comments_"))
        );
        // Skills never rated: median stars plus its placeholder.
        assert!(
            matches!(&fields[2], TextObject::Mrkdwn { text } if text.contains("*Skills:* ⭐⭐⭐") && text.contains("_No growth areas specified_"))
        );

        let recap = view.blocks.iter().find_map(|block| match block {
            Block::Section { text: Some(TextObject::Mrkdwn { text }), .. }
                if text.contains("*Strengths:*") =>
            {
                Some(text)
            }
            _ => None,
        });
        let recap = recap.expect("overall recap present");
        assert!(recap.contains("*Areas for Improvement:*\nDelegation"));
        assert!(recap.contains("*Additional Comments:*\nMentors juniors"));

        assert_eq!(back_button(&view), Some(("← Edit Feedback", "5")));
    }

    #[test]
    fn review_screen_omits_the_additional_heading_when_blank() {
        let mut state = mid_run_state();
        state.step = WizardStep::Review;
        state.overall = Some(OverallFeedback {
            strengths: "Leads well".to_string(),
            improvements: "Delegation".to_string(),
            additional: String::new(),
        });

        let view = review_view(&state).expect("review renders");
        let recap = view.blocks.iter().find_map(|block| match block {
            Block::Section { text: Some(TextObject::Mrkdwn { text }), .. }
                if text.contains("*Strengths:*") =>
            {
                Some(text)
            }
            _ => None,
        });
        assert!(!recap.expect("overall recap present").contains("*Additional Comments:*"));
    }

    #[test]
    fn every_step_maps_to_its_screen() {
        let mut state = mid_run_state();
        for (step, callback_id) in [
            (WizardStep::SelectingSubject, callbacks::SUBJECT.to_string()),
            (WizardStep::RatingPerformance, "feedback.step.2.v1".to_string()),
            (WizardStep::RatingCollaboration, "feedback.step.3.v1".to_string()),
            (WizardStep::RatingSkills, "feedback.step.4.v1".to_string()),
            (WizardStep::Overall, "feedback.step.5.v1".to_string()),
            (WizardStep::Review, callbacks::REVIEW.to_string()),
        ] {
            state.step = step;
            let view = view_for(&state).expect("screen renders");
            assert_eq!(view.callback_id, callback_id);

            let decoded =
                WizardState::from_metadata(&view.private_metadata).expect("metadata decodes");
            assert_eq!(decoded, state, "metadata must round-trip the full run");
        }
    }

    #[test]
    fn error_screen_offers_no_submit() {
        let view = error_view();
        assert_eq!(view.callback_id, "feedback.error.v1");
        assert!(view.submit.is_none());
        assert!(matches!(&view.close, TextObject::Plain { text } if text == "Close"));
    }
}
