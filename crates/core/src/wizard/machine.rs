use crate::wizard::collect::{collect, inputs, CollectError, SubmittedValues};
use crate::wizard::state::{WizardState, WizardStep};

/// One classified callback aimed at the wizard. Unrecognized callbacks never
/// become events; the transport layer drops them as no-ops.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WizardEvent {
    /// The screen for `step` was submitted with `values`.
    Submitted { step: WizardStep, values: SubmittedValues },
    /// A back button asked to return to `target`. Never collects.
    Back { target: WizardStep },
    /// The review screen was confirmed.
    Confirmed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// Render the screen for the new state and keep the wizard open.
    Continue,
    /// The run is complete: close the dialog and post the summary.
    Submitted,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WizardOutcome {
    pub state: WizardState,
    pub disposition: Disposition,
}

/// Pure transition function. The caller reconstructs `state` from the blob
/// the callback carried, applies exactly one event, and serializes the
/// returned state into the next screen. Nothing here is retained between
/// calls, so concurrent or duplicated callbacks each get a consistent
/// transition from whatever state they carried.
pub fn apply(event: WizardEvent, mut state: WizardState) -> Result<WizardOutcome, CollectError> {
    match event {
        WizardEvent::Submitted { step: WizardStep::SelectingSubject, values } => {
            // Re-selection after progressing replaces the subject and nothing
            // else; ratings already collected stay attached to the run.
            state.selected_user = Some(values.required(inputs::SUBJECT)?.to_string());
            state.step = WizardStep::RatingPerformance;
        }
        WizardEvent::Submitted { step: WizardStep::Review, .. } => {
            return Err(CollectError::InvalidStep(WizardStep::Review));
        }
        WizardEvent::Submitted { step, values } => {
            collect(step, &values, &mut state)?;
            state.step = step.next();
        }
        WizardEvent::Back { target } => {
            state.step = target;
        }
        WizardEvent::Confirmed => {
            return Ok(WizardOutcome { state, disposition: Disposition::Submitted });
        }
    }

    Ok(WizardOutcome { state, disposition: Disposition::Continue })
}
