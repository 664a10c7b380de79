use std::collections::BTreeMap;

use thiserror::Error;

use crate::catalog::{CatalogError, Rating};
use crate::wizard::state::{CategoryFeedback, OverallFeedback, WizardState, WizardStep};

/// Block ids shared between the renderers and the collector, beyond the
/// per-category ids on [`crate::catalog::Category`].
pub mod inputs {
    pub const SUBJECT: &str = "user_select";
    pub const STRENGTHS: &str = "strengths";
    pub const IMPROVEMENTS: &str = "improvements";
    pub const ADDITIONAL: &str = "additional";
}

/// Flat input-id to value map extracted from one modal submission. The
/// transport flattens the platform's nested block structure before handing
/// values to the core.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmittedValues {
    values: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CollectError {
    #[error("required input `{input_id}` is missing from the submission")]
    MissingRequiredInput { input_id: String },
    #[error(transparent)]
    Rating(#[from] CatalogError),
    #[error("step {0:?} does not collect submitted values")]
    InvalidStep(WizardStep),
}

impl SubmittedValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, input_id: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(input_id, value);
        self
    }

    pub fn insert(&mut self, input_id: impl Into<String>, value: impl Into<String>) {
        self.values.insert(input_id.into(), value.into());
    }

    /// Value of an input the renderer marked required. The platform rejects
    /// submissions with these blank, so absence here means the transport
    /// misbehaved; blank content is not second-guessed.
    pub fn required(&self, input_id: &str) -> Result<&str, CollectError> {
        self.values
            .get(input_id)
            .map(String::as_str)
            .ok_or_else(|| CollectError::MissingRequiredInput { input_id: input_id.to_string() })
    }

    /// Value of an optional input, defaulting to empty when left blank or
    /// omitted entirely.
    pub fn optional(&self, input_id: &str) -> &str {
        self.values.get(input_id).map(String::as_str).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, String)> for SubmittedValues {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}

/// Writes one screen's submitted values into its slot of the state. Only the
/// slot owned by `step` is touched; every other field is preserved verbatim,
/// which is what makes back navigation lossless. Valid for steps 2..5.
pub fn collect(
    step: WizardStep,
    values: &SubmittedValues,
    state: &mut WizardState,
) -> Result<(), CollectError> {
    if let Some(category) = step.category() {
        let rating = Rating::from_value(values.required(category.rating_input_id())?)?;
        let comments = values.optional(category.notes_input_id()).to_string();
        *state.category_slot(category) = Some(CategoryFeedback { rating, comments });
        return Ok(());
    }

    match step {
        WizardStep::Overall => {
            let strengths = values.required(inputs::STRENGTHS)?.to_string();
            let improvements = values.required(inputs::IMPROVEMENTS)?.to_string();
            let additional = values.optional(inputs::ADDITIONAL).to_string();
            state.overall = Some(OverallFeedback { strengths, improvements, additional });
            Ok(())
        }
        other => Err(CollectError::InvalidStep(other)),
    }
}
