use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{Category, Rating};

/// Wizard screens in visit order. The blob stores the step as its number, so
/// the numbering is a wire constant: 1 = subject selection, 2..4 = rated
/// categories, 5 = free-form feedback, 6 = review.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum WizardStep {
    SelectingSubject,
    RatingPerformance,
    RatingCollaboration,
    RatingSkills,
    Overall,
    Review,
}

impl From<WizardStep> for u8 {
    fn from(step: WizardStep) -> Self {
        match step {
            WizardStep::SelectingSubject => 1,
            WizardStep::RatingPerformance => 2,
            WizardStep::RatingCollaboration => 3,
            WizardStep::RatingSkills => 4,
            WizardStep::Overall => 5,
            WizardStep::Review => 6,
        }
    }
}

impl TryFrom<u8> for WizardStep {
    type Error = StateError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::SelectingSubject),
            2 => Ok(Self::RatingPerformance),
            3 => Ok(Self::RatingCollaboration),
            4 => Ok(Self::RatingSkills),
            5 => Ok(Self::Overall),
            6 => Ok(Self::Review),
            other => Err(StateError::Malformed(format!("step {other} is outside the wizard"))),
        }
    }
}

impl WizardStep {
    pub fn number(self) -> u8 {
        u8::from(self)
    }

    /// Screen shown after this one is submitted. Review has no successor;
    /// confirmation leaves the wizard instead.
    pub fn next(self) -> WizardStep {
        match self {
            Self::SelectingSubject => Self::RatingPerformance,
            Self::RatingPerformance => Self::RatingCollaboration,
            Self::RatingCollaboration => Self::RatingSkills,
            Self::RatingSkills => Self::Overall,
            Self::Overall | Self::Review => Self::Review,
        }
    }

    /// Back-button target: the screen visited right before this one.
    pub fn previous(self) -> Option<WizardStep> {
        match self {
            Self::SelectingSubject => None,
            Self::RatingPerformance => Some(Self::SelectingSubject),
            Self::RatingCollaboration => Some(Self::RatingPerformance),
            Self::RatingSkills => Some(Self::RatingCollaboration),
            Self::Overall => Some(Self::RatingSkills),
            Self::Review => Some(Self::Overall),
        }
    }

    /// The rated category collected on this screen, if any.
    pub fn category(self) -> Option<Category> {
        match self {
            Self::RatingPerformance => Some(Category::Performance),
            Self::RatingCollaboration => Some(Category::Collaboration),
            Self::RatingSkills => Some(Category::Skills),
            _ => None,
        }
    }

    /// 1-based position among the four input screens, for "Step N of 4"
    /// headers. Subject selection and review are unnumbered.
    pub fn position(self) -> Option<u8> {
        match self {
            Self::RatingPerformance => Some(1),
            Self::RatingCollaboration => Some(2),
            Self::RatingSkills => Some(3),
            Self::Overall => Some(4),
            Self::SelectingSubject | Self::Review => None,
        }
    }
}

/// Rating plus free-text notes for one rated category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFeedback {
    pub rating: Rating,
    #[serde(default)]
    pub comments: String,
}

/// Free-form fields from the final input screen. `additional` is optional on
/// the screen and defaults to empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallFeedback {
    pub strengths: String,
    pub improvements: String,
    #[serde(default)]
    pub additional: String,
}

/// Complete progress of one wizard run. This is the only persisted entity:
/// it round-trips through the modal's `private_metadata` on every callback
/// and nothing else survives between callbacks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardState {
    pub channel_id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_user: Option<String>,
    pub step: WizardStep,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<CategoryFeedback>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collaboration: Option<CategoryFeedback>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<CategoryFeedback>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall: Option<OverallFeedback>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("wizard state metadata failed to parse: {0}")]
    Malformed(String),
    #[error("wizard state could not be encoded: {0}")]
    Encode(String),
}

impl WizardState {
    /// Fresh run started from a slash command in `channel_id` by `user_id`.
    pub fn begin(channel_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            user_id: user_id.into(),
            selected_user: None,
            step: WizardStep::SelectingSubject,
            performance: None,
            collaboration: None,
            skills: None,
            overall: None,
        }
    }

    /// Reconstructs a run from the opaque blob carried by the transport. A
    /// blob that does not parse is unrecoverable; callers show a generic
    /// failure screen rather than guessing defaults.
    pub fn from_metadata(blob: &str) -> Result<Self, StateError> {
        serde_json::from_str(blob).map_err(|source| StateError::Malformed(source.to_string()))
    }

    pub fn to_metadata(&self) -> Result<String, StateError> {
        serde_json::to_string(self).map_err(|source| StateError::Encode(source.to_string()))
    }

    pub fn category(&self, category: Category) -> Option<&CategoryFeedback> {
        match category {
            Category::Performance => self.performance.as_ref(),
            Category::Collaboration => self.collaboration.as_ref(),
            Category::Skills => self.skills.as_ref(),
        }
    }

    pub(crate) fn category_slot(&mut self, category: Category) -> &mut Option<CategoryFeedback> {
        match category {
            Category::Performance => &mut self.performance,
            Category::Collaboration => &mut self.collaboration,
            Category::Skills => &mut self.skills,
        }
    }

    /// Rating displayed for a category: the recorded one, or the scale median
    /// when the step was never completed.
    pub fn rating_or_median(&self, category: Category) -> Rating {
        self.category(category).map(|feedback| feedback.rating).unwrap_or_else(Rating::median)
    }
}
