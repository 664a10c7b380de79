pub mod collect;
pub mod machine;
pub mod state;

pub use collect::{collect, inputs, CollectError, SubmittedValues};
pub use machine::{apply, Disposition, WizardEvent, WizardOutcome};
pub use state::{CategoryFeedback, OverallFeedback, StateError, WizardState, WizardStep};
