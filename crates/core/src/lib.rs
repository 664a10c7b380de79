pub mod catalog;
pub mod config;
pub mod wizard;

pub use catalog::{CatalogError, Category, Rating, RatingOption};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use wizard::collect::{collect, inputs, CollectError, SubmittedValues};
pub use wizard::machine::{Disposition, WizardEvent, WizardOutcome};
pub use wizard::state::{CategoryFeedback, OverallFeedback, StateError, WizardState, WizardStep};
