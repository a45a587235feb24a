//! Stepper core: pure wizard state machine, URL codec and view-model helpers.
mod effect;
mod msg;
pub mod query;
mod state;
mod sync;
pub mod tables;
mod update;
mod view_model;

pub use effect::{CompletionRequest, Effect, Watch};
pub use msg::Action;
pub use query::{ConfigError, ParsedUrlState};
pub use state::{ExportJob, GitHubRepository, Phase, TaskId, UnknownPhase, WizardState};
pub use sync::{sync_target, url_needs_change};
pub use update::update;
pub use view_model::{ExportPanel, ImportPanel, StepperView};
