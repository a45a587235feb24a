use stepper_core::query::parse_url;
use stepper_core::tables::tables_to_export;
use stepper_core::{sync_target, update, Action, ConfigError, GitHubRepository, WizardState};
use stepper_engine::EngineEvent;
use stepper_logging::{stepper_debug, stepper_info, stepper_warn};
use url::Url;

use crate::effects::{action_for_event, EffectExecutor};
use crate::location::Location;

/// Owns the wizard state and keeps it in step with the address bar.
///
/// The state is only ever changed through [`Stepper::dispatch`]; the location
/// is only ever written by the URL sync that follows each dispatch.
pub struct Stepper<L, E> {
    state: WizardState,
    location: L,
    executor: E,
}

impl<L: Location, E: EffectExecutor> Stepper<L, E> {
    pub fn new(location: L, executor: E) -> Self {
        Self {
            state: WizardState::uninitialized(),
            location,
            executor,
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn location(&self) -> &L {
        &self.location
    }

    /// Seeds state from the current URL. Called on load and after every
    /// external URL change.
    pub fn load(&mut self) -> Result<(), ConfigError> {
        let parsed = parse_url(self.location.current())?;
        self.dispatch(Action::InitializeFromUrl(parsed));
        Ok(())
    }

    /// Follows a link. A link that does not parse is rejected before it
    /// reaches the history.
    pub fn navigate(&mut self, url: Url) -> Result<(), ConfigError> {
        let parsed = parse_url(&url)?;
        self.location.push(url);
        self.dispatch(Action::InitializeFromUrl(parsed));
        Ok(())
    }

    /// Returns `Ok(false)` when there was nothing to go back to.
    pub fn back(&mut self) -> Result<bool, ConfigError> {
        if !self.location.back() {
            return Ok(false);
        }
        self.load()?;
        Ok(true)
    }

    pub fn forward(&mut self) -> Result<bool, ConfigError> {
        if !self.location.forward() {
            return Ok(false);
        }
        self.load()?;
        Ok(true)
    }

    pub fn dispatch(&mut self, action: Action) {
        stepper_debug!("dispatch {:?}", action);
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, action);
        self.state = state;
        for effect in effects {
            self.executor.execute(effect);
        }
        self.sync_url();
    }

    pub fn handle_engine_event(&mut self, event: EngineEvent) {
        if let Some(action) = action_for_event(event, &self.state) {
            self.dispatch(action);
        }
    }

    pub fn request_import(&self, repository: &GitHubRepository) {
        self.executor.start_import(repository);
    }

    /// Asks the backend to export the imported tables. Returns `false` when
    /// there is no destination repository yet.
    pub fn request_export(&self) -> bool {
        let destination = self
            .state
            .destination_namespace()
            .zip(self.state.destination_repository());
        let Some((namespace, repository)) = destination else {
            stepper_warn!("export requested without a destination repository");
            return false;
        };
        self.executor
            .start_export(tables_to_export(namespace, repository));
        true
    }

    fn sync_url(&mut self) {
        if let Some(next) = sync_target(&self.state, self.location.current()) {
            stepper_info!("replace url {}", next);
            self.location.replace(next);
        }
    }
}
