//! Stepper app: drives the wizard state machine against the backend and
//! keeps the address bar in step with it.
mod app;
pub mod config;
pub mod effects;
pub mod location;
pub mod logging;
mod stepper;
pub mod ui;

pub use app::run_app;
pub use stepper::Stepper;

pub enum AppMsg {
    /// One line typed at the prompt.
    Input(String),
    InputClosed,
    Engine(stepper_engine::EngineEvent),
}
