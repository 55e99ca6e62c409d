//! Orchestration loop
//!
//! A run alternates between one completion request and sequential dispatch
//! of the tool calls in the response, until the model stops, the iteration
//! ceiling is reached, or a fatal error escapes.

pub mod prompt;
mod runner;
mod state;

pub use prompt::FeatureRequest;
pub use runner::{AgentSettings, FeatureAgent, abort_run};
pub use state::{RunReport, RunState, RunStatus};
