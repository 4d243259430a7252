//! Update controller: check policy, update flow and install-state listener

mod controller;
mod state;

#[cfg(test)]
mod tests;

pub use controller::UpdateController;
pub use state::{UpdateCheckResult, UpdateFlowState, UpdatePhase, UpdateQuery};
