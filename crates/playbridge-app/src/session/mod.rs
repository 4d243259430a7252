//! Session controller: sign-in lifecycle, game clients and player profile

mod controller;
mod state;

#[cfg(test)]
mod tests;

pub use controller::SessionController;
pub use state::{SessionPhase, SessionState};
