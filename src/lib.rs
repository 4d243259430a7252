//! Play Bridge
//!
//! Headless front end for the Play Games identity and in-app update bridge:
//! replays scripted host sessions against the vendor simulator and prints
//! the events the host would observe.

pub mod headless;

pub use headless::runner::{run_scenario, run_scenario_with};
pub use headless::scenario::{Scenario, Step};
pub use headless::{catalogue, run_headless, CatalogueEntry, HeadlessEvent};
