//! # playbridge-core - Core Domain Types
//!
//! Foundation crate for Play Bridge. Provides the domain records handed to the
//! host, the closed catalogue of outbound events, error handling and logging.
//!
//! This crate has **zero internal dependencies** -- it only depends on external
//! crates (serde, thiserror, toml, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`PlayerProfile`] - Signed-in player details
//! - [`ScoreRecord`] - One leaderboard entry as seen by the host
//! - [`UpdateOffer`], [`UpdateMode`] - An update the host can act on
//! - [`RequestCode`] - Reserved codes correlating foreground flows with results
//!
//! ### Events (`events`)
//! - [`BridgeEvent`] - Every event the host can observe
//! - [`PayloadShape`] - Declared payload shape per event name
//!
//! ### Error Handling (`error`)
//! - [`Error`] - Custom error enum grouped by layer
//! - [`Result`] - Type alias for `std::result::Result<T, Error>`
//! - [`ResultExt`] - Extension trait that logs an error with context
//!
//! ## Prelude
//!
//! ```rust
//! use playbridge_core::prelude::*;
//! ```

pub mod error;
pub mod events;
pub mod logging;
pub mod types;

/// Prelude for common imports used throughout all Play Bridge crates
pub mod prelude {
    pub use super::error::{Error, Result, ResultExt};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

pub use error::{Error, Result, ResultExt};
pub use events::{BridgeEvent, OperationFailure, PayloadShape};
pub use types::{PlayerProfile, RequestCode, ScoreRecord, UpdateMode, UpdateOffer};
