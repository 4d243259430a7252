//! playbridge-vendor - Vendor service seams for Play Bridge
//!
//! The identity and update SDKs are external collaborators: this crate only
//! describes their surface. Controllers in `playbridge-app` talk to these
//! traits; a real host wires them to the platform SDK, tests and the
//! headless runner wire them to [`sim`].
//!
//! - [`IdentityPlatform`]: sign-in, achievements, leaderboards, player, capture
//! - [`UpdatePlatform`]: update-info query, update flow, install-state listener
//! - [`HostActivity`]: launching foreground flows under a request code

pub mod host;
pub mod identity;
pub mod sim;
pub mod updates;

pub use host::{
    ActivityPayload, HostActivity, Intent, Resolution, RESULT_CANCELED, RESULT_IN_APP_UPDATE_FAILED,
    RESULT_OK,
};
pub use identity::{
    Account, ClientHandle, ClientKind, GameClients, IdentityPlatform, LeaderboardScore,
    LocalIdentityPlatform, Player, SignInFailure, SignInOutcome,
};
pub use updates::{
    AppUpdateInfo, InstallListener, InstallState, InstallStatus, ListenerId, LocalUpdatePlatform,
    UpdateAvailability, UpdateOptions, UpdatePlatform,
};
