//! Update service seam: availability check, update flow, install-state listener

use serde::{Deserialize, Serialize};

use playbridge_core::prelude::*;
use playbridge_core::UpdateMode;

/// Availability reported by the update service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateAvailability {
    #[default]
    Unknown,
    NotAvailable,
    Available,
    /// An update flow started earlier is still running
    DeveloperTriggeredInProgress,
}

/// Install status of a (flexible) update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallStatus {
    #[default]
    Unknown,
    Pending,
    Downloading,
    Downloaded,
    Installing,
    Installed,
    Failed,
    Canceled,
}

/// Result of an update-info query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppUpdateInfo {
    pub package_name: String,
    #[serde(default)]
    pub availability: UpdateAvailability,
    #[serde(default)]
    pub install_status: InstallStatus,
    #[serde(default)]
    pub available_version_code: i64,
    /// Days since the update became available to this client
    #[serde(default)]
    pub staleness_days: Option<i32>,
    #[serde(default)]
    pub immediate_allowed: bool,
    #[serde(default)]
    pub flexible_allowed: bool,
}

impl AppUpdateInfo {
    pub fn is_update_available(&self) -> bool {
        self.availability == UpdateAvailability::Available
    }

    pub fn is_update_type_allowed(&self, mode: UpdateMode) -> bool {
        match mode {
            UpdateMode::Immediate => self.immediate_allowed,
            UpdateMode::Flexible => self.flexible_allowed,
        }
    }
}

/// Options for launching the update flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    pub mode: UpdateMode,
    pub allow_asset_pack_deletion: bool,
}

/// Install progress pushed to registered listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallState {
    pub status: InstallStatus,
    #[serde(default)]
    pub bytes_downloaded: i64,
    #[serde(default)]
    pub total_bytes_to_download: i64,
}

impl InstallState {
    pub fn new(status: InstallStatus) -> Self {
        Self {
            status,
            bytes_downloaded: 0,
            total_bytes_to_download: 0,
        }
    }
}

/// Callback invoked by the vendor, possibly from a background thread
pub type InstallListener = Box<dyn Fn(InstallState) + Send + Sync>;

/// Registration token returned by [`LocalUpdatePlatform::register_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Update service operations
#[trait_variant::make(UpdatePlatform: Send)]
pub trait LocalUpdatePlatform {
    async fn app_update_info(&self) -> Result<AppUpdateInfo>;

    /// Hand the update flow to the vendor, which reports back under `request_code`
    fn start_update_flow(
        &self,
        info: &AppUpdateInfo,
        options: UpdateOptions,
        request_code: i32,
    ) -> Result<()>;

    fn register_listener(&self, listener: InstallListener) -> ListenerId;

    fn unregister_listener(&self, id: ListenerId);

    /// Install a downloaded flexible update and restart the app
    async fn complete_update(&self) -> Result<()>;
}
