//! Bridge state (Model in TEA pattern)

use std::sync::Arc;

use playbridge_vendor::IdentityPlatform;

use crate::app_update::UpdateController;
use crate::config::BridgeSettings;
use crate::router::ResultRouter;
use crate::session::SessionController;

/// Everything mutated on the serialized context
#[derive(Debug)]
pub struct BridgeState<I> {
    pub session: SessionController<I>,
    pub updates: UpdateController,
    pub router: ResultRouter,
}

impl<I: IdentityPlatform> BridgeState<I> {
    pub fn new(identity: Arc<I>, settings: &BridgeSettings) -> Self {
        let report_failures = settings.events.report_failures;
        Self {
            session: SessionController::new(identity, report_failures),
            updates: UpdateController::new(report_failures),
            router: ResultRouter::new(),
        }
    }
}
