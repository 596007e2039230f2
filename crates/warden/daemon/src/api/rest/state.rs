//! Shared API state

use std::sync::Arc;
use warden_service::GovernanceService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<GovernanceService>,
}
