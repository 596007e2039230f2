//! Background approval sweeper.
//!
//! The sweep is advisory: reads resolve overdue requests lazily, so a stalled
//! sweeper never changes outcomes, only how quickly they become visible.

use std::sync::Arc;
use std::time::Duration;
use warden_service::GovernanceService;

pub async fn run(service: Arc<GovernanceService>, interval_secs: u64) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    loop {
        ticker.tick().await;
        match service.sweep_approvals() {
            Ok(0) => {}
            Ok(swept) => tracing::info!(swept, "timed out overdue approval requests"),
            Err(err) => tracing::error!(%err, "approval sweep failed"),
        }
    }
}
