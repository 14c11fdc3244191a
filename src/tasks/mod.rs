//! Background scheduled tasks.
//!
//! Call `spawn_all` once during startup.

use crate::services::PendingRegistrationService;
use std::time::Duration;

/// Spawn all background tasks. Detaches via `tokio::spawn`; does not block.
pub fn spawn_all(pending_service: PendingRegistrationService, purge_interval: Duration) {
    // Expired pending registrations are also removed lazily on verify;
    // this sweep covers the ones nobody comes back for.
    tokio::spawn(async move {
        loop {
            match pending_service.purge_expired().await {
                Ok(n) if n > 0 => log::info!("Expired pending registrations purged: {n}"),
                Ok(_) => {}
                Err(e) => log::error!("Failed to purge expired pending registrations: {e:?}"),
            }
            tokio::time::sleep(purge_interval).await;
        }
    });
}
