//! Store health checks.

use tracing::{debug, error};

use crate::RoomStore;

/// Check store connection health.
pub async fn check_connection(store: &dyn RoomStore) -> bool {
    match store.ping().await {
        Ok(()) => {
            debug!("Store connection healthy");
            true
        }
        Err(e) => {
            error!("Store health check failed: {}", e);
            false
        }
    }
}
