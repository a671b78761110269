//! Mock implementations for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use room_core::{Error, Result, SessionToken};
use state_store::{AdmitRequest, MemoryStore, Occupancy, RoomStore};
use std::sync::Arc;
use std::time::Duration;

/// Store that can be switched into an outage.
///
/// Delegates to a [`MemoryStore`] while healthy, and fails every call with
/// `StoreUnavailable` while failing, the way an unreachable Redis would.
#[derive(Clone)]
pub struct FailingStore {
    inner: Arc<MemoryStore>,
    should_fail: Arc<Mutex<bool>>,
}

impl FailingStore {
    /// Starts out failing.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryStore::new()),
            should_fail: Arc::new(Mutex::new(true)),
        }
    }

    /// Toggle the outage.
    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    fn check(&self) -> Result<()> {
        if *self.should_fail.lock() {
            return Err(Error::store("Mock store outage"));
        }
        Ok(())
    }
}

impl Default for FailingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomStore for FailingStore {
    async fn try_admit(&self, token: &SessionToken, request: AdmitRequest) -> Result<bool> {
        self.check()?;
        self.inner.try_admit(token, request).await
    }

    async fn refresh_active(
        &self,
        token: &SessionToken,
        active_ttl: Duration,
        now_ms: i64,
    ) -> Result<bool> {
        self.check()?;
        self.inner.refresh_active(token, active_ttl, now_ms).await
    }

    async fn enqueue(
        &self,
        token: &SessionToken,
        queue_ttl: Duration,
        now_ms: i64,
    ) -> Result<Option<u64>> {
        self.check()?;
        self.inner.enqueue(token, queue_ttl, now_ms).await
    }

    async fn queue_position(
        &self,
        token: &SessionToken,
        queue_ttl: Duration,
        now_ms: i64,
    ) -> Result<Option<u64>> {
        self.check()?;
        self.inner.queue_position(token, queue_ttl, now_ms).await
    }

    async fn promote_up_to(&self, limit: u64, request: AdmitRequest) -> Result<Vec<SessionToken>> {
        self.check()?;
        self.inner.promote_up_to(limit, request).await
    }

    async fn occupancy(&self, now_ms: i64) -> Result<Occupancy> {
        self.check()?;
        self.inner.occupancy(now_ms).await
    }

    async fn ping(&self) -> Result<()> {
        self.check()?;
        self.inner.ping().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failing_store_recovers() {
        let store = FailingStore::new();
        assert!(store.ping().await.unwrap_err().is_store_unavailable());

        store.set_should_fail(false);
        store.ping().await.unwrap();
    }
}
