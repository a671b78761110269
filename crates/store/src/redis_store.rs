//! Redis-backed store.
//!
//! Each primitive is one `EVALSHA` of a script from [`crate::scripts`], so
//! Redis serializes them and no client-side locking is involved.
//!
//! The `now_ms` passed by callers is ignored here: expiry runs on the Redis
//! server clock so every gateway sees the same deadlines.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Client, RedisError, Script, ScriptInvocation};
use room_core::{Error, Result, SessionToken};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{RoomKeys, StoreConfig};
use crate::scripts;
use crate::{AdmitRequest, Occupancy, RoomStore};

/// Loaded scripts. `Script` caches the SHA and reloads on `NOSCRIPT`.
struct Scripts {
    try_admit: Script,
    refresh_active: Script,
    enqueue: Script,
    queue_position: Script,
    promote: Script,
    occupancy: Script,
}

impl Scripts {
    fn new() -> Self {
        Self {
            try_admit: Script::new(scripts::TRY_ADMIT),
            refresh_active: Script::new(scripts::REFRESH_ACTIVE),
            enqueue: Script::new(scripts::ENQUEUE),
            queue_position: Script::new(scripts::QUEUE_POSITION),
            promote: Script::new(scripts::PROMOTE),
            occupancy: Script::new(scripts::OCCUPANCY),
        }
    }
}

/// Store client backed by Redis sorted sets.
pub struct RedisStore {
    conn: ConnectionManager,
    keys: RoomKeys,
    scripts: Scripts,
    timeout: Duration,
}

impl RedisStore {
    /// Connects to Redis. Fails if the server is unreachable within the timeout.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str()).map_err(store_error)?;
        let timeout = config.timeout();

        let conn = tokio::time::timeout(timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| Error::store(format!("connect timed out after {:?}", timeout)))?
            .map_err(store_error)?;

        Ok(Self {
            conn,
            keys: RoomKeys::new(&config.key_prefix),
            scripts: Scripts::new(),
            timeout,
        })
    }

    pub fn keys(&self) -> &RoomKeys {
        &self.keys
    }

    /// Binds the shared key list to a script.
    fn prepare<'a>(&'a self, script: &'a Script) -> ScriptInvocation<'a> {
        let mut invocation = script.prepare_invoke();
        for key in self.keys.as_array() {
            invocation.key(key);
        }
        invocation
    }

    /// Runs a call under the configured timeout.
    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                warn!(op, error = %e, "Redis operation failed");
                Err(store_error(e))
            }
            Err(_) => {
                warn!(op, timeout_ms = self.timeout.as_millis() as u64, "Redis operation timed out");
                Err(Error::store(format!("{} timed out", op)))
            }
        }
    }
}

fn store_error(e: RedisError) -> Error {
    Error::store(e.to_string())
}

fn ttl_ms(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)
}

/// Scripts answer -1 for "not present".
fn rank(raw: i64) -> Option<u64> {
    u64::try_from(raw).ok()
}

#[async_trait]
impl RoomStore for RedisStore {
    async fn try_admit(&self, token: &SessionToken, request: AdmitRequest) -> Result<bool> {
        let mut invocation = self.prepare(&self.scripts.try_admit);
        invocation
            .arg(token.as_str())
            .arg(request.max_active)
            .arg(ttl_ms(request.active_ttl))
            .arg(if request.respect_queue { 1 } else { 0 });

        let mut conn = self.conn.clone();
        let admitted: i64 = self
            .bounded("try_admit", invocation.invoke_async(&mut conn))
            .await?;
        Ok(admitted == 1)
    }

    async fn refresh_active(
        &self,
        token: &SessionToken,
        active_ttl: Duration,
        _now_ms: i64,
    ) -> Result<bool> {
        let mut invocation = self.prepare(&self.scripts.refresh_active);
        invocation.arg(token.as_str()).arg(ttl_ms(active_ttl));

        let mut conn = self.conn.clone();
        let refreshed: i64 = self
            .bounded("refresh_active", invocation.invoke_async(&mut conn))
            .await?;
        Ok(refreshed == 1)
    }

    async fn enqueue(
        &self,
        token: &SessionToken,
        queue_ttl: Duration,
        _now_ms: i64,
    ) -> Result<Option<u64>> {
        let mut invocation = self.prepare(&self.scripts.enqueue);
        invocation.arg(token.as_str()).arg(ttl_ms(queue_ttl));

        let mut conn = self.conn.clone();
        let raw: i64 = self
            .bounded("enqueue", invocation.invoke_async(&mut conn))
            .await?;
        Ok(rank(raw))
    }

    async fn queue_position(
        &self,
        token: &SessionToken,
        queue_ttl: Duration,
        _now_ms: i64,
    ) -> Result<Option<u64>> {
        let mut invocation = self.prepare(&self.scripts.queue_position);
        invocation.arg(token.as_str()).arg(ttl_ms(queue_ttl));

        let mut conn = self.conn.clone();
        let raw: i64 = self
            .bounded("queue_position", invocation.invoke_async(&mut conn))
            .await?;
        Ok(rank(raw))
    }

    async fn promote_up_to(&self, limit: u64, request: AdmitRequest) -> Result<Vec<SessionToken>> {
        let mut invocation = self.prepare(&self.scripts.promote);
        invocation
            .arg(limit)
            .arg(request.max_active)
            .arg(ttl_ms(request.active_ttl));

        let mut conn = self.conn.clone();
        let raw: Vec<String> = self
            .bounded("promote_up_to", invocation.invoke_async(&mut conn))
            .await?;

        // Only tokens we issued ever reach the queue
        let promoted = raw
            .iter()
            .filter_map(|t| SessionToken::parse(t).ok())
            .collect::<Vec<_>>();

        if !promoted.is_empty() {
            debug!(count = promoted.len(), "Promoted queued sessions");
        }
        Ok(promoted)
    }

    async fn occupancy(&self, _now_ms: i64) -> Result<Occupancy> {
        let invocation = self.prepare(&self.scripts.occupancy);

        let mut conn = self.conn.clone();
        let (active, queued): (u64, u64) = self
            .bounded("occupancy", invocation.invoke_async(&mut conn))
            .await?;
        Ok(Occupancy { active, queued })
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _pong: String = self
            .bounded("ping", redis::cmd("PING").query_async(&mut conn))
            .await?;
        Ok(())
    }
}
