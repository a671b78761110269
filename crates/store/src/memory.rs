//! In-process store.
//!
//! Mirrors the Redis scripts under a single mutex. Used by tests and by
//! single-instance deployments where no shared store is available.

use async_trait::async_trait;
use parking_lot::Mutex;
use room_core::{Result, SessionToken};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use crate::{AdmitRequest, Occupancy, RoomStore};

#[derive(Debug, Default)]
struct QueueEntry {
    seq: u64,
    deadline_ms: i64,
}

#[derive(Debug, Default)]
struct State {
    /// token -> slot expiry
    active: HashMap<SessionToken, i64>,
    /// seq -> token, FIFO order
    order: BTreeMap<u64, SessionToken>,
    queued: HashMap<SessionToken, QueueEntry>,
    next_seq: u64,
}

impl State {
    fn purge(&mut self, now_ms: i64) {
        self.active.retain(|_, expiry| *expiry > now_ms);

        let expired: Vec<SessionToken> = self
            .queued
            .iter()
            .filter(|(_, entry)| entry.deadline_ms <= now_ms)
            .map(|(token, _)| token.clone())
            .collect();

        for token in expired {
            self.dequeue(&token);
        }
    }

    fn dequeue(&mut self, token: &SessionToken) {
        if let Some(entry) = self.queued.remove(token) {
            self.order.remove(&entry.seq);
        }
    }

    fn rank(&self, token: &SessionToken) -> Option<u64> {
        let entry = self.queued.get(token)?;
        Some(self.order.range(..entry.seq).count() as u64)
    }
}

/// Mutex-guarded store with the same semantics as [`RedisStore`](crate::RedisStore).
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active tokens, unordered. Expired entries are not filtered.
    pub fn active_tokens(&self) -> Vec<SessionToken> {
        self.state.lock().active.keys().cloned().collect()
    }

    /// Queued tokens in FIFO order. Expired entries are not filtered.
    pub fn queued_tokens(&self) -> Vec<SessionToken> {
        self.state.lock().order.values().cloned().collect()
    }

    /// Drops an active slot immediately, as if its TTL had elapsed.
    pub fn evict_active(&self, token: &SessionToken) -> bool {
        self.state.lock().active.remove(token).is_some()
    }
}

/// Deadline `ttl` after `now_ms`, clamped instead of wrapping.
fn deadline(now_ms: i64, ttl: Duration) -> i64 {
    let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    now_ms.saturating_add(ttl_ms)
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn try_admit(&self, token: &SessionToken, request: AdmitRequest) -> Result<bool> {
        let mut state = self.state.lock();
        state.purge(request.now_ms);

        let expiry = deadline(request.now_ms, request.active_ttl);

        if let Some(slot) = state.active.get_mut(token) {
            *slot = expiry;
            return Ok(true);
        }

        if request.respect_queue {
            let ahead = state
                .rank(token)
                .unwrap_or(state.order.len() as u64);
            if ahead > 0 {
                return Ok(false);
            }
        }

        if state.active.len() as u64 >= request.max_active {
            return Ok(false);
        }

        state.active.insert(token.clone(), expiry);
        state.dequeue(token);
        Ok(true)
    }

    async fn refresh_active(
        &self,
        token: &SessionToken,
        active_ttl: Duration,
        now_ms: i64,
    ) -> Result<bool> {
        let mut state = self.state.lock();
        state.purge(now_ms);

        match state.active.get_mut(token) {
            Some(slot) => {
                *slot = deadline(now_ms, active_ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn enqueue(
        &self,
        token: &SessionToken,
        queue_ttl: Duration,
        now_ms: i64,
    ) -> Result<Option<u64>> {
        let mut state = self.state.lock();
        state.purge(now_ms);

        if state.active.contains_key(token) {
            return Ok(None);
        }

        let deadline_ms = deadline(now_ms, queue_ttl);
        if let Some(entry) = state.queued.get_mut(token) {
            entry.deadline_ms = deadline_ms;
        } else {
            state.next_seq += 1;
            let seq = state.next_seq;
            state.order.insert(seq, token.clone());
            state
                .queued
                .insert(token.clone(), QueueEntry { seq, deadline_ms });
        }

        Ok(state.rank(token))
    }

    async fn queue_position(
        &self,
        token: &SessionToken,
        queue_ttl: Duration,
        now_ms: i64,
    ) -> Result<Option<u64>> {
        let mut state = self.state.lock();
        state.purge(now_ms);

        let rank = state.rank(token);
        if rank.is_some() {
            if let Some(entry) = state.queued.get_mut(token) {
                entry.deadline_ms = deadline(now_ms, queue_ttl);
            }
        }
        Ok(rank)
    }

    async fn promote_up_to(&self, limit: u64, request: AdmitRequest) -> Result<Vec<SessionToken>> {
        let mut state = self.state.lock();
        state.purge(request.now_ms);

        let free = request.max_active.saturating_sub(state.active.len() as u64);
        let n = limit.min(free) as usize;

        let heads: Vec<SessionToken> = state.order.values().take(n).cloned().collect();
        let expiry = deadline(request.now_ms, request.active_ttl);
        for token in &heads {
            state.dequeue(token);
            state.active.insert(token.clone(), expiry);
        }
        Ok(heads)
    }

    async fn occupancy(&self, now_ms: i64) -> Result<Occupancy> {
        let mut state = self.state.lock();
        state.purge(now_ms);

        Ok(Occupancy {
            active: state.active.len() as u64,
            queued: state.order.len() as u64,
        })
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
