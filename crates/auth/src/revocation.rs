//! Optional token denylist.
//!
//! Without a denylist a token stays valid until its natural expiry, even after
//! a refresh or logout. Deployments that need early revocation plug one in;
//! it is consulted by the request authenticator after the live-record check.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::{future::Cache, policy::EvictionPolicy};
use uuid::Uuid;

use genusdb_core::Clock;

use crate::credentials::LookupError;

/// Revoked ids tracked at once by [`InMemoryDenylist::new`].
pub const DEFAULT_DENYLIST_CAPACITY: u64 = 100_000;

#[async_trait]
pub trait TokenDenylist: Send + Sync {
    async fn is_revoked(&self, token_id: Uuid) -> Result<bool, LookupError>;

    /// Revoke `token_id`. `expires_at` lets implementations forget the entry
    /// once the token would have died anyway.
    async fn revoke(&self, token_id: Uuid, expires_at: i64) -> Result<(), LookupError>;
}

/// Entries live until the instant stored as their value.
struct RevocationExpiry;

impl moka::Expiry<Uuid, Instant> for RevocationExpiry {
    fn expire_after_create(
        &self,
        _key: &Uuid,
        value: &Instant,
        created_at: Instant,
    ) -> Option<Duration> {
        Some(value.saturating_duration_since(created_at))
    }
}

/// In-memory denylist for single-node deployments.
///
/// Backed by a [`moka::future::Cache`]: each entry expires together with the
/// token it revokes, and the cache is capacity-bounded with LRU eviction.
pub struct InMemoryDenylist {
    revoked: Cache<Uuid, Instant>,
    clock: Arc<dyn Clock>,
}

impl InMemoryDenylist {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_capacity(DEFAULT_DENYLIST_CAPACITY, clock)
    }

    /// `clock` must be the same clock the request authenticator checks expiry with.
    pub fn with_capacity(max_capacity: u64, clock: Arc<dyn Clock>) -> Self {
        let revoked = Cache::builder()
            .max_capacity(max_capacity)
            .eviction_policy(EvictionPolicy::lru())
            .expire_after(RevocationExpiry)
            .build();
        Self { revoked, clock }
    }

    /// Approximate number of tracked ids; expired entries are dropped lazily.
    pub fn entry_count(&self) -> u64 {
        self.revoked.entry_count()
    }

    /// Apply pending evictions and expirations now.
    pub async fn run_pending_tasks(&self) {
        self.revoked.run_pending_tasks().await;
    }
}

#[async_trait]
impl TokenDenylist for InMemoryDenylist {
    async fn is_revoked(&self, token_id: Uuid) -> Result<bool, LookupError> {
        Ok(self.revoked.contains_key(&token_id))
    }

    async fn revoke(&self, token_id: Uuid, expires_at: i64) -> Result<(), LookupError> {
        let remaining = u64::try_from(expires_at - self.clock.now()).unwrap_or(0);
        let deadline = Instant::now() + Duration::from_secs(remaining);
        self.revoked.insert(token_id, deadline).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genusdb_core::ManualClock;

    const NOW: i64 = 1_700_000_000;

    fn denylist() -> InMemoryDenylist {
        InMemoryDenylist::new(Arc::new(ManualClock::new(NOW)))
    }

    #[tokio::test]
    async fn revoked_ids_are_reported() {
        let list = denylist();
        let id = Uuid::now_v7();
        assert!(!list.is_revoked(id).await.unwrap());

        list.revoke(id, NOW + 3600).await.unwrap();
        assert!(list.is_revoked(id).await.unwrap());
        assert!(!list.is_revoked(Uuid::now_v7()).await.unwrap());
    }

    #[tokio::test]
    async fn entries_for_dead_tokens_are_evicted() {
        let list = denylist();
        let live = Uuid::now_v7();
        list.revoke(live, NOW + 3600).await.unwrap();

        for _ in 0..1000 {
            let dead = Uuid::now_v7();
            list.revoke(dead, NOW - 1).await.unwrap();
            assert!(!list.is_revoked(dead).await.unwrap());
        }
        list.run_pending_tasks().await;

        assert_eq!(list.entry_count(), 1);
        assert!(list.is_revoked(live).await.unwrap());
    }

    #[tokio::test]
    async fn capacity_bounds_tracked_ids() {
        let list = InMemoryDenylist::with_capacity(2, Arc::new(ManualClock::new(NOW)));
        for _ in 0..10 {
            list.revoke(Uuid::now_v7(), NOW + 3600).await.unwrap();
        }
        list.run_pending_tasks().await;

        assert!(list.entry_count() <= 2);
    }
}
