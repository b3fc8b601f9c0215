//! Short-lived cache of verification codes, one entry per phone number.
//!
//! Entries are stored as `{"code": "...", "timestamp": <ms since epoch>}` under
//! `verification_code_<phone>`. The cache is a convenience for the login form;
//! the backend remains the only authority on whether a code is correct.
//!
//! The time a code was last requested is kept under `code_sent_<phone>` so the
//! resend interval holds across runs of the client.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::kv::{KvStore, StoreError};

/// How long a cached code stays readable: 5 minutes.
pub const CODE_TTL_MS: i64 = 5 * 60 * 1000;

/// Source of the current time in milliseconds since the Unix epoch.
pub trait Clock {
    fn now_millis(&self) -> i64;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedCode {
    code: String,
    timestamp: i64,
}

/// Verification codes kept in a [`KvStore`] with a fixed TTL.
#[derive(Clone, Debug)]
pub struct VerificationCache<S, C = SystemClock> {
    store: S,
    clock: C,
}

impl<S: KvStore> VerificationCache<S> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: KvStore, C: Clock> VerificationCache<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    fn key(phone: &str) -> String {
        format!("verification_code_{phone}")
    }

    fn sent_key(phone: &str) -> String {
        format!("code_sent_{phone}")
    }

    /// Remember `code` for `phone`, stamped with the current time.
    pub async fn save(&self, phone: &str, code: &str) -> Result<(), StoreError> {
        let entry = CachedCode {
            code: code.to_string(),
            timestamp: self.clock.now_millis(),
        };
        self.store
            .set(&Self::key(phone), serde_json::to_value(entry)?)
            .await
    }

    /// The cached code for `phone`, if one was saved less than [`CODE_TTL_MS`] ago.
    ///
    /// Expired entries are deleted as a side effect.
    pub async fn get(&self, phone: &str) -> Option<String> {
        let key = Self::key(phone);
        let value = match self.store.get(&key).await {
            Ok(Some(value)) => value,
            Ok(None) => return None,
            Err(e) => {
                warn!("failed to read cached verification code: {e}");
                return None;
            }
        };
        let entry: CachedCode = match serde_json::from_value(value) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("dropping malformed cached verification code: {e}");
                self.discard(&key).await;
                return None;
            }
        };
        if self.clock.now_millis() - entry.timestamp > CODE_TTL_MS {
            debug!("cached verification code expired");
            self.discard(&key).await;
            return None;
        }
        Some(entry.code)
    }

    pub async fn clear(&self, phone: &str) -> Result<(), StoreError> {
        self.store.remove(&Self::key(phone)).await
    }

    /// Record that a code was just requested for `phone`.
    pub async fn mark_sent(&self, phone: &str) -> Result<(), StoreError> {
        self.store
            .set(&Self::sent_key(phone), self.clock.now_millis().into())
            .await
    }

    /// Whole seconds left before another code may be requested for `phone`,
    /// given a resend interval of `interval_secs`. Zero when none is pending.
    ///
    /// A stamp older than the interval is deleted.
    pub async fn resend_wait(&self, phone: &str, interval_secs: u32) -> u32 {
        let key = Self::sent_key(phone);
        let sent_at = match self.store.get(&key).await {
            Ok(Some(value)) => value.as_i64(),
            Ok(None) => return 0,
            Err(e) => {
                warn!("failed to read code request time: {e}");
                return 0;
            }
        };
        let Some(sent_at) = sent_at else {
            warn!("dropping malformed code request time");
            self.discard(&key).await;
            return 0;
        };

        let interval_ms = i64::from(interval_secs) * 1000;
        let elapsed = (self.clock.now_millis() - sent_at).max(0);
        if elapsed >= interval_ms {
            self.discard(&key).await;
            return 0;
        }
        // Round up so a wait of 0.5s still reads as 1s
        ((interval_ms - elapsed + 999) / 1000) as u32
    }

    async fn discard(&self, key: &str) {
        if let Err(e) = self.store.remove(key).await {
            warn!("failed to remove {key}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct ManualClock(Arc<AtomicI64>);

    impl ManualClock {
        fn set(&self, millis: i64) {
            self.0.store(millis, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_millis(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    const PHONE: &str = "13812345678";

    #[tokio::test]
    async fn test_code_readable_until_ttl() {
        let clock = ManualClock::default();
        let store = MemoryStore::new();
        let cache = VerificationCache::with_clock(store.clone(), clock.clone());

        clock.set(1_000);
        cache.save(PHONE, "123456").await.unwrap();

        clock.set(1_000 + CODE_TTL_MS - 1);
        assert_eq!(cache.get(PHONE).await.as_deref(), Some("123456"));

        // Exactly at T + 5 minutes the code is still valid
        clock.set(1_000 + CODE_TTL_MS);
        assert_eq!(cache.get(PHONE).await.as_deref(), Some("123456"));

        clock.set(1_000 + CODE_TTL_MS + 1);
        assert!(cache.get(PHONE).await.is_none());

        // The expired entry was removed
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_codes_are_per_phone() {
        let cache = VerificationCache::with_clock(MemoryStore::new(), ManualClock::default());

        cache.save(PHONE, "111111").await.unwrap();
        cache.save("13900000000", "222222").await.unwrap();

        assert_eq!(cache.get(PHONE).await.as_deref(), Some("111111"));
        assert_eq!(cache.get("13900000000").await.as_deref(), Some("222222"));

        cache.clear(PHONE).await.unwrap();
        assert!(cache.get(PHONE).await.is_none());
        assert_eq!(cache.get("13900000000").await.as_deref(), Some("222222"));
    }

    #[tokio::test]
    async fn test_stored_layout() {
        let clock = ManualClock::default();
        clock.set(42);
        let store = MemoryStore::new();
        let cache = VerificationCache::with_clock(store.clone(), clock);

        cache.save(PHONE, "654321").await.unwrap();
        let raw = store
            .get("verification_code_13812345678")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(raw, serde_json::json!({"code": "654321", "timestamp": 42}));
    }

    #[tokio::test]
    async fn test_resend_wait_counts_down() {
        let clock = ManualClock::default();
        let store = MemoryStore::new();
        let cache = VerificationCache::with_clock(store.clone(), clock.clone());

        assert_eq!(cache.resend_wait(PHONE, 60).await, 0);

        clock.set(10_000);
        cache.mark_sent(PHONE).await.unwrap();
        assert_eq!(cache.resend_wait(PHONE, 60).await, 60);

        clock.set(10_000 + 59_500);
        assert_eq!(cache.resend_wait(PHONE, 60).await, 1);
        assert_eq!(cache.resend_wait("13900000000", 60).await, 0);

        clock.set(10_000 + 60_000);
        assert_eq!(cache.resend_wait(PHONE, 60).await, 0);
        // The stale stamp was removed
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_resend_wait_survives_new_cache() {
        let clock = ManualClock::default();
        let store = MemoryStore::new();
        clock.set(5_000);
        VerificationCache::with_clock(store.clone(), clock.clone())
            .mark_sent(PHONE)
            .await
            .unwrap();

        clock.set(25_000);
        let reopened = VerificationCache::with_clock(store, clock);
        assert_eq!(reopened.resend_wait(PHONE, 60).await, 40);
    }

    /// A store whose removals always fail.
    #[derive(Clone, Default)]
    struct StuckStore(MemoryStore);

    impl KvStore for StuckStore {
        async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
            self.0.get(key).await
        }

        async fn set(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
            self.0.set(key, value).await
        }

        async fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Io(std::io::Error::other("read-only")))
        }
    }

    #[tokio::test]
    async fn test_failed_removal_still_expires() {
        let clock = ManualClock::default();
        let store = StuckStore::default();
        let cache = VerificationCache::with_clock(store.clone(), clock.clone());

        cache.save(PHONE, "123456").await.unwrap();
        cache.mark_sent(PHONE).await.unwrap();

        clock.set(CODE_TTL_MS + 1);
        assert!(cache.get(PHONE).await.is_none());
        assert_eq!(cache.resend_wait(PHONE, 60).await, 0);

        // The entries could not be removed but read as expired every time
        assert_eq!(store.0.len(), 2);
        assert!(cache.get(PHONE).await.is_none());
    }

    #[tokio::test]
    async fn test_system_clock_entry_is_fresh() {
        let cache = VerificationCache::new(MemoryStore::new());
        cache.save(PHONE, "123456").await.unwrap();
        assert_eq!(cache.get(PHONE).await.as_deref(), Some("123456"));
    }
}
