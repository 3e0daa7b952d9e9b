use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock};

/// Time source for cache expiry. Injected so tests can drive expiry
/// deterministically instead of sleeping.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Manually advanced clock for tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self { now_ms: AtomicI64::new(start_ms) }
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Keyed TTL cache with a fixed lifetime per entry. Expired entries are
/// simply misses; the next insert overwrites them in place.
pub struct TtlCache<T: Clone> {
    ttl_ms: i64,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, (i64, T)>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(ttl_ms: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl_ms: ttl_ms as i64,
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let entries = match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let (inserted_at, value) = entries.get(key)?;
        if self.clock.now_ms() - inserted_at < self.ttl_ms {
            Some(value.clone())
        } else {
            None
        }
    }

    pub fn insert(&self, key: &str, value: T) {
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.insert(key.to_string(), (self.clock.now_ms(), value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_entry_hits() {
        let clock = Arc::new(ManualClock::new(0));
        let cache: TtlCache<u32> = TtlCache::new(1_000, clock.clone());
        cache.insert("music", 7);
        clock.advance(999);
        assert_eq!(cache.get("music"), Some(7));
    }

    #[test]
    fn test_expired_entry_misses() {
        let clock = Arc::new(ManualClock::new(0));
        let cache: TtlCache<u32> = TtlCache::new(1_000, clock.clone());
        cache.insert("music", 7);
        clock.advance(1_000);
        assert_eq!(cache.get("music"), None);
    }

    #[test]
    fn test_reinsert_refreshes_ttl() {
        let clock = Arc::new(ManualClock::new(0));
        let cache: TtlCache<u32> = TtlCache::new(1_000, clock.clone());
        cache.insert("music", 7);
        clock.advance(900);
        cache.insert("music", 8);
        clock.advance(900);
        assert_eq!(cache.get("music"), Some(8));
    }

    #[test]
    fn test_unknown_key_misses() {
        let cache: TtlCache<u32> = TtlCache::new(1_000, Arc::new(ManualClock::new(0)));
        assert_eq!(cache.get("art"), None);
    }
}
