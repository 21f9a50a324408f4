//! A process-local substitute for the Key/Value port (§4.2) when no Redis
//! is configured. Rate limiting and idempotency degrade to this rather
//! than to "always allow" so both keep working, with reduced durability,
//! on a single-process deployment.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Default)]
pub struct InMemoryKv {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    fn sweep(entries: &mut HashMap<String, Entry>, now: Instant) {
        entries.retain(|_, entry| entry.expires_at > now);
    }

    pub fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        Self::sweep(&mut entries, now);
        entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Succeeds only if `key` is absent (or expired), mirroring
    /// `KvStore::set_if_not_exists_with_ttl`'s NX semantics.
    pub fn set_if_not_exists_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        Self::sweep(&mut entries, now);
        if entries.contains_key(key) {
            return false;
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        true
    }

    /// Fixed-window counter; stamps its own expiry on the first increment,
    /// same as `KvStore::increment`.
    pub fn increment(&self, key: &str, window: Duration) -> i64 {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        Self::sweep(&mut entries, now);
        match entries.get_mut(key) {
            Some(entry) => {
                let count: i64 = entry.value.parse().unwrap_or(0) + 1;
                entry.value = count.to_string();
                count
            }
            None => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: "1".to_string(),
                        expires_at: now + window,
                    },
                );
                1
            }
        }
    }

    pub fn delete(&self, key: &str) {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_starts_at_one_and_counts_up() {
        let kv = InMemoryKv::new();
        assert_eq!(kv.increment("k", Duration::from_secs(60)), 1);
        assert_eq!(kv.increment("k", Duration::from_secs(60)), 2);
    }

    #[test]
    fn set_if_not_exists_rejects_a_second_writer() {
        let kv = InMemoryKv::new();
        assert!(kv.set_if_not_exists_with_ttl("k", "a", Duration::from_secs(60)));
        assert!(!kv.set_if_not_exists_with_ttl("k", "b", Duration::from_secs(60)));
        assert_eq!(kv.get("k"), Some("a".to_string()));
    }

    #[test]
    fn expired_entries_are_swept_and_no_longer_block_writers() {
        let kv = InMemoryKv::new();
        assert!(kv.set_if_not_exists_with_ttl("k", "a", Duration::from_millis(1)));
        std::thread::sleep(Duration::from_millis(20));
        assert!(kv.set_if_not_exists_with_ttl("k", "b", Duration::from_secs(60)));
    }
}
