// src/cache/local.rs

use crate::suggest::ScoredSuggestion;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct CacheEntry {
    payload: Vec<ScoredSuggestion>,
    inserted_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() > self.ttl
    }
}

/// Process-local TTL tier. Entries past their TTL are treated as absent on
/// read even before they are physically removed.
#[derive(Default)]
pub struct LocalCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl LocalCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Vec<ScoredSuggestion>> {
        let mut entries = self.entries.lock().ok()?;
        match entries.get(key) {
            Some(entry) if !entry.is_expired() => Some(entry.payload.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: String, payload: Vec<ScoredSuggestion>, ttl: Duration) {
        if let Ok(mut entries) = self.entries.lock() {
            // Last write for a key wins; expired neighbors go opportunistically.
            entries.retain(|_, entry| !entry.is_expired());
            entries.insert(
                key,
                CacheEntry {
                    payload,
                    inserted_at: Instant::now(),
                    ttl,
                },
            );
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(id: &str) -> Vec<ScoredSuggestion> {
        vec![ScoredSuggestion {
            video_id: id.to_string(),
            title: id.to_string(),
            channel: "c".to_string(),
            score: 0.5,
            rank: 1,
        }]
    }

    #[test]
    fn hit_within_ttl() {
        let cache = LocalCache::new();
        cache.insert("k".into(), payload("a"), Duration::from_secs(60));
        assert_eq!(cache.get("k").unwrap()[0].video_id, "a");
    }

    #[test]
    fn expired_entry_is_absent() {
        let cache = LocalCache::new();
        cache.insert("k".into(), payload("a"), Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(25));
        assert!(cache.get("k").is_none());
        // The read also physically dropped it.
        assert!(cache.is_empty());
    }

    #[test]
    fn last_write_wins() {
        let cache = LocalCache::new();
        cache.insert("k".into(), payload("old"), Duration::from_secs(60));
        cache.insert("k".into(), payload("new"), Duration::from_secs(60));
        assert_eq!(cache.get("k").unwrap()[0].video_id, "new");
        assert_eq!(cache.len(), 1);
    }
}
