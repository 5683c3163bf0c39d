// In-memory resolution cache: identifier -> (audio URL, expiry).
//
// Entries are never evicted by a background task; an expired entry is
// dropped the moment a lookup observes it, or by an explicit clear().
// Growth is unbounded under identifier churn, which is acceptable for a
// proxy cache sized by its audience, not its catalogue.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;

/// One cached resolution. Valid strictly before `expires_at`.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub resolved_url: String,
    pub expires_at: Instant,
}

impl CacheEntry {
    pub fn is_valid(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Entry counts reported by `stats()`, computed by a full scan.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    pub total: usize,
    pub active: usize,
    pub expired: usize,
}

/// The map lives behind a mutex because the runtime schedules handlers
/// preemptively across threads. The lock is never held across an await.
pub struct ResolutionCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl ResolutionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a valid entry. An expired entry is removed and reported
    /// as a miss, so the caller re-resolves.
    pub fn lookup(&self, video_id: &str) -> Option<CacheEntry> {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap();
        match entries.get(video_id) {
            Some(entry) if entry.is_valid(now) => Some(entry.clone()),
            Some(_) => {
                entries.remove(video_id);
                None
            }
            None => None,
        }
    }

    /// Insert or overwrite the entry for `video_id` with a fresh TTL.
    pub fn store(&self, video_id: &str, resolved_url: String) {
        let entry = CacheEntry {
            resolved_url,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries
            .lock()
            .unwrap()
            .insert(video_id.to_string(), entry);
    }

    /// Remove everything; returns how many entries were dropped.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock().unwrap();
        let removed = entries.len();
        entries.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scan all entries against the current time. O(n), fine at proxy
    /// scale.
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.entries.lock().unwrap();
        let total = entries.len();
        let active = entries.values().filter(|e| e.is_valid(now)).count();
        CacheStats {
            total,
            active,
            expired: total - active,
        }
    }
}
