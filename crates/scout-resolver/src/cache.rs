//! Positive-response record cache.
//!
//! A bounded map from (query name, record type) to the answer records
//! of a successful lookup, shared by all calls on one engine instance.
//! Entries expire with the smallest answer TTL, clamped to a
//! configurable ceiling.

use hickory_proto::rr::{Record, RecordType};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Cache key: rendered query name plus record type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    name: String,
    rtype: RecordType,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    answers: Vec<Record>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Bounded TTL cache of positive answers.
pub struct RecordCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    max_entries: usize,
    max_ttl: Duration,
}

impl RecordCache {
    /// Creates a cache holding at most `max_entries` answers, each for
    /// at most `max_ttl`.
    pub fn new(max_entries: usize, max_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::with_capacity(max_entries.min(1024))),
            max_entries,
            max_ttl,
        }
    }

    /// Looks up cached answers for a query, dropping expired entries.
    pub fn fetch(&self, name: &str, rtype: RecordType) -> Option<Vec<Record>> {
        let key = CacheKey {
            name: name.to_string(),
            rtype,
        };
        let now = Instant::now();

        {
            let entries = self.entries.read();
            match entries.get(&key) {
                Some(entry) if !entry.is_expired(now) => return Some(entry.answers.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        self.entries.write().remove(&key);
        None
    }

    /// Stores the answers of a successful non-empty lookup.
    pub fn store(&self, name: &str, rtype: RecordType, answers: &[Record]) {
        if answers.is_empty() || self.max_entries == 0 {
            return;
        }

        let ttl = answers
            .iter()
            .map(|r| u64::from(r.ttl()))
            .min()
            .unwrap_or(0);
        let ttl = Duration::from_secs(ttl).min(self.max_ttl);
        if ttl.is_zero() {
            return;
        }

        let key = CacheKey {
            name: name.to_string(),
            rtype,
        };
        let entry = CacheEntry {
            answers: answers.to_vec(),
            expires_at: Instant::now() + ttl,
        };

        let mut entries = self.entries.write();
        if entries.len() >= self.max_entries && !entries.contains_key(&key) {
            // At capacity: drop an arbitrary entry to make room.
            if let Some(victim) = entries.keys().next().cloned() {
                entries.remove(&victim);
            }
        }
        entries.insert(key, entry);
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drops every cached entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_proto::rr::rdata::PTR;
    use hickory_proto::rr::{Name, RData};
    use std::str::FromStr;

    fn ptr_record(ttl: u32) -> Record {
        Record::from_rdata(
            Name::from_str("q.example.com.").unwrap(),
            ttl,
            RData::PTR(PTR(Name::from_str("t.example.com.").unwrap())),
        )
    }

    #[test]
    fn test_store_and_fetch() {
        let cache = RecordCache::new(16, Duration::from_secs(900));
        assert!(cache.fetch("q.example.com.", RecordType::PTR).is_none());

        cache.store("q.example.com.", RecordType::PTR, &[ptr_record(300)]);
        let hit = cache.fetch("q.example.com.", RecordType::PTR).unwrap();
        assert_eq!(hit.len(), 1);

        // Same name, different type misses.
        assert!(cache.fetch("q.example.com.", RecordType::TXT).is_none());
    }

    #[test]
    fn test_empty_and_zero_ttl_not_cached() {
        let cache = RecordCache::new(16, Duration::from_secs(900));
        cache.store("a.example.com.", RecordType::PTR, &[]);
        cache.store("b.example.com.", RecordType::PTR, &[ptr_record(0)]);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_capacity_bound() {
        let cache = RecordCache::new(2, Duration::from_secs(900));
        cache.store("a.", RecordType::PTR, &[ptr_record(300)]);
        cache.store("b.", RecordType::PTR, &[ptr_record(300)]);
        cache.store("c.", RecordType::PTR, &[ptr_record(300)]);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_clear() {
        let cache = RecordCache::new(16, Duration::from_secs(900));
        cache.store("a.", RecordType::PTR, &[ptr_record(300)]);
        cache.clear();
        assert!(cache.is_empty());
    }
}
