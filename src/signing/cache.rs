//! In-memory cache for unsealed signing keys.
//!
//! Unsealing runs Argon2id, so keys are kept for a while after first use.
//! Entries are keyed by key fingerprint, expire after a TTL and are zeroized
//! when dropped. At capacity the least recently used entry is evicted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use ed25519_dalek::SigningKey;
use zeroize::Zeroize;

#[derive(Debug, Clone)]
pub struct SigningKeyCacheConfig {
    /// How long an unsealed key stays usable without unsealing again
    pub default_ttl: Duration,

    /// Maximum number of unsealed keys held at once
    pub max_entries: usize,
}

impl Default for SigningKeyCacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(3600),
            max_entries: 1_000,
        }
    }
}

/// An unsealed signing key with expiration metadata
pub struct CachedSigningKey {
    key_bytes: [u8; 32],
    expires_at: Instant,
    last_used: Instant,
}

impl CachedSigningKey {
    pub fn new(key: &SigningKey, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            key_bytes: key.to_bytes(),
            expires_at: now + ttl,
            last_used: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    pub fn signing_key(&self) -> SigningKey {
        SigningKey::from_bytes(&self.key_bytes)
    }
}

impl Drop for CachedSigningKey {
    fn drop(&mut self) {
        self.key_bytes.zeroize();
    }
}

#[derive(Debug, Default)]
struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

/// Snapshot of cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

pub struct SigningKeyCache {
    cache: DashMap<String, CachedSigningKey>,
    config: SigningKeyCacheConfig,
    stats: CacheStats,
}

impl SigningKeyCache {
    pub fn new(config: SigningKeyCacheConfig) -> Self {
        Self {
            cache: DashMap::new(),
            config,
            stats: CacheStats::default(),
        }
    }

    /// Store an unsealed key under its fingerprint
    pub fn insert(&self, key_id: &str, key: &SigningKey) {
        if self.cache.len() >= self.config.max_entries && !self.cache.contains_key(key_id) {
            self.evict_lru();
        }

        self.cache
            .insert(key_id.to_string(), CachedSigningKey::new(key, self.config.default_ttl));
    }

    /// Fetch a live key, dropping it if it has expired
    pub fn get(&self, key_id: &str) -> Option<SigningKey> {
        if let Some(mut entry) = self.cache.get_mut(key_id) {
            if entry.is_expired() {
                drop(entry);
                self.cache.remove(key_id);
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
                return None;
            }

            entry.last_used = Instant::now();
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return Some(entry.signing_key());
        }

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Remove all expired entries, returning how many were dropped
    pub fn cleanup(&self) -> usize {
        let before = self.cache.len();
        self.cache.retain(|_, v| !v.is_expired());
        let removed = before.saturating_sub(self.cache.len());
        self.stats
            .evictions
            .fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn stats(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            evictions: self.stats.evictions.load(Ordering::Relaxed),
        }
    }

    fn evict_lru(&self) {
        let oldest_key = self
            .cache
            .iter()
            .min_by_key(|e| e.last_used)
            .map(|e| e.key().clone());

        if let Some(key) = oldest_key {
            self.cache.remove(&key);
            self.stats.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::crypto::generate_keypair;

    #[test]
    fn test_insert_and_get() {
        let cache = SigningKeyCache::new(SigningKeyCacheConfig::default());
        let (signing_key, _) = generate_keypair();

        cache.insert("key-1", &signing_key);

        let retrieved = cache.get("key-1").unwrap();
        assert_eq!(retrieved.to_bytes(), signing_key.to_bytes());
        assert!(cache.get("key-2").is_none());

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_expiry() {
        let cache = SigningKeyCache::new(SigningKeyCacheConfig {
            default_ttl: Duration::from_millis(10),
            ..Default::default()
        });
        let (signing_key, _) = generate_keypair();

        cache.insert("key-1", &signing_key);
        assert!(cache.get("key-1").is_some());

        std::thread::sleep(Duration::from_millis(20));

        assert!(cache.get("key-1").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cleanup_counts_expired() {
        let cache = SigningKeyCache::new(SigningKeyCacheConfig {
            default_ttl: Duration::from_millis(5),
            ..Default::default()
        });
        for i in 0..3 {
            let (key, _) = generate_keypair();
            cache.insert(&format!("key-{i}"), &key);
        }

        std::thread::sleep(Duration::from_millis(15));

        assert_eq!(cache.cleanup(), 3);
        assert_eq!(cache.stats().evictions, 3);
    }

    #[test]
    fn test_lru_eviction() {
        let cache = SigningKeyCache::new(SigningKeyCacheConfig {
            max_entries: 2,
            ..Default::default()
        });

        let (a, _) = generate_keypair();
        let (b, _) = generate_keypair();
        let (c, _) = generate_keypair();

        cache.insert("a", &a);
        std::thread::sleep(Duration::from_millis(5));
        cache.insert("b", &b);
        std::thread::sleep(Duration::from_millis(5));
        cache.get("a");

        cache.insert("c", &c);

        assert_eq!(cache.len(), 2);
        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
    }
}
