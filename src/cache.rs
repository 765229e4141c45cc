//! In-memory analysis cache
//!
//! Thread-safe memoization of contract analysis results, keyed by
//! (address, chain). Uses DashMap for concurrent access without lock
//! contention, TTL-based expiration, and per-key single-flight guards so
//! concurrent first-time requests for the same contract do not each pay
//! for a full provider round trip.
//!
//! A cache hit must be byte-for-byte the previously computed result;
//! results derived from provider errors are never stored.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::ContractAnalysisResult;

/// Cache entry with creation timestamp for TTL validation
#[derive(Clone)]
struct CacheEntry {
    result: ContractAnalysisResult,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }

    fn remaining_ttl(&self) -> u64 {
        self.ttl
            .saturating_sub(self.created_at.elapsed())
            .as_secs()
    }
}

/// (address, chain) -> result cache with hit/miss accounting
#[derive(Clone)]
pub struct AnalysisCache {
    store: Arc<DashMap<(String, String), CacheEntry>>,
    /// Per-key guards for single-flight computation
    inflight: Arc<DashMap<(String, String), Arc<Mutex<()>>>>,
    ttl: Duration,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl AnalysisCache {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            store: Arc::new(DashMap::new()),
            inflight: Arc::new(DashMap::new()),
            ttl: Duration::from_secs(ttl_secs),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    fn key(address: &str, chain: &str) -> (String, String) {
        (address.to_lowercase(), chain.to_lowercase())
    }

    /// Get with TTL validation. Expired entries are removed on read.
    pub fn get(&self, address: &str, chain: &str) -> Option<ContractAnalysisResult> {
        let key = Self::key(address, chain);

        if let Some(entry) = self.store.get(&key) {
            if entry.is_expired() {
                drop(entry); // release read lock before remove
                self.store.remove(&key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("📭 CACHE MISS (expired): {}@{}", key.0, key.1);
                None
            } else {
                self.hits.fetch_add(1, Ordering::Relaxed);
                info!(
                    "✅ CACHE HIT: {}@{} (TTL: {}s remaining)",
                    key.0,
                    key.1,
                    entry.remaining_ttl()
                );
                Some(entry.result.clone())
            }
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            debug!("📭 CACHE MISS: {}@{}", key.0, key.1);
            None
        }
    }

    pub fn set(&self, address: &str, chain: &str, result: ContractAnalysisResult) {
        let key = Self::key(address, chain);
        let entry = CacheEntry {
            result,
            created_at: Instant::now(),
            ttl: self.ttl,
        };
        self.store.insert(key.clone(), entry);
        info!("💾 CACHE SET: {}@{} (TTL: {}s)", key.0, key.1, self.ttl.as_secs());
    }

    /// Per-key guard for single-flight de-duplication. Callers hold the
    /// lock across check-compute-store; the guard entry is cleaned up by
    /// `release_flight` once the key is cached.
    pub fn flight_guard(&self, address: &str, chain: &str) -> Arc<Mutex<()>> {
        let key = Self::key(address, chain);
        self.inflight
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub fn release_flight(&self, address: &str, chain: &str) {
        self.inflight.remove(&Self::key(address, chain));
    }

    /// Number of live single-flight guard entries
    pub fn inflight_len(&self) -> usize {
        self.inflight.len()
    }

    pub fn clear(&self) {
        self.store.clear();
        info!("🗑️ CACHE CLEARED");
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}
