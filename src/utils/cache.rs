//! Report Cache
//!
//! Completed reports keyed by canonical entity id, with per-kind TTLs.
//! Storage sits behind [`ReportStore`]: an in-memory `DashMap` by default,
//! or one JSON file per entity when `LARP_CACHE_DIR` is set.
//!
//! A failing store never fails a scan. Read errors count as a miss, write
//! errors are logged and the report is simply not cached.

use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::models::config::{CacheTtl, ScanConfig};
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{CachedReport, EntityKind, Report, ResolvedEntity};

// ============================================
// Storage backends
// ============================================

/// Persistence for cached reports
pub trait ReportStore: Send + Sync {
    fn name(&self) -> &'static str;

    fn get(&self, canonical_id: &str) -> AppResult<Option<CachedReport>>;

    fn put(&self, entry: CachedReport) -> AppResult<()>;

    fn remove(&self, canonical_id: &str) -> AppResult<()>;

    /// Drop entries for which `keep` returns false; returns how many were dropped
    fn retain(&self, keep: &dyn Fn(&CachedReport) -> bool) -> AppResult<usize>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Thread-safe in-memory store
#[derive(Default)]
pub struct MemoryReportStore {
    store: DashMap<String, CachedReport>,
}

impl MemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReportStore for MemoryReportStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get(&self, canonical_id: &str) -> AppResult<Option<CachedReport>> {
        Ok(self.store.get(canonical_id).map(|entry| entry.clone()))
    }

    fn put(&self, entry: CachedReport) -> AppResult<()> {
        self.store.insert(entry.canonical_id.clone(), entry);
        Ok(())
    }

    fn remove(&self, canonical_id: &str) -> AppResult<()> {
        self.store.remove(canonical_id);
        Ok(())
    }

    fn retain(&self, keep: &dyn Fn(&CachedReport) -> bool) -> AppResult<usize> {
        let before = self.store.len();
        self.store.retain(|_, entry| keep(entry));
        Ok(before.saturating_sub(self.store.len()))
    }

    fn len(&self) -> usize {
        self.store.len()
    }
}

/// One JSON file per canonical id. File names are the hex SHA-256 of the
/// id: fixed length however long the id is, and case-sensitive base58 ids
/// never collide on case-insensitive disks.
pub struct DiskReportStore {
    dir: PathBuf,
}

impl DiskReportStore {
    pub fn open(dir: impl Into<PathBuf>) -> AppResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            AppError::cache_unavailable(format!("Cannot create cache dir {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    fn path_for(&self, canonical_id: &str) -> PathBuf {
        let digest = Sha256::digest(canonical_id.as_bytes());
        self.dir.join(format!("{}.json", hex::encode(digest)))
    }

    fn entries(&self) -> AppResult<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        Ok(paths)
    }
}

impl ReportStore for DiskReportStore {
    fn name(&self) -> &'static str {
        "disk"
    }

    fn get(&self, canonical_id: &str) -> AppResult<Option<CachedReport>> {
        match fs::read_to_string(self.path_for(canonical_id)) {
            Ok(raw) => {
                let entry: CachedReport = serde_json::from_str(&raw)?;
                Ok((entry.canonical_id == canonical_id).then_some(entry))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, entry: CachedReport) -> AppResult<()> {
        let path = self.path_for(&entry.canonical_id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(&entry)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, canonical_id: &str) -> AppResult<()> {
        match fs::remove_file(self.path_for(canonical_id)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn retain(&self, keep: &dyn Fn(&CachedReport) -> bool) -> AppResult<usize> {
        let mut removed = 0;
        for path in self.entries()? {
            let keep_it = fs::read_to_string(&path)
                .ok()
                .and_then(|raw| serde_json::from_str::<CachedReport>(&raw).ok())
                .is_some_and(|entry| keep(&entry));
            // Unreadable files are dropped too
            if !keep_it && fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn len(&self) -> usize {
        self.entries().map(|e| e.len()).unwrap_or(0)
    }
}

// ============================================
// Cache front
// ============================================

/// Report cache with TTL freshness and hit/miss statistics
#[derive(Clone)]
pub struct ReportCache {
    store: Arc<dyn ReportStore>,
    ttl: CacheTtl,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl ReportCache {
    pub fn new(store: Arc<dyn ReportStore>, ttl: CacheTtl) -> Self {
        Self {
            store,
            ttl,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn in_memory(ttl: CacheTtl) -> Self {
        Self::new(Arc::new(MemoryReportStore::new()), ttl)
    }

    /// Disk store when a cache dir is configured, memory otherwise.
    /// An unusable cache dir falls back to memory.
    pub fn from_config(config: &ScanConfig) -> Self {
        let Some(dir) = &config.cache_dir else {
            return Self::in_memory(config.cache_ttl.clone());
        };
        match DiskReportStore::open(dir) {
            Ok(store) => {
                info!("💾 Report cache on disk at {}", dir.display());
                Self::new(Arc::new(store), config.cache_ttl.clone())
            }
            Err(e) => {
                warn!("⚠️ {} - falling back to in-memory cache", e);
                Self::in_memory(config.cache_ttl.clone())
            }
        }
    }

    pub fn ttl(&self) -> &CacheTtl {
        &self.ttl
    }

    fn ttl_for_id(&self, canonical_id: &str) -> Duration {
        let prefix = canonical_id.split(':').next().unwrap_or_default();
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.canonical_prefix() == prefix)
            .map_or_else(|| self.ttl.max(), |kind| self.ttl.for_kind(kind))
    }

    /// Fresh report for an entity, if any
    pub fn get_fresh(&self, entity: &ResolvedEntity) -> Option<CachedReport> {
        let key = entity.canonical_id();
        let ttl = self.ttl.for_kind(entity.kind);
        let now = Utc::now();

        match self.store.get(&key) {
            Ok(Some(entry)) if entry.is_fresh(ttl, now) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                info!("✅ CACHE HIT: {} (age: {}s)", key, entry.age_secs(now));
                Some(entry)
            }
            Ok(Some(entry)) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("📭 CACHE MISS (stale, {}s old): {}", entry.age_secs(now), key);
                None
            }
            Ok(None) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("📭 CACHE MISS: {}", key);
                None
            }
            Err(e) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                warn!("⚠️ Cache read failed for {}: {}", key, e);
                None
            }
        }
    }

    /// Whatever is stored for a canonical id, fresh or not
    pub fn lookup(&self, canonical_id: &str) -> Option<CachedReport> {
        self.store.get(canonical_id).unwrap_or_else(|e| {
            warn!("⚠️ Cache read failed for {}: {}", canonical_id, e);
            None
        })
    }

    /// Whether a stored entry is still within its kind's TTL
    pub fn is_fresh(&self, entry: &CachedReport) -> bool {
        entry.is_fresh(self.ttl_for_id(&entry.canonical_id), Utc::now())
    }

    pub fn put(&self, entity: &ResolvedEntity, report: Report) -> AppResult<()> {
        let key = entity.canonical_id();
        self.store.put(CachedReport::new(key.clone(), report))?;
        info!(
            "💾 CACHE SET: {} (TTL: {}s)",
            key,
            self.ttl.for_kind(entity.kind).as_secs()
        );
        Ok(())
    }

    pub fn invalidate(&self, canonical_id: &str) -> AppResult<()> {
        self.store.remove(canonical_id)?;
        debug!("🗑️ CACHE INVALIDATE: {}", canonical_id);
        Ok(())
    }

    /// Remove every entry past its kind's TTL
    pub fn cleanup_expired(&self) -> usize {
        let now = Utc::now();
        let keep = |entry: &CachedReport| entry.is_fresh(self.ttl_for_id(&entry.canonical_id), now);
        match self.store.retain(&keep) {
            Ok(removed) => {
                if removed > 0 {
                    info!("🧹 CACHE CLEANUP: {} expired entries removed", removed);
                }
                removed
            }
            Err(e) => {
                warn!("⚠️ Cache cleanup failed: {}", e);
                0
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            (hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            backend: self.store.name(),
            entries: self.store.len(),
            hits,
            misses,
            hit_rate,
        }
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub backend: &'static str,
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}
