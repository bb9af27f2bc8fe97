//! Bounded, persisted cache of system classifications.
//!
//! Maps a system id to the classification string the remote lookup service
//! reported for it. The cache is LRU-bounded: `get` and `put` both promote
//! the touched key, and inserting past capacity evicts the least-recently
//! -used entry. Persistence is a flat JSON `id -> name` map written through
//! a temp file so a crash mid-write leaves the previous file intact.

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{Error, Result};
use crate::route::SystemId;

/// Default number of entries retained before eviction starts.
pub const DEFAULT_CAPACITY: usize = 2000;

struct CacheInner {
    entries: HashMap<SystemId, String>,
    /// Recency order, least-recently-used first.
    order: VecDeque<SystemId>,
}

impl CacheInner {
    fn promote(&mut self, id: SystemId) {
        if let Some(pos) = self.order.iter().position(|&key| key == id) {
            self.order.remove(pos);
        }
        self.order.push_back(id);
    }
}

/// Thread-safe LRU cache of `system id -> star classification`.
pub struct SystemCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

impl SystemCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity,
        }
    }

    /// Look up a classification, promoting the key on a hit.
    pub fn get(&self, id: SystemId) -> Option<String> {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        let value = inner.entries.get(&id).cloned()?;
        inner.promote(id);
        Some(value)
    }

    /// Insert or refresh a classification as most-recently-used, evicting
    /// the least-recently-used entry when over capacity.
    pub fn put(&self, id: SystemId, value: impl Into<String>) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        inner.entries.insert(id, value.into());
        inner.promote(id);
        while inner.entries.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            } else {
                break;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache mutex poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Restore the cache from `path`, replacing current contents.
    ///
    /// A missing file is not an error and leaves the cache empty. Returns
    /// the number of entries loaded. The persisted map carries no recency
    /// information, so a file holding more than `capacity` entries is
    /// trimmed in arbitrary order.
    pub fn load(&self, path: &Path) -> Result<usize> {
        if !path.exists() {
            debug!(path = %path.display(), "no cache file yet, starting empty");
            return Ok(0);
        }
        let raw = fs::read_to_string(path)?;
        let parsed: HashMap<SystemId, String> =
            serde_json::from_str(&raw).map_err(|err| Error::CacheFileCorrupt {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;

        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        inner.entries.clear();
        inner.order.clear();
        for (id, value) in parsed {
            inner.entries.insert(id, value);
            inner.order.push_back(id);
        }
        while inner.entries.len() > self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.entries.remove(&oldest);
            }
        }
        let loaded = inner.entries.len();
        debug!(path = %path.display(), loaded, "restored system cache");
        Ok(loaded)
    }

    /// Persist the full current map to `path` atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let snapshot = {
            let inner = self.inner.lock().expect("cache mutex poisoned");
            inner.entries.clone()
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(parent)?;
        serde_json::to_writer(tmp.as_file_mut(), &snapshot)?;
        tmp.flush()?;
        tmp.persist(path).map_err(|err| err.error)?;
        debug!(path = %path.display(), entries = snapshot.len(), "saved system cache");
        Ok(())
    }
}

impl Default for SystemCache {
    fn default() -> Self {
        Self::new()
    }
}
