//! Tiered key/value persistence with graceful degradation.
//!
//! The shop pages historically persisted through `localStorage`, falling
//! back when the browser refused access. The Rust rendition keeps the same
//! three tiers, probed in priority order at open time:
//!
//! 1. **Durable** - one file per key under the configured data directory
//! 2. **Session** - a per-session directory under the OS temp dir
//! 3. **Memory** - an in-process map held for the page's lifetime only
//!
//! A failed probe degrades to the next tier with a warning. `get`/`set` are
//! synchronous and never panic or propagate errors: failures surface as
//! `None`/`false` plus a log line, and callers treat malformed or missing
//! content as an empty collection.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use mercadito_core::SessionId;
use tracing::{debug, warn};

/// Persisted key names shared by the stores.
pub mod keys {
    /// Key for the cart line items (JSON array).
    pub const CART: &str = "cart";

    /// Key for the favorites map (JSON object, id -> display name).
    pub const FAVORITES: &str = "favorites";
}

/// Key used for the write/read-back/remove probe. Removed afterwards.
const PROBE_KEY: &str = "probe";

/// Which tier a [`TieredStore`] ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageTier {
    /// File-backed store under the data directory; survives restarts.
    Durable,
    /// File-backed store under a per-session temp directory.
    Session,
    /// In-process map; lost when the page session ends.
    Memory,
}

impl StorageTier {
    /// Human-readable tier name for diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Durable => "durable",
            Self::Session => "session",
            Self::Memory => "memory",
        }
    }
}

/// Backend for the selected tier.
enum Backend {
    Dir(PathBuf),
    Memory(HashMap<String, String>),
}

/// Tiered key/value store shared by all state stores.
///
/// Cheaply cloneable; all clones share the same backend. Writes are
/// last-write-wins with no cross-tab or cross-process coordination.
#[derive(Clone)]
pub struct TieredStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    tier: StorageTier,
    backend: RwLock<Backend>,
}

impl TieredStore {
    /// Open the store, probing tiers in priority order.
    ///
    /// Never fails: when neither file-backed tier accepts writes, the store
    /// degrades to the in-memory tier.
    #[must_use]
    pub fn open(data_dir: &Path) -> Self {
        if let Some(backend) = probe_dir(data_dir) {
            return Self::from_backend(StorageTier::Durable, backend);
        }
        warn!(
            path = %data_dir.display(),
            "durable storage unavailable, trying session tier"
        );

        let session_dir =
            std::env::temp_dir().join(format!("mercadito-session-{}", SessionId::random()));
        if let Some(backend) = probe_dir(&session_dir) {
            return Self::from_backend(StorageTier::Session, backend);
        }
        warn!(
            path = %session_dir.display(),
            "session storage unavailable, falling back to memory"
        );

        Self::from_backend(StorageTier::Memory, Backend::Memory(HashMap::new()))
    }

    /// Open a store directly on the in-memory tier.
    ///
    /// State lives only as long as the store itself.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_backend(StorageTier::Memory, Backend::Memory(HashMap::new()))
    }

    fn from_backend(tier: StorageTier, backend: Backend) -> Self {
        debug!(tier = tier.as_str(), "storage tier selected");
        Self {
            inner: Arc::new(StoreInner {
                tier,
                backend: RwLock::new(backend),
            }),
        }
    }

    /// The tier this store degraded to.
    #[must_use]
    pub fn tier(&self) -> StorageTier {
        self.inner.tier
    }

    /// Read the raw value stored under `key`.
    ///
    /// Returns `None` for missing values, unusable keys, and read failures
    /// (logged). Callers treat absence as an empty collection.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        if !valid_key(key) {
            warn!(key, "rejecting unusable storage key");
            return None;
        }
        let Ok(backend) = self.inner.backend.read() else {
            warn!(key, "storage lock poisoned, treating value as absent");
            return None;
        };
        match &*backend {
            Backend::Dir(dir) => read_key(dir, key),
            Backend::Memory(map) => map.get(key).cloned(),
        }
    }

    /// Write `value` under `key`, reporting success.
    ///
    /// Never raises: failures are logged and reported as `false`.
    pub fn set(&self, key: &str, value: &str) -> bool {
        if !valid_key(key) {
            warn!(key, "rejecting unusable storage key");
            return false;
        }
        let Ok(mut backend) = self.inner.backend.write() else {
            warn!(key, "storage lock poisoned, dropping write");
            return false;
        };
        match &mut *backend {
            Backend::Dir(dir) => write_key(dir, key, value),
            Backend::Memory(map) => {
                map.insert(key.to_string(), value.to_string());
                true
            }
        }
    }
}

impl std::fmt::Debug for TieredStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredStore")
            .field("tier", &self.inner.tier)
            .finish_non_exhaustive()
    }
}

/// Keys map to file names, so restrict them to a safe character set.
fn valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
}

fn key_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.json"))
}

fn read_key(dir: &Path, key: &str) -> Option<String> {
    match fs::read_to_string(key_path(dir, key)) {
        Ok(value) => Some(value),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => {
            warn!(key, error = %e, "failed to read stored value");
            None
        }
    }
}

fn write_key(dir: &Path, key: &str, value: &str) -> bool {
    if let Err(e) = fs::write(key_path(dir, key), value) {
        warn!(key, error = %e, "failed to persist value");
        return false;
    }
    true
}

/// Probe a directory tier with a write/read-back/remove round trip.
fn probe_dir(dir: &Path) -> Option<Backend> {
    if let Err(e) = fs::create_dir_all(dir) {
        debug!(path = %dir.display(), error = %e, "cannot create storage directory");
        return None;
    }
    let probe = key_path(dir, PROBE_KEY);
    if let Err(e) = fs::write(&probe, "ok") {
        debug!(path = %dir.display(), error = %e, "storage probe write failed");
        return None;
    }
    let ok = fs::read_to_string(&probe).is_ok_and(|v| v == "ok");
    let _ = fs::remove_file(&probe);
    ok.then(|| Backend::Dir(dir.to_path_buf()))
}
