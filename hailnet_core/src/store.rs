//! # State Store
//!
//! Durable key-value storage for calculator parameters and auth state:
//! - **One document per key**: `<data dir>/<key>.json`
//! - **Atomic saves**: write to `.tmp`, fsync, rename over the target
//! - **Locking**: exclusive OS lock (fs2) on a `.lock` file while writing
//! - **Version envelope**: every document records the schema version it was
//!   written with; incompatible versions are rejected on load
//!
//! Calculation results are never stored. They are recomputed from the
//! parameters on load.
//!
//! ## Example
//!
//! ```rust,no_run
//! use hailnet_core::parameters::BasicParameters;
//! use hailnet_core::store::{StateStore, BASIC_PARAMETERS_KEY};
//!
//! let store = StateStore::open("/tmp/hailnet")?;
//! store.save(BASIC_PARAMETERS_KEY, &BasicParameters::default())?;
//!
//! let params: Option<BasicParameters> = store.load(BASIC_PARAMETERS_KEY)?;
//! assert!(params.is_some());
//! # Ok::<(), hailnet_core::errors::CalcError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{CalcError, CalcResult};

/// Current schema version for stored documents
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Namespace key of the advanced calculator's parameters
pub const ADVANCED_PARAMETERS_KEY: &str = "advanced-hail-net-calculator-storage";
/// Namespace key of the basic calculator's parameters
pub const BASIC_PARAMETERS_KEY: &str = "basic-hail-net-calculator-storage";
/// Namespace key of the password gate
pub const AUTH_STATE_KEY: &str = "hailnet-auth-storage";

/// On-disk wrapper around a stored value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument<T> {
    pub version: String,
    pub key: String,
    pub saved_at: DateTime<Utc>,
    pub state: T,
}

/// Metadata written into `.lock` files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    pub pid: u32,
    pub machine: String,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    fn current() -> Self {
        LockInfo {
            pid: std::process::id(),
            machine: hostname().unwrap_or_else(|| "unknown".to_string()),
            locked_at: Utc::now(),
        }
    }
}

fn hostname() -> Option<String> {
    #[cfg(windows)]
    {
        std::env::var("COMPUTERNAME").ok()
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOSTNAME").ok().or_else(|| std::env::var("HOST").ok())
    }
}

/// Exclusive write lock on one document. Released on drop.
pub struct StoreLock {
    lock_path: PathBuf,
    _lock_file: File,
    pub info: LockInfo,
}

impl StoreLock {
    /// Take the OS-level lock for `document`, failing fast if another
    /// process holds it.
    pub fn acquire(document: &Path) -> CalcResult<Self> {
        let lock_path = lock_path_for(document);
        let info = LockInfo::current();

        let mut lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| CalcError::file_error("create lock", lock_path.display().to_string(), e.to_string()))?;

        if lock_file.try_lock_exclusive().is_err() {
            let holder = read_lock_info(&lock_path)
                .map(|existing| format!("pid {} on {}", existing.pid, existing.machine))
                .unwrap_or_else(|_| "another process".to_string());
            return Err(CalcError::FileLocked {
                path: document.display().to_string(),
                locked_by: holder,
            });
        }

        // The OS lock is ours, so any metadata still in the file is left over
        // from a process that exited without cleaning up.
        if let Ok(stale) = read_lock_info(&lock_path) {
            warn!(pid = stale.pid, machine = %stale.machine, path = %lock_path.display(), "taking over stale lock");
        }

        let lock_json = serde_json::to_string_pretty(&info).map_err(CalcError::serialization)?;
        lock_file
            .set_len(0)
            .and_then(|_| lock_file.write_all(lock_json.as_bytes()))
            .and_then(|_| lock_file.sync_all())
            .map_err(|e| CalcError::file_error("write lock", lock_path.display().to_string(), e.to_string()))?;

        Ok(StoreLock {
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

fn lock_path_for(document: &Path) -> PathBuf {
    document.with_extension("json.lock")
}

fn read_lock_info(lock_path: &Path) -> CalcResult<LockInfo> {
    let contents = read_to_string(lock_path, "read lock")?;
    serde_json::from_str(&contents).map_err(CalcError::serialization)
}

fn read_to_string(path: &Path, operation: &str) -> CalcResult<String> {
    let mut file =
        File::open(path).map_err(|e| CalcError::file_error(operation, path.display().to_string(), e.to_string()))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| CalcError::file_error(operation, path.display().to_string(), e.to_string()))?;
    Ok(contents)
}

/// Write `contents` to `path` so that readers see either the old or the new
/// file, never a partial one.
pub fn write_atomic(path: &Path, contents: &[u8]) -> CalcResult<()> {
    let tmp_path = path.with_extension("json.tmp");

    let mut tmp_file = File::create(&tmp_path)
        .map_err(|e| CalcError::file_error("create temp file", tmp_path.display().to_string(), e.to_string()))?;

    tmp_file
        .write_all(contents)
        .map_err(|e| CalcError::file_error("write temp file", tmp_path.display().to_string(), e.to_string()))?;

    tmp_file
        .sync_all()
        .map_err(|e| CalcError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string()))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CalcError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    Ok(())
}

/// Check that a stored document's version is readable by this build.
///
/// Major versions must match. While the major version is 0, documents from a
/// newer minor version are rejected.
pub fn validate_version(file_version: &str) -> CalcResult<()> {
    let mismatch = || CalcError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: SCHEMA_VERSION.to_string(),
    };

    let file_parts: Vec<u32> = file_version.split('.').filter_map(|p| p.parse().ok()).collect();
    let current_parts: Vec<u32> = SCHEMA_VERSION.split('.').filter_map(|p| p.parse().ok()).collect();

    if file_parts.is_empty() || current_parts.is_empty() {
        return Err(mismatch());
    }

    if file_parts[0] != current_parts[0] {
        return Err(mismatch());
    }

    if current_parts[0] == 0 && file_parts.len() > 1 && current_parts.len() > 1 && file_parts[1] > current_parts[1] {
        return Err(mismatch());
    }

    Ok(())
}

/// Directory-backed key-value store.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> CalcResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| CalcError::file_error("create directory", dir.display().to_string(), e.to_string()))?;
        Ok(StateStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the document stored under `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Persist `state` under `key`, replacing whatever was there.
    pub fn save<T: Serialize>(&self, key: &str, state: &T) -> CalcResult<()> {
        let path = self.path_for(key);
        let _lock = StoreLock::acquire(&path)?;
        self.write_document(&path, key, state)
    }

    /// Read, change and write back the value under `key` while holding its
    /// lock, so concurrent updates cannot overwrite each other. A missing or
    /// unreadable document starts from `T::default()`.
    pub fn update<T, R>(&self, key: &str, change: impl FnOnce(&mut T) -> R) -> CalcResult<R>
    where
        T: Serialize + DeserializeOwned + Default,
    {
        let path = self.path_for(key);
        let _lock = StoreLock::acquire(&path)?;

        let mut state: T = self.load_or_default(key);
        let output = change(&mut state);
        self.write_document(&path, key, &state)?;
        Ok(output)
    }

    fn write_document<T: Serialize>(&self, path: &Path, key: &str, state: &T) -> CalcResult<()> {
        let document = StoredDocument {
            version: SCHEMA_VERSION.to_string(),
            key: key.to_string(),
            saved_at: Utc::now(),
            state,
        };
        let json = serde_json::to_string_pretty(&document).map_err(CalcError::serialization)?;
        write_atomic(path, json.as_bytes())?;

        info!(key, path = %path.display(), "state saved");
        Ok(())
    }

    /// Load the value stored under `key`; `Ok(None)` if nothing was saved.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> CalcResult<Option<T>> {
        let path = self.path_for(key);
        if !path.exists() {
            debug!(key, "no stored state");
            return Ok(None);
        }

        let contents = read_to_string(&path, "read")?;
        let document: StoredDocument<T> = serde_json::from_str(&contents).map_err(|e| CalcError::SerializationError {
            reason: format!("Invalid JSON in {}: {}", path.display(), e),
        })?;

        validate_version(&document.version)?;

        if document.key != key {
            return Err(CalcError::SerializationError {
                reason: format!("{} holds key '{}', expected '{}'", path.display(), document.key, key),
            });
        }

        Ok(Some(document.state))
    }

    /// Load the value under `key`, falling back to `T::default()` when the
    /// document is missing or unreadable.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.load(key) {
            Ok(Some(state)) => state,
            Ok(None) => T::default(),
            Err(e) => {
                warn!(key, error = %e, "discarding unreadable state");
                T::default()
            }
        }
    }

    /// Delete the document under `key`. Missing documents are not an error.
    pub fn remove(&self, key: &str) -> CalcResult<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(key, "state removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CalcError::file_error("remove", path.display().to_string(), e.to_string())),
        }
    }
}
