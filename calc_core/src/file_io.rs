//! # File I/O Module
//!
//! Persistent storage for the recent-conversion ledger:
//! - **Atomic saves**: Write to .tmp, fsync, rename to prevent corruption
//! - **File locking**: An exclusive OS lock on a `.lock` sidecar guards every write
//! - **Version validation**: Ensure schema compatibility on load
//!
//! ## File Format
//!
//! ```json
//! {
//!   "version": "0.1.0",
//!   "entries": [
//!     { "id": "…", "category": "length", "from_unit": "kilometer",
//!       "to_unit": "mile", "value": 5.0, "result": 3.106855,
//!       "timestamp": "2026-10-19T12:00:00Z" }
//!   ]
//! }
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use calc_core::file_io::JsonFileStore;
//! use calc_core::ledger::Ledger;
//! use calc_core::units::CategoryId;
//!
//! let store = JsonFileStore::new("recent.json");
//! let mut ledger = Ledger::open(store, 25)?;
//! ledger.record_conversion(CategoryId::Length, "kilometer", "mile", 5.0)?;
//! # Ok::<(), calc_core::errors::CalcError>(())
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::ledger::{LedgerStore, RecentConversion};

/// Current schema version for ledger files
pub const LEDGER_SCHEMA_VERSION: &str = "0.1.0";

/// On-disk ledger document
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LedgerFile {
    version: String,
    entries: Vec<RecentConversion>,
}

/// Exclusive lock guard over a `.lock` sidecar file.
///
/// The sidecar persists between saves; the OS lock is released when the
/// guard drops.
pub struct FileLock {
    lock_path: PathBuf,
    _lock_file: File,
}

impl FileLock {
    /// Acquire the lock without blocking.
    ///
    /// # Returns
    ///
    /// * `Ok(FileLock)` - Lock acquired successfully
    /// * `Err(CalcError::FileLocked)` - Another handle holds the lock
    pub fn acquire(path: &Path) -> CalcResult<Self> {
        let lock_path = sidecar_path(path, "lock");

        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| {
                CalcError::file_error("create lock", lock_path.display().to_string(), e.to_string())
            })?;

        lock_file.try_lock_exclusive().map_err(|_| CalcError::FileLocked {
            path: path.display().to_string(),
        })?;

        Ok(FileLock {
            lock_path,
            _lock_file: lock_file,
        })
    }

    /// Path of the sidecar lock file
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }
}

/// Ledger store backed by a JSON file. A missing file is an empty ledger.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Caller must hold the `FileLock`.
    fn write_entries(&self, entries: Vec<RecentConversion>) -> CalcResult<()> {
        let count = entries.len();
        let file = LedgerFile {
            version: LEDGER_SCHEMA_VERSION.to_string(),
            entries,
        };
        write_json_atomic(&file, &self.path)?;
        log::debug!("saved {} ledger entries to {}", count, self.path.display());
        Ok(())
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> CalcResult<Vec<RecentConversion>> {
        if !self.path.exists() {
            log::debug!("no ledger at {}, starting empty", self.path.display());
            return Ok(Vec::new());
        }

        let contents = read_to_string(&self.path)?;
        let file: LedgerFile = serde_json::from_str(&contents).map_err(|e| CalcError::SerializationError {
            reason: format!("Invalid JSON in {}: {}", self.path.display(), e),
        })?;
        validate_version(&file.version)?;

        log::debug!("loaded {} ledger entries from {}", file.entries.len(), self.path.display());
        Ok(file.entries)
    }

    fn save(&mut self, entries: &[RecentConversion]) -> CalcResult<()> {
        let _lock = FileLock::acquire(&self.path)?;
        self.write_entries(entries.to_vec())
    }

    fn update<F>(&mut self, change: F) -> CalcResult<Vec<RecentConversion>>
    where
        F: FnOnce(Vec<RecentConversion>) -> Vec<RecentConversion>,
    {
        let _lock = FileLock::acquire(&self.path)?;
        let next = change(self.load()?);
        self.write_entries(next.clone())?;
        Ok(next)
    }

    fn clear(&mut self) -> CalcResult<()> {
        let _lock = FileLock::acquire(&self.path)?;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CalcError::file_error("remove", self.path.display().to_string(), e.to_string())),
        }
    }
}

/// `<path>.<suffix>`, keeping the original extension
fn sidecar_path(path: &Path, suffix: &str) -> PathBuf {
    let mut sidecar = path.to_path_buf();
    let extension = sidecar
        .extension()
        .map(|e| format!("{}.{}", e.to_string_lossy(), suffix))
        .unwrap_or_else(|| suffix.to_string());
    sidecar.set_extension(extension);
    sidecar
}

/// Read a whole file as UTF-8.
fn read_to_string(path: &Path) -> CalcResult<String> {
    let mut file = File::open(path).map_err(|e| {
        CalcError::file_error("open", path.display().to_string(), e.to_string())
    })?;

    let mut contents = String::new();
    file.read_to_string(&mut contents).map_err(|e| {
        CalcError::file_error("read", path.display().to_string(), e.to_string())
    })?;
    Ok(contents)
}

/// Serialize `value` and write it with atomic-rename semantics.
///
/// 1. Serialize to JSON
/// 2. Write to a temporary file (.tmp)
/// 3. Sync to disk (fsync)
/// 4. Rename over the target (atomic on most filesystems)
fn write_json_atomic<T: Serialize>(value: &T, path: &Path) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    let tmp_path = sidecar_path(path, "tmp");

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        CalcError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        CalcError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        CalcError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        log::warn!("failed to move {} into place: {}", tmp_path.display(), e);
        CalcError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    Ok(())
}

/// Validate that a file version is compatible with the current schema.
fn validate_version(file_version: &str) -> CalcResult<()> {
    let file_parts: Vec<u32> = file_version
        .split('.')
        .filter_map(|p| p.parse().ok())
        .collect();
    let current_parts: Vec<u32> = LEDGER_SCHEMA_VERSION
        .split('.')
        .filter_map(|p| p.parse().ok())
        .collect();

    let mismatch = || CalcError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: LEDGER_SCHEMA_VERSION.to_string(),
    };

    if file_parts.is_empty() || current_parts.is_empty() {
        return Err(mismatch());
    }

    // Major version must match
    if file_parts[0] != current_parts[0] {
        return Err(mismatch());
    }

    // For 0.x versions, a newer minor may carry breaking changes
    if current_parts[0] == 0 && file_parts.len() > 1 && current_parts.len() > 1 && file_parts[1] > current_parts[1] {
        return Err(mismatch());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;
    use crate::units::CategoryId;
    use std::env::temp_dir;

    fn temp_ledger_path(name: &str) -> PathBuf {
        temp_dir().join(format!("calc_core_test_{}_{}.json", name, uuid::Uuid::new_v4()))
    }

    fn cleanup(path: &Path) {
        let _ = fs::remove_file(path);
        let _ = fs::remove_file(sidecar_path(path, "lock"));
    }

    #[test]
    fn test_sidecar_path_generation() {
        let path = Path::new("/path/to/recent.json");
        assert_eq!(sidecar_path(path, "lock"), Path::new("/path/to/recent.json.lock"));
        assert_eq!(sidecar_path(Path::new("/tmp/ledger"), "tmp"), Path::new("/tmp/ledger.tmp"));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let path = temp_ledger_path("missing");
        let store = JsonFileStore::new(&path);
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_ledger_path("roundtrip");

        {
            let mut ledger = Ledger::open(JsonFileStore::new(&path), 3).unwrap();
            for value in [1.0, 2.0, 3.0, 4.0] {
                ledger
                    .record_conversion(CategoryId::Length, "meter", "centimeter", value)
                    .unwrap();
            }
        }

        let reopened = Ledger::open(JsonFileStore::new(&path), 3).unwrap();
        let values: Vec<f64> = reopened.list().iter().map(|e| e.value).collect();
        assert_eq!(values, vec![4.0, 3.0, 2.0]);
        assert_eq!(reopened.list()[0].result, 400.0);

        cleanup(&path);
    }

    #[test]
    fn test_two_handles_on_one_file_keep_both_entries() {
        let path = temp_ledger_path("two_handles");

        let mut first = Ledger::open(JsonFileStore::new(&path), 25).unwrap();
        let mut second = Ledger::open(JsonFileStore::new(&path), 25).unwrap();
        first
            .record_conversion(CategoryId::Length, "meter", "centimeter", 1.0)
            .unwrap();
        second
            .record_conversion(CategoryId::Length, "meter", "centimeter", 2.0)
            .unwrap();

        let second_view: Vec<f64> = second.list().iter().map(|e| e.value).collect();
        assert_eq!(second_view, vec![2.0, 1.0]);

        let reopened = Ledger::open(JsonFileStore::new(&path), 25).unwrap();
        let persisted: Vec<f64> = reopened.list().iter().map(|e| e.value).collect();
        assert_eq!(persisted, vec![2.0, 1.0]);

        cleanup(&path);
    }

    #[test]
    fn test_update_fails_while_locked() {
        let path = temp_ledger_path("update_locked");
        let lock = FileLock::acquire(&path).unwrap();

        let mut ledger = Ledger::open(JsonFileStore::new(&path), 5).unwrap();
        let err = ledger
            .record_conversion(CategoryId::Time, "hour", "minute", 1.0)
            .unwrap_err();
        assert!(matches!(err, CalcError::FileLocked { .. }));
        assert!(ledger.is_empty());

        drop(lock);
        cleanup(&path);
    }

    #[test]
    fn test_atomic_save_creates_no_tmp_file() {
        let path = temp_ledger_path("atomic");
        let tmp_path = sidecar_path(&path, "tmp");

        let mut store = JsonFileStore::new(&path);
        store
            .save(&[RecentConversion::new(CategoryId::Time, "hour", "minute", 2.0, 120.0)])
            .unwrap();

        assert!(!tmp_path.exists());
        assert!(path.exists());

        cleanup(&path);
    }

    #[test]
    fn test_save_fails_while_locked() {
        let path = temp_ledger_path("locked");

        let lock = FileLock::acquire(&path).unwrap();
        assert!(lock.lock_path().exists());

        let mut store = JsonFileStore::new(&path);
        let err = store.save(&[]).unwrap_err();
        assert!(matches!(err, CalcError::FileLocked { .. }));
        assert!(err.is_recoverable());

        drop(lock);
        assert!(store.save(&[]).is_ok());

        cleanup(&path);
    }

    #[test]
    fn test_clear_removes_file() {
        let path = temp_ledger_path("clear");
        let mut store = JsonFileStore::new(&path);
        store.save(&[]).unwrap();
        assert!(path.exists());

        store.clear().unwrap();
        assert!(!path.exists());
        store.clear().unwrap();

        cleanup(&path);
    }

    #[test]
    fn test_incompatible_version_rejected() {
        let path = temp_ledger_path("version");
        fs::write(&path, r#"{ "version": "1.0.0", "entries": [] }"#).unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(CalcError::VersionMismatch { .. })));

        cleanup(&path);
    }

    #[test]
    fn test_corrupt_file_rejected() {
        let path = temp_ledger_path("corrupt");
        fs::write(&path, "not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(CalcError::SerializationError { .. })));

        cleanup(&path);
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(LEDGER_SCHEMA_VERSION).is_ok());
        assert!(validate_version("0.1.7").is_ok());
        assert!(validate_version("0.0.9").is_ok());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("garbage").is_err());
    }
}
