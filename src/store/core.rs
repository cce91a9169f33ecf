//! store/core: структура Store, хэндлы, версия файла и teardown.
//!
//! Drop выполняет тот же teardown, что и close(), но только логирует: очистка
//! при уничтожении не должна маскировать исходный результат операции.

use log::{debug, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::config::StoreConfig;
use crate::consts::{UNKNOWN_FILE_VERSION, VERSION_KEY};
use crate::error::{Result, StoreError};
use crate::kv::KvHandle;
use crate::registry::{HandleId, HandleRegistry};
use crate::shadow::ShadowCopy;
use crate::util::is_existing_file;

/// Crash-tolerant handle on one INI store file.
///
/// Edits go to a private shadow copy; `save` publishes it to the canonical
/// path or to the `<path>~` draft.
///
/// The shadow location is derived from the canonical path alone. Opening a
/// second `Store` on the same path, read-only included, replaces the first
/// one's shadow copy and deletes it on teardown. Keeping at most one live
/// `Store` per path is up to the caller.
#[derive(Debug)]
pub struct Store {
    pub(crate) path: PathBuf,
    pub(crate) backup: PathBuf,
    pub(crate) shadow: ShadowCopy,
    pub(crate) registry: HandleRegistry,
    pub(crate) read_only: bool,
    pub(crate) file_version: i32,
    pub(crate) cfg: StoreConfig,
    pub(crate) closed: bool,
}

/// Structured result of tearing a Store down.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TeardownReport {
    /// Handles that were still registered and had to be force-disposed.
    pub leaked_handles: usize,
    pub shadow_removed: bool,
    pub backup_removed: bool,
}

/// Snapshot of a Store's on-disk state.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    pub path: String,
    pub backup_path: String,
    pub shadow_path: String,
    pub canonical_exists: bool,
    pub backup_exists: bool,
    pub shadow_exists: bool,
    pub file_version: Option<i32>,
    pub read_only: bool,
    pub open_handles: usize,
}

impl Store {
    // ----------------- accessors -----------------

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup
    }

    pub fn shadow_path(&self) -> &Path {
        self.shadow.path()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn config(&self) -> &StoreConfig {
        &self.cfg
    }

    /// Cached `meta.file_version`, or UNKNOWN_FILE_VERSION (-1).
    pub fn file_version(&self) -> i32 {
        self.file_version
    }

    pub fn has_file_version(&self) -> bool {
        self.file_version != UNKNOWN_FILE_VERSION
    }

    pub fn open_handles(&self) -> usize {
        self.registry.len()
    }

    pub fn status(&self) -> StoreStatus {
        StoreStatus {
            path: self.path.display().to_string(),
            backup_path: self.backup.display().to_string(),
            shadow_path: self.shadow.path().display().to_string(),
            canonical_exists: is_existing_file(&self.path),
            backup_exists: is_existing_file(&self.backup),
            shadow_exists: self.shadow.exists(),
            file_version: self.has_file_version().then_some(self.file_version),
            read_only: self.read_only,
            open_handles: self.registry.len(),
        }
    }

    // ----------------- handles -----------------

    /// Open a new handle on the shadow copy. Release it with `release`.
    pub fn acquire(&mut self) -> Result<HandleId> {
        self.registry.acquire()
    }

    pub fn handle(&self, id: HandleId) -> Option<&(dyn KvHandle + 'static)> {
        self.registry.get(id)
    }

    pub fn handle_mut(&mut self, id: HandleId) -> Option<&mut (dyn KvHandle + 'static)> {
        self.registry.get_mut(id)
    }

    /// Flush and retire a handle. If the flush fails the handle stays open
    /// and the error is returned; a later `save` reports it again.
    pub fn release(&mut self, id: HandleId) -> Result<()> {
        self.registry.release(id)
    }

    /// Run `f` on a transient handle (acquire, f, release).
    pub fn with_handle<R, F>(&mut self, f: F) -> Result<R>
    where
        F: FnOnce(&mut (dyn KvHandle + 'static)) -> R,
    {
        let id = self.registry.acquire()?;
        let out = match self.registry.get_mut(id) {
            Some(h) => f(h),
            None => return Err(StoreError::logic(format!("handle {id} vanished after acquire"))),
        };
        self.registry.release(id)?;
        Ok(out)
    }

    // ----------------- version -----------------

    pub fn set_file_version(&mut self, version: i32) -> Result<()> {
        // i32::to_string is locale-independent decimal
        let text = version.to_string();
        let id = self.registry.acquire()?;
        if let Some(h) = self.registry.get_mut(id) {
            h.set(VERSION_KEY, &text);
        }
        self.file_version = version;
        self.registry.release(id)?;
        debug!("store: {} file_version={}", self.path.display(), version);
        Ok(())
    }

    pub(crate) fn read_file_version(&mut self) -> Result<i32> {
        let raw = self.with_handle(|h| h.get(VERSION_KEY))?;
        Ok(raw
            .and_then(|s| s.trim().parse::<i32>().ok())
            .unwrap_or(UNKNOWN_FILE_VERSION))
    }

    // ----------------- teardown -----------------

    /// Tear the store down explicitly and get the diagnostic back.
    pub fn close(mut self) -> TeardownReport {
        self.teardown()
    }

    pub(crate) fn teardown(&mut self) -> TeardownReport {
        if self.closed {
            return TeardownReport::default();
        }
        self.closed = true;

        let leaked_handles = self.registry.dispose_all();
        if leaked_handles > 0 {
            warn!(
                "store: {} handle(s) on {} were not released before teardown",
                leaked_handles,
                self.path.display()
            );
        }
        let (shadow_removed, backup_removed) = self.shadow.teardown();

        let report = TeardownReport {
            leaked_handles,
            shadow_removed,
            backup_removed,
        };
        info!("store: closed {} ({:?})", self.path.display(), report);
        report
    }

    /// Give up on a store that failed to finish opening: drop handles and the
    /// shadow file but leave canonical and backup untouched.
    pub(crate) fn abandon(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.registry.dispose_all();
        if let Err(e) = self.shadow.remove() {
            warn!("store: could not remove {}: {}", self.shadow.path().display(), e);
        }
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        let _ = self.teardown();
    }
}
