//! Lifecycle of the shadow working copy.
//!
//! materialize(source):
//! - mkdir -p temp root;
//! - удалить устаревший shadow (если остался от прошлого запуска);
//! - побайтно скопировать source -> shadow.
//!
//! teardown(): best-effort, никогда не возвращает ошибку. Для writable store
//! заодно удаляет `<path>~`: черновик считается поглощённым, когда владелец ушёл.

use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};
use crate::metrics::record_shadow_materialized;
use crate::util::remove_if_exists;

#[derive(Debug)]
pub struct ShadowCopy {
    shadow: PathBuf,
    backup: PathBuf,
    read_only: bool,
}

impl ShadowCopy {
    pub fn new(shadow: PathBuf, backup: PathBuf, read_only: bool) -> Self {
        Self {
            shadow,
            backup,
            read_only,
        }
    }

    pub fn path(&self) -> &Path {
        &self.shadow
    }

    pub fn exists(&self) -> bool {
        self.shadow.is_file()
    }

    /// Replace the shadow file with a byte copy of `source`. Returns bytes copied.
    pub fn materialize(&self, source: &Path) -> Result<u64> {
        if let Some(dir) = self.shadow.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| StoreError::io("could not create temp directory", dir, e))?;
        }

        match remove_if_exists(&self.shadow) {
            Ok(true) => debug!("shadow: removed stale {}", self.shadow.display()),
            Ok(false) => {}
            Err(e) => return Err(StoreError::io("could not remove file", &self.shadow, e)),
        }

        let bytes = fs::copy(source, &self.shadow)
            .map_err(|e| StoreError::io_pair("could not copy file", source, &self.shadow, e))?;

        record_shadow_materialized(bytes);
        debug!(
            "shadow: materialized {} <- {} ({} B)",
            self.shadow.display(),
            source.display(),
            bytes
        );
        Ok(bytes)
    }

    /// Delete the shadow file; Ok(false) if it was already gone.
    pub fn remove(&self) -> std::io::Result<bool> {
        remove_if_exists(&self.shadow)
    }

    /// Best-effort cleanup. Returns (shadow_removed, backup_removed).
    pub fn teardown(&self) -> (bool, bool) {
        let shadow_removed = best_effort_remove(&self.shadow);
        let backup_removed = if self.read_only {
            false
        } else {
            best_effort_remove(&self.backup)
        };
        (shadow_removed, backup_removed)
    }
}

fn best_effort_remove(path: &Path) -> bool {
    match remove_if_exists(path) {
        Ok(removed) => removed,
        Err(e) => {
            warn!("teardown: could not remove {}: {}", path.display(), e);
            false
        }
    }
}
