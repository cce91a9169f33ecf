//! store/remove: удалить canonical, backup и shadow.
//!
//! Отсутствие файлов не ошибка (повторный remove проходит). Shadow удаляется
//! только если открытых хэндлов нет: живое состояние важнее полной очистки.

use log::{error, info, warn};
use std::io;
use std::path::PathBuf;

use crate::error::{Result, StoreError};
use crate::metrics::record_remove;
use crate::util::remove_if_exists;

use super::core::Store;

impl Store {
    pub fn remove(&self) -> Result<()> {
        if self.read_only {
            return Err(StoreError::logic("cannot remove read-only file"));
        }

        let mut failed: Vec<(PathBuf, io::Error)> = Vec::new();

        for p in [&self.path, &self.backup] {
            if let Err(e) = remove_if_exists(p) {
                warn!("remove: could not remove {}: {}", p.display(), e);
                failed.push((p.clone(), e));
            }
        }

        if self.registry.is_empty() {
            if let Err(e) = self.shadow.remove() {
                warn!("remove: could not remove {}: {}", self.shadow.path().display(), e);
                failed.push((self.shadow.path().to_path_buf(), e));
            }
        } else {
            error!(
                "remove: {} handle(s) still open on {}, keeping shadow {}",
                self.registry.len(),
                self.path.display(),
                self.shadow.path().display()
            );
        }

        record_remove();

        if failed.is_empty() {
            info!("remove: {} removed", self.path.display());
            return Ok(());
        }

        let steps = failed.len();
        let mut paths = vec![self.path.clone()];
        let mut source = None;
        for (p, e) in failed {
            if p != self.path {
                paths.push(p);
            }
            if source.is_none() {
                source = Some(e);
            }
        }
        Err(StoreError::Io {
            context: format!("could not remove file ({steps} step(s) failed)"),
            paths,
            source,
        })
    }
}
