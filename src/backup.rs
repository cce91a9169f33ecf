//! Backup (draft) locator.
//!
//! Рядом с каноническим файлом `<path>` может лежать черновик `<path>~`:
//! результат последнего save(false). При open с restore=true черновик
//! предпочтительнее оригинала, если существует.

use log::debug;
use std::path::{Path, PathBuf};

use crate::consts::BACKUP_SUFFIX;
use crate::error::{Result, StoreError};
use crate::util::{is_existing_file, with_suffix};

/// `<canonical>~`
pub fn backup_path_of(canonical: &Path) -> PathBuf {
    with_suffix(canonical, BACKUP_SUFFIX)
}

/// Which file an open should materialize the shadow copy from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Canonical,
    Backup,
}

#[derive(Debug, Clone)]
pub struct SourceChoice {
    pub kind: SourceKind,
    pub path: PathBuf,
}

/// Pick the source for the shadow copy.
///
/// - restore && `<path>~` exists -> backup;
/// - otherwise -> canonical.
///
/// Fails with NotFound when the chosen file does not exist.
pub fn locate_source(canonical: &Path, restore: bool) -> Result<SourceChoice> {
    let backup = backup_path_of(canonical);
    let choice = if restore && is_existing_file(&backup) {
        SourceChoice {
            kind: SourceKind::Backup,
            path: backup,
        }
    } else {
        SourceChoice {
            kind: SourceKind::Canonical,
            path: canonical.to_path_buf(),
        }
    };

    if !is_existing_file(&choice.path) {
        return Err(StoreError::not_found(&choice.path));
    }
    debug!(
        "backup: source for {} is {:?} ({})",
        canonical.display(),
        choice.kind,
        choice.path.display()
    );
    Ok(choice)
}
