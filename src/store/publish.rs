//! store/publish: перенос shadow-копии на целевой путь.
//!
//! DeleteThenCopy: remove(target) -> copy(shadow, target). Между шагами target
//! отсутствует; при сбое восстановление остаётся за следующим open.
//!
//! AtomicRename: copy(shadow, target.publish) -> fsync -> rename поверх target.
//! Target всегда либо старый, либо новый целиком.
//!
//! В обоих режимах после publish проверяется, что target существует
//! (и, если включено, что CRC32 совпадает с shadow).

use log::debug;
use std::fs;
use std::path::Path;

use crate::config::{PublishMode, StoreConfig};
use crate::consts::PUBLISH_TMP_SUFFIX;
use crate::error::{Result, StoreError};
use crate::util::{file_crc32, is_existing_file, remove_if_exists, sync_path, with_suffix};

/// Publish `shadow` onto `target`. Returns bytes written.
pub(crate) fn publish(shadow: &Path, target: &Path, cfg: &StoreConfig) -> Result<u64> {
    let bytes = match cfg.publish_mode {
        PublishMode::DeleteThenCopy => delete_then_copy(shadow, target)?,
        PublishMode::AtomicRename => copy_then_rename(shadow, target)?,
    };

    if cfg.sync_on_publish {
        sync_path(target).map_err(|e| StoreError::io("could not sync file", target, e))?;
    }

    if !is_existing_file(target) {
        return Err(StoreError::io_status("error while writing to file", target));
    }

    if cfg.verify_checksum {
        let want = file_crc32(shadow).map_err(|e| StoreError::io("could not read file", shadow, e))?;
        let got = file_crc32(target).map_err(|e| StoreError::io("could not read file", target, e))?;
        if want != got {
            return Err(StoreError::io_status(
                format!("write did not take effect (crc32 {got:08x} != {want:08x})"),
                target,
            ));
        }
        debug!("publish: crc32 {:08x} verified for {}", got, target.display());
    }

    Ok(bytes)
}

fn delete_then_copy(shadow: &Path, target: &Path) -> Result<u64> {
    if remove_if_exists(target).map_err(|e| StoreError::io("could not remove file", target, e))? {
        debug!("publish: removed old {}", target.display());
    }
    fs::copy(shadow, target)
        .map_err(|e| StoreError::io_pair("could not copy file", shadow, target, e))
}

fn copy_then_rename(shadow: &Path, target: &Path) -> Result<u64> {
    let tmp = with_suffix(target, PUBLISH_TMP_SUFFIX);
    remove_if_exists(&tmp).map_err(|e| StoreError::io("could not remove file", &tmp, e))?;

    let bytes = fs::copy(shadow, &tmp)
        .map_err(|e| StoreError::io_pair("could not copy file", shadow, &tmp, e))?;
    if let Err(e) = sync_path(&tmp) {
        let _ = remove_if_exists(&tmp);
        return Err(StoreError::io("could not sync file", &tmp, e));
    }

    if let Err(e) = fs::rename(&tmp, target) {
        let _ = remove_if_exists(&tmp);
        return Err(StoreError::io_pair("could not rename file", &tmp, target, e));
    }
    debug!("publish: renamed {} -> {}", tmp.display(), target.display());
    Ok(bytes)
}
