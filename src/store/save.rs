//! store/save: flush всех хэндлов в shadow и publish в canonical или backup.

use log::{debug, info};

use crate::error::{Result, StoreError};
use crate::metrics::record_publish;

use super::core::Store;
use super::publish::publish;

impl Store {
    /// Publish the shadow copy.
    ///
    /// `to_original = true` targets the canonical path, otherwise the `<path>~`
    /// draft. Every open handle is flushed first; a dirty flush aborts before
    /// the target is touched. Read-only stores reject this with `Logic`.
    ///
    /// With the default publish mode a crash between deleting and copying the
    /// target leaves it absent. The shadow copy stays intact for this session;
    /// on the next open the canonical file (or draft) is used as usual.
    pub fn save(&mut self, to_original: bool) -> Result<()> {
        if self.read_only {
            return Err(StoreError::logic("cannot save read-only file"));
        }

        let target = if to_original {
            self.path.clone()
        } else {
            self.backup.clone()
        };

        let flushed = self.registry.flush_all()?;
        debug!(
            "save: flushed {} handle(s) into {}",
            flushed,
            self.shadow.path().display()
        );

        let bytes = publish(self.shadow.path(), &target, &self.cfg)?;
        record_publish(to_original, bytes);
        info!(
            "save: published {} -> {} ({} B, {})",
            self.shadow.path().display(),
            target.display(),
            bytes,
            if to_original { "original" } else { "draft" }
        );
        Ok(())
    }
}
