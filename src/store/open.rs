//! store/open: открытие существующего store и создание нового.

use log::{debug, info};
use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use crate::backup::{backup_path_of, locate_source};
use crate::config::{StoreBuilder, StoreConfig};
use crate::error::{Result, StoreError};
use crate::kv::{IniEngine, KvEngine};
use crate::registry::HandleRegistry;
use crate::shadow::{derive_shadow_path, ShadowCopy};
use crate::util::{absolute, remove_if_exists};

use super::core::Store;
use crate::consts::UNKNOWN_FILE_VERSION;

impl Store {
    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }

    /// Open with env config and the INI engine.
    pub fn open(path: &Path, restore: bool, read_only: bool) -> Result<Self> {
        Self::open_with(
            path,
            restore,
            read_only,
            StoreConfig::from_env(),
            Arc::new(IniEngine::new()),
        )
    }

    /// Open an existing store.
    ///
    /// With `restore` the `<path>~` draft is preferred when present. The chosen
    /// file is copied into the shadow location and the version key is read
    /// through one transient handle.
    pub fn open_with(
        path: &Path,
        restore: bool,
        read_only: bool,
        cfg: StoreConfig,
        engine: Arc<dyn KvEngine>,
    ) -> Result<Self> {
        let canonical =
            absolute(path).map_err(|e| StoreError::io("could not resolve path", path, e))?;
        let source = locate_source(&canonical, restore)?;

        let backup = backup_path_of(&canonical);
        let shadow_path = derive_shadow_path(&cfg.resolved_temp_root(), &canonical);
        let shadow = ShadowCopy::new(shadow_path.clone(), backup.clone(), read_only);
        shadow.materialize(&source.path)?;

        let mut store = Store {
            path: canonical,
            backup,
            shadow,
            registry: HandleRegistry::new(shadow_path, engine),
            read_only,
            file_version: UNKNOWN_FILE_VERSION,
            cfg,
            closed: false,
        };

        match store.read_file_version() {
            Ok(v) => store.file_version = v,
            Err(e) => {
                store.abandon();
                return Err(e);
            }
        }

        info!(
            "store: opened {} from {:?} (version {}, read_only={})",
            store.path.display(),
            source.kind,
            store.file_version,
            read_only
        );
        Ok(store)
    }

    /// Create with env config and the INI engine.
    pub fn create(path: &Path, version: i32) -> Result<Self> {
        Self::create_with(path, version, StoreConfig::from_env(), Arc::new(IniEngine::new()))
    }

    /// Create a new store as an unpublished draft.
    ///
    /// Any existing file at `path` is removed and an empty `<path>~` is
    /// created. With `version >= 0` the version key is written and saved to
    /// the draft, never to `path`.
    pub fn create_with(
        path: &Path,
        version: i32,
        cfg: StoreConfig,
        engine: Arc<dyn KvEngine>,
    ) -> Result<Self> {
        let canonical =
            absolute(path).map_err(|e| StoreError::io("could not resolve path", path, e))?;

        if let Some(dir) = canonical.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| StoreError::io("cannot create directory", dir, e))?;
        }

        if remove_if_exists(&canonical)
            .map_err(|e| StoreError::io("cannot remove file", &canonical, e))?
        {
            debug!("store: removed existing {}", canonical.display());
        }

        let backup = backup_path_of(&canonical);
        File::create(&backup).map_err(|e| StoreError::io("cannot create file", &backup, e))?;

        let mut store = Self::open_with(&canonical, true, false, cfg, engine)?;
        if version >= 0 {
            // on error the store drops here and takes shadow + draft with it
            store.set_file_version(version)?;
            store.save(false)?;
        }
        info!("store: created {} (version {})", store.path.display(), version);
        Ok(store)
    }
}
