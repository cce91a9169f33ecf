//! Centralized configuration and builder for IniVault.
//!
//! Goals:
//! - Single place to collect tunables instead of scattering env lookups.
//! - StoreConfig::from_env() reads INIVAULT_* variables; builder-style setters override them.
//! - StoreBuilder carries a config plus the key-value engine and opens/creates a Store.
//!
//! Defaults reproduce the plain protocol:
//! - publish_mode = DeleteThenCopy (remove target, copy shadow, verify existence)
//! - verify_checksum = false
//! - sync_on_publish = false
//!   All of the above can be overridden via ENV or builder.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::consts::{ENV_FSYNC, ENV_PUBLISH_MODE, ENV_TEMP_ROOT, ENV_VERIFY_CRC, TEMP_ROOT_DIR};
use crate::error::Result;
use crate::kv::{IniEngine, KvEngine};
use crate::store::Store;

/// How the shadow copy is published onto its target (canonical or backup).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublishMode {
    /// Remove the target, then copy the shadow over it.
    /// A crash between the two steps leaves the target absent.
    DeleteThenCopy,
    /// Copy the shadow to `<target>.publish`, then rename it over the target.
    AtomicRename,
}

impl PublishMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "copy" | "delete-then-copy" | "delete_then_copy" => Some(PublishMode::DeleteThenCopy),
            "rename" | "atomic" | "atomic-rename" | "atomic_rename" => Some(PublishMode::AtomicRename),
            _ => None,
        }
    }
}

impl fmt::Display for PublishMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishMode::DeleteThenCopy => write!(f, "delete-then-copy"),
            PublishMode::AtomicRename => write!(f, "atomic-rename"),
        }
    }
}

/// Top-level configuration for a Store.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Directory holding shadow working copies.
    /// Env: INIVAULT_TEMP_ROOT (default <os temp dir>/IniVault)
    pub temp_root: Option<PathBuf>,

    /// Publish strategy used by save().
    /// Env: INIVAULT_PUBLISH_MODE = copy|rename (default copy)
    pub publish_mode: PublishMode,

    /// Compare CRC32 of shadow and target after publish.
    /// Env: INIVAULT_VERIFY_CRC (default false; "1|true|on|yes" => true)
    pub verify_checksum: bool,

    /// fsync the published target before returning from save().
    /// Env: INIVAULT_FSYNC (default false)
    pub sync_on_publish: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            temp_root: None,
            publish_mode: PublishMode::DeleteThenCopy,
            verify_checksum: false,
            sync_on_publish: false,
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name).ok().map(|v| {
        let s = v.trim().to_ascii_lowercase();
        s == "1" || s == "true" || s == "on" || s == "yes"
    })
}

impl StoreConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var(ENV_TEMP_ROOT) {
            let s = v.trim();
            if !s.is_empty() {
                cfg.temp_root = Some(PathBuf::from(s));
            }
        }

        if let Ok(v) = std::env::var(ENV_PUBLISH_MODE) {
            match PublishMode::parse(&v) {
                Some(m) => cfg.publish_mode = m,
                None => log::warn!("{}: unknown publish mode '{}', keeping {}", ENV_PUBLISH_MODE, v, cfg.publish_mode),
            }
        }

        if let Some(on) = env_flag(ENV_VERIFY_CRC) {
            cfg.verify_checksum = on;
        }
        if let Some(on) = env_flag(ENV_FSYNC) {
            cfg.sync_on_publish = on;
        }

        cfg
    }

    /// Effective temp root: explicit override or `<os temp dir>/IniVault`.
    pub fn resolved_temp_root(&self) -> PathBuf {
        match &self.temp_root {
            Some(p) => p.clone(),
            None => std::env::temp_dir().join(TEMP_ROOT_DIR),
        }
    }

    // ----------------- fluent setters -----------------

    pub fn with_temp_root<P: Into<PathBuf>>(mut self, root: Option<P>) -> Self {
        self.temp_root = root.map(Into::into);
        self
    }

    pub fn with_publish_mode(mut self, mode: PublishMode) -> Self {
        self.publish_mode = mode;
        self
    }

    pub fn with_verify_checksum(mut self, on: bool) -> Self {
        self.verify_checksum = on;
        self
    }

    pub fn with_sync_on_publish(mut self, on: bool) -> Self {
        self.sync_on_publish = on;
        self
    }
}

impl fmt::Display for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StoreConfig {{ \
             temp_root: {}, \
             publish_mode: {}, \
             verify_checksum: {}, \
             sync_on_publish: {} \
             }}",
            self.resolved_temp_root().display(),
            self.publish_mode,
            self.verify_checksum,
            self.sync_on_publish,
        )
    }
}

/// Builder that collects a StoreConfig and a key-value engine.
/// Returned by `Store::builder()`.
#[derive(Clone)]
pub struct StoreBuilder {
    cfg: StoreConfig,
    engine: Option<Arc<dyn KvEngine>>,
}

impl Default for StoreBuilder {
    fn default() -> Self {
        // Start from env, then allow overrides.
        Self {
            cfg: StoreConfig::from_env(),
            engine: None,
        }
    }
}

impl fmt::Debug for StoreBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreBuilder")
            .field("cfg", &self.cfg)
            .field("engine", &self.engine.as_ref().map(|e| e.name()).unwrap_or("ini"))
            .finish()
    }
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a clean default (without reading env).
    pub fn from_default() -> Self {
        Self {
            cfg: StoreConfig::default(),
            engine: None,
        }
    }

    pub fn config(mut self, cfg: StoreConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn temp_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.cfg.temp_root = Some(root.into());
        self
    }

    pub fn publish_mode(mut self, mode: PublishMode) -> Self {
        self.cfg.publish_mode = mode;
        self
    }

    pub fn verify_checksum(mut self, on: bool) -> Self {
        self.cfg.verify_checksum = on;
        self
    }

    pub fn sync_on_publish(mut self, on: bool) -> Self {
        self.cfg.sync_on_publish = on;
        self
    }

    /// Replace the default INI engine.
    pub fn engine(mut self, engine: Arc<dyn KvEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Finish the builder and obtain the configuration.
    pub fn build(self) -> StoreConfig {
        self.cfg
    }

    pub fn open(self, path: &Path, restore: bool, read_only: bool) -> Result<Store> {
        let (cfg, engine) = self.into_parts();
        Store::open_with(path, restore, read_only, cfg, engine)
    }

    pub fn create(self, path: &Path, version: i32) -> Result<Store> {
        let (cfg, engine) = self.into_parts();
        Store::create_with(path, version, cfg, engine)
    }

    fn into_parts(self) -> (StoreConfig, Arc<dyn KvEngine>) {
        let engine = self.engine.unwrap_or_else(|| Arc::new(IniEngine::new()));
        (self.cfg, engine)
    }
}
