//! Registry of open key-value handles bound to one shadow file.
//!
//! Хэндлы принадлежат реестру (арена по HandleId); вызывающая сторона держит только id.
//!
//! Правила:
//! - acquire(): открыть хэндл через движок; грязный status сразу после open -> Io.
//! - release(id): flush; успех -> хэндл удаляется, неуспех -> хэндл ОСТАЁТСЯ в реестре,
//!   чтобы save()/teardown увидели проблему, а не потеряли данные молча.
//! - dispose_all(): принудительно закрыть оставшиеся хэндлы (teardown), каждый логируется как утечка.

use log::{debug, warn};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{Result, StoreError};
use crate::kv::{KvEngine, KvHandle};
use crate::metrics::{
    record_flush_failure, record_handle_acquired, record_handle_leaked, record_handle_released,
};

/// Identity of a registered handle. Never reused within one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandleId(u64);

impl HandleId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub struct HandleRegistry {
    target: PathBuf,
    engine: Arc<dyn KvEngine>,
    next_id: u64,
    handles: BTreeMap<HandleId, Box<dyn KvHandle>>,
}

impl fmt::Debug for HandleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleRegistry")
            .field("target", &self.target)
            .field("engine", &self.engine.name())
            .field("open", &self.handles.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl HandleRegistry {
    pub fn new(target: PathBuf, engine: Arc<dyn KvEngine>) -> Self {
        Self {
            target,
            engine,
            next_id: 1,
            handles: BTreeMap::new(),
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    pub fn contains(&self, id: HandleId) -> bool {
        self.handles.contains_key(&id)
    }

    pub fn ids(&self) -> Vec<HandleId> {
        self.handles.keys().copied().collect()
    }

    /// Open a new handle on the target file and register it.
    pub fn acquire(&mut self) -> Result<HandleId> {
        let handle = self
            .engine
            .open(&self.target)
            .map_err(|e| StoreError::io("error while opening file", &self.target, e))?;

        let status = handle.status();
        if !status.is_ok() {
            // handle dropped here, never registered
            return Err(StoreError::io_status(
                format!("error while opening file ({status})"),
                &self.target,
            ));
        }

        let id = HandleId(self.next_id);
        self.next_id += 1;
        self.handles.insert(id, handle);
        record_handle_acquired();
        debug!(
            "registry: acquired handle {} on {} ({} open)",
            id,
            self.target.display(),
            self.handles.len()
        );
        Ok(id)
    }

    pub fn get(&self, id: HandleId) -> Option<&(dyn KvHandle + 'static)> {
        self.handles.get(&id).map(|h| &**h)
    }

    pub fn get_mut(&mut self, id: HandleId) -> Option<&mut (dyn KvHandle + 'static)> {
        self.handles.get_mut(&id).map(|h| &mut **h)
    }

    /// Flush and retire a handle. On flush failure the handle stays registered.
    pub fn release(&mut self, id: HandleId) -> Result<()> {
        let handle = self
            .handles
            .get_mut(&id)
            .ok_or_else(|| StoreError::logic(format!("release of unknown handle {id}")))?;

        let status = handle.flush();
        if status.is_ok() {
            self.handles.remove(&id);
            record_handle_released();
            debug!(
                "registry: released handle {} ({} open)",
                id,
                self.handles.len()
            );
            Ok(())
        } else {
            record_flush_failure();
            warn!(
                "registry: flush of handle {} to {} failed ({}), handle kept",
                id,
                self.target.display(),
                status
            );
            Err(StoreError::io_status(
                format!("error while writing to file ({status})"),
                &self.target,
            ))
        }
    }

    /// Flush every registered handle without releasing any. Stops at the first failure.
    pub fn flush_all(&mut self) -> Result<usize> {
        let mut flushed = 0usize;
        for (id, handle) in self.handles.iter_mut() {
            let status = handle.flush();
            if !status.is_ok() {
                record_flush_failure();
                return Err(StoreError::io_status(
                    format!("error while writing to file (handle {id}: {status})"),
                    &self.target,
                ));
            }
            flushed += 1;
        }
        Ok(flushed)
    }

    /// Force-dispose every remaining handle. Returns how many were leaked.
    pub fn dispose_all(&mut self) -> usize {
        let leaked = std::mem::take(&mut self.handles);
        let n = leaked.len();
        for (id, handle) in leaked {
            record_handle_leaked();
            warn!(
                "registry: handle {} on {} was never released (last status: {}), disposing",
                id,
                self.target.display(),
                handle.status()
            );
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::KvStatus;
    use std::io;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct Switch {
        fail_flush: AtomicBool,
        fail_open: AtomicBool,
    }

    struct MemHandle {
        sw: Arc<Switch>,
        status: KvStatus,
        value: Option<String>,
    }

    impl KvHandle for MemHandle {
        fn get(&self, _key: &str) -> Option<String> {
            self.value.clone()
        }
        fn set(&mut self, _key: &str, value: &str) {
            self.value = Some(value.to_string());
        }
        fn remove(&mut self, _key: &str) {
            self.value = None;
        }
        fn keys(&self) -> Vec<String> {
            Vec::new()
        }
        fn flush(&mut self) -> KvStatus {
            self.status = if self.sw.fail_flush.load(Ordering::SeqCst) {
                KvStatus::AccessError
            } else {
                KvStatus::NoError
            };
            self.status
        }
        fn status(&self) -> KvStatus {
            self.status
        }
    }

    struct MemEngine(Arc<Switch>);

    impl KvEngine for MemEngine {
        fn open(&self, _path: &Path) -> io::Result<Box<dyn KvHandle>> {
            let status = if self.0.fail_open.load(Ordering::SeqCst) {
                KvStatus::FormatError
            } else {
                KvStatus::NoError
            };
            Ok(Box::new(MemHandle {
                sw: self.0.clone(),
                status,
                value: None,
            }))
        }
        fn name(&self) -> &'static str {
            "mem"
        }
    }

    fn registry() -> (HandleRegistry, Arc<Switch>) {
        let sw = Arc::new(Switch::default());
        let reg = HandleRegistry::new(PathBuf::from("/tmp/shadow"), Arc::new(MemEngine(sw.clone())));
        (reg, sw)
    }

    #[test]
    fn acquire_release_tracks_cardinality() {
        let (mut reg, _sw) = registry();
        let a = reg.acquire().unwrap();
        let b = reg.acquire().unwrap();
        assert_ne!(a, b);
        assert_eq!(reg.len(), 2);

        reg.release(a).unwrap();
        assert_eq!(reg.len(), 1);
        assert!(!reg.contains(a));
        assert!(reg.contains(b));
    }

    #[test]
    fn dirty_open_is_not_registered() {
        let (mut reg, sw) = registry();
        sw.fail_open.store(true, Ordering::SeqCst);
        let err = reg.acquire().unwrap_err();
        assert!(err.is_io());
        assert!(reg.is_empty());
    }

    #[test]
    fn failed_release_keeps_handle_until_retry() {
        let (mut reg, sw) = registry();
        let id = reg.acquire().unwrap();
        reg.get_mut(id).unwrap().set("k", "v");

        sw.fail_flush.store(true, Ordering::SeqCst);
        assert!(reg.release(id).unwrap_err().is_io());
        assert!(reg.contains(id));
        assert!(reg.flush_all().is_err());

        sw.fail_flush.store(false, Ordering::SeqCst);
        assert_eq!(reg.flush_all().unwrap(), 1);
        reg.release(id).unwrap();
        assert!(reg.is_empty());
    }

    #[test]
    fn unknown_release_is_logic_error() {
        let (mut reg, _sw) = registry();
        let id = reg.acquire().unwrap();
        reg.release(id).unwrap();
        assert!(reg.release(id).unwrap_err().is_logic());
    }

    #[test]
    fn dispose_all_counts_leaks() {
        let (mut reg, _sw) = registry();
        let _a = reg.acquire().unwrap();
        let _b = reg.acquire().unwrap();
        assert_eq!(reg.dispose_all(), 2);
        assert!(reg.is_empty());
        assert_eq!(reg.dispose_all(), 0);
    }
}
