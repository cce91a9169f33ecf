// tests/handles.rs
//
// Покрываем:
// 1) Невысвобожденный хэндл принудительно закрывается на teardown и считается утечкой ровно один раз.
// 2) Неудачный release оставляет хэндл в реестре; save видит ошибку и не трогает target.
// 3) После восстановления движка save и release проходят.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

use IniVault::kv::{IniEngine, IniHandle, KvEngine, KvHandle, KvStatus};
use IniVault::StoreBuilder;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let base = std::env::temp_dir();
    base.join(format!("ivtest-{prefix}-{pid}-{t}-{id}"))
}

/// Builder isolated from env, with a per-test shadow temp root.
fn builder(root: &Path) -> StoreBuilder {
    StoreBuilder::from_default().temp_root(root.join("shadow-tmp"))
}

/// INI engine whose flushes can be switched to fail.
struct FlakyEngine {
    inner: IniEngine,
    fail: Arc<AtomicBool>,
}

struct FlakyHandle {
    inner: Box<dyn KvHandle>,
    fail: Arc<AtomicBool>,
    failed: bool,
}

impl KvHandle for FlakyHandle {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }
    fn set(&mut self, key: &str, value: &str) {
        self.inner.set(key, value)
    }
    fn remove(&mut self, key: &str) {
        self.inner.remove(key)
    }
    fn keys(&self) -> Vec<String> {
        self.inner.keys()
    }
    fn flush(&mut self) -> KvStatus {
        if self.fail.load(Ordering::SeqCst) {
            self.failed = true;
            return KvStatus::AccessError;
        }
        self.failed = false;
        self.inner.flush()
    }
    fn status(&self) -> KvStatus {
        if self.failed {
            KvStatus::AccessError
        } else {
            self.inner.status()
        }
    }
}

impl KvEngine for FlakyEngine {
    fn open(&self, path: &Path) -> io::Result<Box<dyn KvHandle>> {
        Ok(Box::new(FlakyHandle {
            inner: self.inner.open(path)?,
            fail: self.fail.clone(),
            failed: false,
        }))
    }
    fn name(&self) -> &'static str {
        "flaky-ini"
    }
}

#[test]
fn unreleased_handle_is_reported_once_as_leak() -> Result<()> {
    let root = unique_root("leak");
    let path = root.join("board.ini");
    {
        let mut store = builder(&root).create(&path, 1)?;
        store.save(true)?;
    }

    let mut store = builder(&root).open(&path, false, false)?;
    let a = store.acquire()?;
    let _b = store.acquire()?;
    store.release(a)?;
    assert_eq!(store.open_handles(), 1);

    let shadow = store.shadow_path().to_path_buf();
    let report = store.close();
    assert_eq!(report.leaked_handles, 1);
    assert!(report.shadow_removed);
    assert!(!shadow.exists());
    // canonical file is never part of teardown
    assert!(path.exists());
    Ok(())
}

#[test]
fn failed_release_keeps_handle_and_blocks_save() -> Result<()> {
    let root = unique_root("flaky");
    let path = root.join("board.ini");
    {
        let mut store = builder(&root).create(&path, 1)?;
        store.save(true)?;
    }
    let published_before = fs::read(&path)?;

    let fail = Arc::new(AtomicBool::new(false));
    let engine = Arc::new(FlakyEngine {
        inner: IniEngine::new(),
        fail: fail.clone(),
    });
    let mut store = builder(&root).engine(engine).open(&path, false, false)?;

    let id = store.acquire()?;
    store.handle_mut(id).expect("handle").set("board.name", "pending");

    fail.store(true, Ordering::SeqCst);
    let err = store.release(id).unwrap_err();
    assert!(err.is_io(), "got: {err}");
    assert_eq!(store.open_handles(), 1);
    assert_eq!(
        store.handle(id).expect("still registered").status(),
        KvStatus::AccessError
    );

    // save aborts before touching the target
    assert!(store.save(true).unwrap_err().is_io());
    assert_eq!(fs::read(&path)?, published_before);

    // retry after the condition clears
    fail.store(false, Ordering::SeqCst);
    store.save(true)?;
    let published = IniHandle::open(&path);
    assert_eq!(published.get("board.name").as_deref(), Some("pending"));

    store.release(id)?;
    assert_eq!(store.close().leaked_handles, 0);
    Ok(())
}

#[test]
fn set_file_version_fails_when_release_fails() -> Result<()> {
    let root = unique_root("flaky-ver");
    let path = root.join("board.ini");
    {
        let mut store = builder(&root).create(&path, 1)?;
        store.save(true)?;
    }

    let fail = Arc::new(AtomicBool::new(true));
    let engine = Arc::new(FlakyEngine {
        inner: IniEngine::new(),
        fail: fail.clone(),
    });
    // open only reads, so a failing flush would already break the transient handle
    let err = builder(&root)
        .engine(engine.clone())
        .open(&path, false, false)
        .unwrap_err();
    assert!(err.is_io());

    fail.store(false, Ordering::SeqCst);
    let mut store = builder(&root).engine(engine).open(&path, false, false)?;
    fail.store(true, Ordering::SeqCst);
    assert!(store.set_file_version(9).unwrap_err().is_io());
    assert_eq!(store.open_handles(), 1);

    let report = store.close();
    assert_eq!(report.leaked_handles, 1);
    Ok(())
}
