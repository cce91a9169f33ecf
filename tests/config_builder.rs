// tests/config_builder.rs
//
// Покрываем:
// 1) StoreConfig::from_env читает INIVAULT_* переменные.
// 2) PublishMode::AtomicRename + verify_checksum: тот же наблюдаемый контракт save.
// 3) sync_on_publish не меняет результат.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;

use IniVault::{PublishMode, StoreBuilder, StoreConfig};
use IniVault::backup::backup_path_of;
use IniVault::consts::{ENV_FSYNC, ENV_PUBLISH_MODE, ENV_TEMP_ROOT, ENV_VERIFY_CRC, PUBLISH_TMP_SUFFIX};
use IniVault::kv::{IniHandle, KvHandle};
use IniVault::util::with_suffix;

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

#[test]
fn config_from_env_reads_overrides() {
    std::env::set_var(ENV_TEMP_ROOT, "/var/tmp/iv-shadows");
    std::env::set_var(ENV_PUBLISH_MODE, "rename");
    std::env::set_var(ENV_VERIFY_CRC, "yes");
    std::env::set_var(ENV_FSYNC, "0");

    let cfg = StoreConfig::from_env();

    std::env::remove_var(ENV_TEMP_ROOT);
    std::env::remove_var(ENV_PUBLISH_MODE);
    std::env::remove_var(ENV_VERIFY_CRC);
    std::env::remove_var(ENV_FSYNC);

    assert_eq!(cfg.resolved_temp_root(), PathBuf::from("/var/tmp/iv-shadows"));
    assert_eq!(cfg.publish_mode, PublishMode::AtomicRename);
    assert!(cfg.verify_checksum);
    assert!(!cfg.sync_on_publish);
}

#[test]
fn default_config_uses_plain_protocol() {
    let cfg = StoreBuilder::from_default().build();
    assert_eq!(cfg.publish_mode, PublishMode::DeleteThenCopy);
    assert!(!cfg.verify_checksum);
    assert!(cfg.resolved_temp_root().ends_with("IniVault"));
    assert!(cfg.to_string().contains("delete-then-copy"));
}

#[test]
fn atomic_rename_publish_keeps_contract() -> Result<()> {
    let root = unique_root("atomic");
    let path = root.join("board.ini");

    let mut store = builder(&root)
        .publish_mode(PublishMode::AtomicRename)
        .verify_checksum(true)
        .sync_on_publish(true)
        .create(&path, 5)?;
    assert!(backup_path_of(&path).exists());

    store.with_handle(|h| h.set("board.layers", "4"))?;
    store.save(false)?;
    assert!(!path.exists());
    store.save(true)?;

    assert!(!with_suffix(&path, PUBLISH_TMP_SUFFIX).exists());
    assert!(!with_suffix(&backup_path_of(&path), PUBLISH_TMP_SUFFIX).exists());
    assert_eq!(fs::read(&path)?, fs::read(backup_path_of(&path))?);

    let published = IniHandle::open(&path);
    assert_eq!(published.get("board.layers").as_deref(), Some("4"));
    assert_eq!(published.get("meta.file_version").as_deref(), Some("5"));
    Ok(())
}
