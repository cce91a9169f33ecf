use anyhow::{Context, Result};
use std::path::PathBuf;

use IniVault::Store;

use super::util::publish;

pub fn exec(path: PathBuf, version: i32) -> Result<()> {
    let mut store = Store::create(&path, version)
        .with_context(|| format!("create {}", path.display()))?;
    publish(&mut store)?;
    println!(
        "INIT {} (version {}, shadow {})",
        store.path().display(),
        store.file_version(),
        store.shadow_path().display()
    );
    Ok(())
}
