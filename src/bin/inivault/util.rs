use anyhow::{anyhow, Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};

use IniVault::Store;

/// Value argument: `-` = stdin, `@path` = file contents, otherwise literal.
/// Returned trimmed, the way the store keeps it.
pub fn decode_value_arg(arg: &str) -> Result<(String, &'static str)> {
    if arg == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok((buf.trim().to_string(), "stdin"));
    }
    if let Some(p) = arg.strip_prefix('@') {
        let path = PathBuf::from(p);
        let text = std::fs::read_to_string(&path)
            .map_err(|e| anyhow!("read value file {}: {}", path.display(), e))?;
        return Ok((text.trim().to_string(), "file"));
    }
    Ok((arg.trim().to_string(), "literal"))
}

/// Writable open that resumes from a pending draft if one exists.
pub fn open_rw(path: &Path) -> Result<Store> {
    Store::open(path, true, false).with_context(|| format!("open {}", path.display()))
}

pub fn open_ro(path: &Path) -> Result<Store> {
    Store::open(path, false, true).with_context(|| format!("open {}", path.display()))
}

pub fn publish(store: &mut Store) -> Result<()> {
    store
        .save(true)
        .with_context(|| format!("save {}", store.path().display()))
}
