use anyhow::{Context, Result};
use std::path::PathBuf;

use super::util::open_rw;

pub fn exec(path: PathBuf) -> Result<()> {
    let store = open_rw(&path)?;
    store
        .remove()
        .with_context(|| format!("remove {}", path.display()))?;
    println!("REMOVED {}", store.path().display());
    Ok(())
}
