use anyhow::Result;
use std::path::PathBuf;

use super::util::open_ro;

pub fn exec(path: PathBuf, key: String) -> Result<()> {
    let mut store = open_ro(&path)?;
    match store.with_handle(|h| h.get(&key))? {
        Some(v) => println!("FOUND '{}' = {}", key, v),
        None => println!("NOT FOUND '{}'", key),
    }
    Ok(())
}
