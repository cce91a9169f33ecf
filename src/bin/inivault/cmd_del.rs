use anyhow::Result;
use std::path::PathBuf;

use super::util::{open_rw, publish};

pub fn exec(path: PathBuf, key: String) -> Result<()> {
    let mut store = open_rw(&path)?;
    let existed = store.with_handle(|h| {
        let existed = h.get(&key).is_some();
        if existed {
            h.remove(&key);
        }
        existed
    })?;
    if existed {
        publish(&mut store)?;
        println!("DELETED '{}'", key);
    } else {
        println!("NOT FOUND '{}'", key);
    }
    Ok(())
}
