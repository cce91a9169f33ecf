use anyhow::Result;
use std::path::PathBuf;

use super::util::{decode_value_arg, open_rw, publish};

pub fn exec(path: PathBuf, key: String, value: String) -> Result<()> {
    let (value, src) = decode_value_arg(&value)?;
    let mut store = open_rw(&path)?;
    store.with_handle(|h| h.set(&key, &value))?;
    publish(&mut store)?;
    println!("OK set '{}' ({} B from {})", key, value.len(), src);
    Ok(())
}
