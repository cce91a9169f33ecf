use anyhow::Result;
use std::path::PathBuf;

use super::util::{open_ro, open_rw, publish};

pub fn exec(path: PathBuf, set: Option<i32>) -> Result<()> {
    match set {
        Some(v) => {
            let mut store = open_rw(&path)?;
            let old = store.file_version();
            store.set_file_version(v)?;
            publish(&mut store)?;
            println!("version {} -> {}", old, v);
        }
        None => {
            let store = open_ro(&path)?;
            if store.has_file_version() {
                println!("version {}", store.file_version());
            } else {
                println!("version unknown");
            }
        }
    }
    Ok(())
}
