use anyhow::Result;
use serde_json::{Map, Value};
use std::path::PathBuf;

use super::util::open_ro;

pub fn exec(path: PathBuf, json: bool) -> Result<()> {
    let mut store = open_ro(&path)?;
    let entries: Vec<(String, String)> = store.with_handle(|h| {
        h.keys()
            .into_iter()
            .map(|k| {
                let v = h.get(&k).unwrap_or_default();
                (k, v)
            })
            .collect()
    })?;

    if json {
        let mut obj = Map::new();
        for (k, v) in entries {
            obj.insert(k, Value::String(v));
        }
        println!("{}", serde_json::to_string_pretty(&Value::Object(obj))?);
    } else {
        for (k, v) in &entries {
            println!("{} = {}", k, v);
        }
        println!("{} key(s)", entries.len());
    }
    Ok(())
}
