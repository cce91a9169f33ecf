use anyhow::Result;
use std::path::PathBuf;

use IniVault::metrics;

use super::util::open_ro;

pub fn exec(path: PathBuf, json: bool) -> Result<()> {
    let store = open_ro(&path)?;
    let st = store.status();

    if json {
        let out = serde_json::json!({
            "store": st,
            "config": store.config().to_string(),
            "metrics": metrics::snapshot(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("IniVault status:");
    println!("  path:         {} (exists: {})", st.path, st.canonical_exists);
    println!("  draft:        {} (exists: {})", st.backup_path, st.backup_exists);
    println!("  shadow:       {} (exists: {})", st.shadow_path, st.shadow_exists);
    match st.file_version {
        Some(v) => println!("  file_version: {}", v),
        None => println!("  file_version: unknown"),
    }
    println!("  config:       {}", store.config());

    let m = metrics::snapshot();
    println!("metrics:");
    println!("  shadows_materialized: {} ({} B)", m.shadows_materialized, m.shadow_bytes_copied);
    println!(
        "  handles: acquired={} released={} leaked={} flush_failures={}",
        m.handles_acquired, m.handles_released, m.handles_leaked, m.handle_flush_failures
    );
    Ok(())
}
