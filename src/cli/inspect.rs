use super::{connect, load_settings};
use crate::attrs::{self, AttrPath};
use anyhow::{Context, Result};
use serde_json::Value;

/// Print the value at a dotted path of a container's current state
pub fn run(url: Option<&str>, id: &str, path: &str, exists_only: bool) -> Result<()> {
    let settings = load_settings(url)?;
    let ctl = connect(&settings)?;

    let snapshot = ctl
        .runtime()
        .inspect(id)
        .with_context(|| format!("Failed to inspect container {}", id))?;
    let path = AttrPath::parse(path);

    if exists_only {
        println!("{}", attrs::path_exists(&snapshot, &path));
        return Ok(());
    }

    match attrs::resolve(&snapshot, &path)? {
        Value::String(s) => println!("{}", s),
        other => println!("{}", serde_json::to_string_pretty(other)?),
    }
    Ok(())
}
