use super::{connect, load_settings};
use anyhow::Result;
use colored::Colorize;

/// Check that the Docker daemon is reachable
pub fn run(url: Option<&str>) -> Result<()> {
    let settings = load_settings(url)?;
    connect(&settings)?;

    let target = settings
        .docker_url
        .as_deref()
        .unwrap_or("environment default");
    println!("{} Docker daemon reachable ({})", "✓".green(), target);
    Ok(())
}
