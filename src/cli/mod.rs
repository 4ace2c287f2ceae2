// Command handlers for the dockerctl binary

pub mod inspect;
pub mod ping;
pub mod run;

use crate::config::Settings;
use crate::session::DockerCtl;
use anyhow::{Context, Result};

/// Settings from the working directory and environment, with `--url` on top
pub fn load_settings(url: Option<&str>) -> Result<Settings> {
    let mut settings = Settings::from_env().context("Failed to load settings")?;
    if let Some(url) = url {
        settings.docker_url = Some(url.to_string());
    }
    Ok(settings)
}

/// Build a session and make sure the daemon answers
fn connect(settings: &Settings) -> Result<DockerCtl> {
    let ctl = DockerCtl::from_settings(settings)?;
    ctl.ping().context(crate::fixture::NO_DOCKER_REASON)?;
    Ok(ctl)
}
