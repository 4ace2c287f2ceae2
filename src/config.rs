use crate::errors::{DockerCtlError, Result};
use crate::wait::{DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILE: &str = ".dockerctl.yml";

pub const ENV_URL: &str = "DOCKERCTL_URL";
pub const ENV_SKIP_NO_DOCKER: &str = "DOCKERCTL_SKIP_NO_DOCKER";
pub const ENV_TIMEOUT: &str = "DOCKERCTL_TIMEOUT";
pub const ENV_POLL_INTERVAL_MS: &str = "DOCKERCTL_POLL_INTERVAL_MS";
pub const ENV_DOCKER_BIN: &str = "DOCKERCTL_DOCKER_BIN";

/// Harness settings: file first, then environment overrides
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Daemon endpoint, e.g. `unix:///var/run/docker.sock` or `tcp://127.0.0.1:2375`.
    /// Unset means ambient discovery by the docker CLI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_url: Option<String>,
    /// Skip docker-backed tests instead of failing when the daemon is unreachable
    pub skip_no_docker: bool,
    pub timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub docker_bin: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            docker_url: None,
            skip_no_docker: false,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            docker_bin: "docker".to_string(),
        }
    }
}

impl Settings {
    /// Load `.dockerctl.yml` from `dir` (defaults when absent), then apply
    /// `DOCKERCTL_*` environment overrides
    pub fn load(dir: &Path) -> Result<Self> {
        let mut settings = Self::load_file(dir)?;
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Settings for the current working directory
    pub fn from_env() -> Result<Self> {
        Self::load(&std::env::current_dir()?)
    }

    pub fn load_file(dir: &Path) -> Result<Self> {
        let config_path = dir.join(CONFIG_FILE);

        if !config_path.exists() {
            // No config file, return defaults
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&config_path)?;
        serde_yml::from_str(&content)
            .map_err(|e| DockerCtlError::Config(format!("Failed to parse {}: {}", CONFIG_FILE, e)))
    }

    /// Override fields from variables returned by `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_URL).filter(|v| !v.trim().is_empty()) {
            self.docker_url = Some(url.trim().to_string());
        }
        if let Some(value) = lookup(ENV_SKIP_NO_DOCKER) {
            self.skip_no_docker = parse_bool(ENV_SKIP_NO_DOCKER, &value)?;
        }
        if let Some(value) = lookup(ENV_TIMEOUT) {
            self.timeout_secs = parse_number(ENV_TIMEOUT, &value)?;
        }
        if let Some(value) = lookup(ENV_POLL_INTERVAL_MS) {
            self.poll_interval_ms = parse_number(ENV_POLL_INTERVAL_MS, &value)?;
        }
        if let Some(bin) = lookup(ENV_DOCKER_BIN).filter(|v| !v.trim().is_empty()) {
            self.docker_bin = bin.trim().to_string();
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(DockerCtlError::Config(format!(
            "Invalid value for {}: '{}' (expected true/false)",
            key, other
        ))),
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value.trim().parse::<u64>().map_err(|_| {
        DockerCtlError::Config(format!("Invalid value for {}: '{}'", key, value.trim()))
    })
}
