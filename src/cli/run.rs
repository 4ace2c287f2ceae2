use super::{connect, load_settings};
use crate::group::ContainerGroup;
use crate::runtime::RunSpec;
use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Duration;

pub const ENV_CONTAINERS: &str = "DOCKERCTL_CONTAINERS";
pub const ENV_IPS: &str = "DOCKERCTL_IPS";

/// Options for `dockerctl run`
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub image: String,
    pub num: usize,
    pub network: Option<String>,
    pub env: Vec<(String, String)>,
    pub labels: Vec<(String, String)>,
    pub publish: Vec<String>,
    /// Container command, split on whitespace
    pub cmd: Option<String>,
    pub timeout_secs: Option<u64>,
    /// Command to run on the host while the containers are up
    pub test_cmd: Vec<String>,
}

impl RunOptions {
    pub fn to_spec(&self) -> RunSpec {
        let mut spec = RunSpec::new(&self.image);
        spec.network = self.network.clone();
        spec.env = self.env.clone();
        spec.labels = self.labels.clone();
        spec.publish = self.publish.clone();
        if let Some(cmd) = &self.cmd {
            spec = spec.command(cmd.split_whitespace());
        }
        if let Some(secs) = self.timeout_secs {
            spec = spec.timeout(Duration::from_secs(secs));
        }
        spec
    }
}

/// Parse a `KEY=VALUE` argument
pub fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

/// Address to reach each container at, in group order
pub fn container_addresses(group: &ContainerGroup<'_>, host_network: bool) -> Vec<String> {
    group
        .iter()
        .map(|container| {
            if host_network {
                "127.0.0.1".to_string()
            } else {
                container.ip_address().unwrap_or_default().to_string()
            }
        })
        .collect()
}

/// Bring up the containers, run the test command against them, tear down.
/// Returns the exit code to leave the process with.
pub fn run(url: Option<&str>, options: &RunOptions) -> Result<i32> {
    let settings = load_settings(url)?;
    let ctl = connect(&settings)?;
    let spec = options.to_spec();

    ctl.run(&spec, options.num, |group| -> Result<i32> {
        let ids = group.ids().join(",");
        let addresses = container_addresses(group, spec.uses_host_network());

        println!(
            "{} {} container(s) of {} ready",
            "✓".green(),
            group.len(),
            spec.image
        );
        for (container, address) in group.iter().zip(&addresses) {
            println!("  {:<14} {}", container.short_id(), address);
        }

        if options.test_cmd.is_empty() {
            return Ok(0);
        }

        let status = Command::new(&options.test_cmd[0])
            .args(&options.test_cmd[1..])
            .env(ENV_CONTAINERS, &ids)
            .env(ENV_IPS, addresses.join(","))
            .status()
            .with_context(|| format!("Failed to run '{}'", options.test_cmd[0]))?;

        if !status.success() {
            eprintln!("{} test command exited with {}", "✗".red(), status);
        }
        Ok(status.code().unwrap_or(1))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("POSTGRES_PASSWORD=secret=1").unwrap(),
            ("POSTGRES_PASSWORD".to_string(), "secret=1".to_string())
        );
        assert_eq!(
            parse_key_value("EMPTY=").unwrap(),
            ("EMPTY".to_string(), String::new())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=value").is_err());
    }

    #[test]
    fn test_options_to_spec() {
        let options = RunOptions {
            image: "redis:7".to_string(),
            num: 2,
            network: Some("host".to_string()),
            env: vec![("TZ".to_string(), "UTC".to_string())],
            cmd: Some("redis-server  --port 7000".to_string()),
            timeout_secs: Some(5),
            ..RunOptions::default()
        };

        let spec = options.to_spec();
        assert_eq!(spec.image, "redis:7");
        assert!(spec.uses_host_network());
        assert_eq!(
            spec.command,
            Some(vec![
                "redis-server".to_string(),
                "--port".to_string(),
                "7000".to_string()
            ])
        );
        assert_eq!(spec.timeout, Some(Duration::from_secs(5)));
    }
}
