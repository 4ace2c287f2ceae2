// Docker runtime backed by the `docker` CLI
// Arguments are passed straight to the binary, never through a shell

use crate::errors::{DockerCtlError, Result};
use crate::runtime::{ContainerRuntime, RunSpec};
use serde_json::Value;
use std::io::ErrorKind;
use std::process::Command;

const URL_SCHEMES: &[&str] = &["unix", "tcp", "http", "https", "ssh", "npipe"];

/// Talks to a Docker daemon through the `docker` binary
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
    host: Option<String>,
}

impl DockerCli {
    /// Create a client for `url`, or for the CLI's ambient configuration
    /// (`DOCKER_HOST`, the current context) when no URL is given
    pub fn new(url: Option<&str>) -> Result<Self> {
        let host = match url {
            Some(url) => Some(validate_url(url)?),
            None => None,
        };
        Ok(Self {
            program: "docker".to_string(),
            host,
        })
    }

    /// Use a different binary, e.g. a full path or a docker-compatible CLI
    pub fn with_program(mut self, program: &str) -> Self {
        self.program = program.to_string();
        self
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Global arguments selecting the daemon, followed by `args`
    fn command_args(&self, args: Vec<String>) -> Vec<String> {
        let mut full = Vec::with_capacity(args.len() + 2);
        if let Some(host) = &self.host {
            full.push("--host".to_string());
            full.push(host.clone());
        }
        full.extend(args);
        full
    }

    /// Build the full `docker run` command line (safe from injection)
    pub fn build_run_args(&self, spec: &RunSpec) -> Vec<String> {
        self.command_args(run_args(spec))
    }

    /// Run the CLI and return trimmed stdout
    fn execute(&self, args: Vec<String>) -> Result<String> {
        let full_args = self.command_args(args);
        tracing::debug!(program = %self.program, args = ?full_args, "running docker command");

        let output = Command::new(&self.program)
            .args(&full_args)
            .output()
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DockerCtlError::Runtime(format!(
                "{} {} failed: {}",
                self.program,
                full_args.join(" "),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn spawn_error(&self, e: std::io::Error) -> DockerCtlError {
        if e.kind() == ErrorKind::NotFound {
            DockerCtlError::Connection(format!(
                "'{}' not found. Is Docker installed and on PATH?",
                self.program
            ))
        } else {
            DockerCtlError::Io(e)
        }
    }
}

/// `docker run` arguments for `spec`, without daemon selection
fn run_args(spec: &RunSpec) -> Vec<String> {
    let mut args = vec!["run".to_string(), "--detach".to_string()];

    if let Some(network) = &spec.network {
        args.push("--network".to_string());
        args.push(network.clone());
    }
    if let Some(name) = &spec.name {
        args.push("--name".to_string());
        args.push(name.clone());
    }
    for (key, value) in &spec.env {
        args.push("--env".to_string());
        args.push(format!("{}={}", key, value));
    }
    for (key, value) in &spec.labels {
        args.push("--label".to_string());
        args.push(format!("{}={}", key, value));
    }
    for port in &spec.publish {
        args.push("--publish".to_string());
        args.push(port.clone());
    }
    args.extend(spec.extra_args.iter().cloned());

    args.push(spec.image.clone());
    if let Some(command) = &spec.command {
        args.extend(command.iter().cloned());
    }

    args
}

fn validate_url(url: &str) -> Result<String> {
    let scheme = url
        .split_once("://")
        .map(|(scheme, _)| scheme)
        .ok_or_else(|| DockerCtlError::Config(format!("Invalid Docker URL '{}': missing scheme", url)))?;

    if !URL_SCHEMES.contains(&scheme) {
        return Err(DockerCtlError::Config(format!(
            "Invalid Docker URL '{}': unsupported scheme '{}' (expected one of {})",
            url,
            scheme,
            URL_SCHEMES.join(", ")
        )));
    }
    Ok(url.to_string())
}

impl ContainerRuntime for DockerCli {
    fn ping(&self) -> Result<()> {
        let args = vec![
            "version".to_string(),
            "--format".to_string(),
            "{{.Server.Version}}".to_string(),
        ];
        match self.execute(args) {
            Ok(version) => {
                tracing::debug!(server_version = %version, "docker daemon reachable");
                Ok(())
            }
            Err(DockerCtlError::Runtime(msg)) => Err(DockerCtlError::Connection(msg)),
            Err(e) => Err(e),
        }
    }

    fn start_container(&self, spec: &RunSpec) -> Result<String> {
        let stdout = self.execute(run_args(spec))?;
        stdout
            .lines()
            .last()
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                DockerCtlError::Runtime(format!("docker run for '{}' returned no container id", spec.image))
            })
    }

    fn inspect(&self, id: &str) -> Result<Value> {
        let args = vec![
            "inspect".to_string(),
            "--type".to_string(),
            "container".to_string(),
            id.to_string(),
        ];
        let stdout = self.execute(args)?;
        let mut documents: Vec<Value> = serde_json::from_str(&stdout)?;
        if documents.is_empty() {
            return Err(DockerCtlError::Runtime(format!("No such container: {}", id)));
        }
        Ok(documents.swap_remove(0))
    }

    fn stop(&self, id: &str) -> Result<()> {
        self.execute(vec!["stop".to_string(), id.to_string()])?;
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<()> {
        self.execute(vec!["rm".to_string(), id.to_string()])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambient_connection_has_no_host_flag() {
        let cli = DockerCli::new(None).unwrap();
        assert_eq!(cli.host(), None);
        let args = cli.build_run_args(&RunSpec::new("alpine"));
        assert_eq!(args, vec!["run", "--detach", "alpine"]);
    }

    #[test]
    fn test_explicit_url_selects_host() {
        let cli = DockerCli::new(Some("tcp://127.0.0.1:2375")).unwrap();
        let args = cli.build_run_args(&RunSpec::new("alpine"));
        assert_eq!(&args[..2], &["--host", "tcp://127.0.0.1:2375"]);
        assert_eq!(&args[2..], &["run", "--detach", "alpine"]);
    }

    #[test]
    fn test_invalid_urls() {
        assert!(matches!(
            DockerCli::new(Some("127.0.0.1:2375")),
            Err(DockerCtlError::Config(_))
        ));
        assert!(matches!(
            DockerCli::new(Some("ftp://daemon")),
            Err(DockerCtlError::Config(_))
        ));
        assert!(DockerCli::new(Some("unix:///var/run/docker.sock")).is_ok());
    }

    #[test]
    fn test_run_args_pass_options_through() {
        let cli = DockerCli::new(None).unwrap();
        let spec = RunSpec::new("nginx:alpine")
            .network("host")
            .name("web-1")
            .env("NGINX_PORT", "8080")
            .label("suite", "smoke")
            .publish("8080:80")
            .extra_arg("--rm=false")
            .command(["nginx", "-g", "daemon off;"]);

        let args = cli.build_run_args(&spec);
        assert_eq!(
            args,
            vec![
                "run",
                "--detach",
                "--network",
                "host",
                "--name",
                "web-1",
                "--env",
                "NGINX_PORT=8080",
                "--label",
                "suite=smoke",
                "--publish",
                "8080:80",
                "--rm=false",
                "nginx:alpine",
                "nginx",
                "-g",
                "daemon off;",
            ]
        );
    }

    #[test]
    fn test_missing_binary_is_connection_error() {
        let cli = DockerCli::new(None)
            .unwrap()
            .with_program("dockerctl-test-no-such-binary");
        assert!(matches!(cli.ping(), Err(DockerCtlError::Connection(_))));
    }

    // Stand-in `docker` binary answering each subcommand the way a daemon
    // would. `down` makes the daemon unreachable.
    #[cfg(unix)]
    fn fake_docker(dir: &tempfile::TempDir, down: bool) -> DockerCli {
        use std::os::unix::fs::PermissionsExt;

        let version = if down {
            "echo 'Cannot connect to the Docker daemon at unix:///var/run/docker.sock' >&2; exit 1"
        } else {
            "echo 24.0.7"
        };
        let script = format!(
            r#"#!/bin/sh
case "$1" in
  version) {version} ;;
  run)
    echo "Unable to find image 'alpine:latest' locally"
    echo "abcdef0123456789abcdef"
    ;;
  inspect)
    if [ "$4" = "gone" ]; then
      echo '[]'
    else
      echo '[{{"Id":"abc","NetworkSettings":{{"IPAddress":"172.17.0.9"}}}},{{"Id":"other"}}]'
    fi
    ;;
  stop) echo "Error: No such container: $2  " >&2; exit 1 ;;
  rm) echo "$2" ;;
esac
"#
        );

        let path = dir.path().join("docker");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        DockerCli::new(None)
            .unwrap()
            .with_program(path.to_str().unwrap())
    }

    #[cfg(unix)]
    #[test]
    #[serial_test::serial]
    fn test_ping_against_fake_daemon() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(fake_docker(&dir, false).ping().is_ok());

        let dir = tempfile::TempDir::new().unwrap();
        match fake_docker(&dir, true).ping() {
            Err(DockerCtlError::Connection(msg)) => {
                assert!(msg.contains("version --format {{.Server.Version}} failed"));
                assert!(msg.ends_with("Cannot connect to the Docker daemon at unix:///var/run/docker.sock"));
            }
            other => panic!("expected connection error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    #[serial_test::serial]
    fn test_start_container_takes_last_stdout_line() {
        let dir = tempfile::TempDir::new().unwrap();
        let cli = fake_docker(&dir, false);
        let id = cli.start_container(&RunSpec::new("alpine")).unwrap();
        assert_eq!(id, "abcdef0123456789abcdef");
    }

    #[cfg(unix)]
    #[test]
    #[serial_test::serial]
    fn test_inspect_returns_first_document() {
        let dir = tempfile::TempDir::new().unwrap();
        let cli = fake_docker(&dir, false);

        let snapshot = cli.inspect("abc").unwrap();
        assert_eq!(snapshot["Id"], "abc");
        assert_eq!(snapshot["NetworkSettings"]["IPAddress"], "172.17.0.9");

        match cli.inspect("gone") {
            Err(DockerCtlError::Runtime(msg)) => assert_eq!(msg, "No such container: gone"),
            other => panic!("expected runtime error, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    #[serial_test::serial]
    fn test_stop_failure_carries_trimmed_stderr() {
        let dir = tempfile::TempDir::new().unwrap();
        let cli = fake_docker(&dir, false);

        match cli.stop("abc") {
            Err(DockerCtlError::Runtime(msg)) => {
                assert!(msg.contains(" stop abc failed: "));
                assert!(msg.ends_with("Error: No such container: abc"));
            }
            other => panic!("expected runtime error, got {:?}", other),
        }
        assert!(cli.remove("abc").is_ok());
    }
}
