// Container runtime seam and run options

use crate::errors::Result;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Operations a container daemon client must provide
pub trait ContainerRuntime: Send + Sync {
    /// Validate that the daemon is reachable
    fn ping(&self) -> Result<()>;

    /// Start one detached container and return its id
    fn start_container(&self, spec: &RunSpec) -> Result<String>;

    /// Fetch the current state snapshot of a container
    fn inspect(&self, id: &str) -> Result<Value>;

    /// Stop a running container
    fn stop(&self, id: &str) -> Result<()>;

    /// Remove a stopped container
    fn remove(&self, id: &str) -> Result<()>;
}

impl<T: ContainerRuntime + ?Sized> ContainerRuntime for Arc<T> {
    fn ping(&self) -> Result<()> {
        (**self).ping()
    }

    fn start_container(&self, spec: &RunSpec) -> Result<String> {
        (**self).start_container(spec)
    }

    fn inspect(&self, id: &str) -> Result<Value> {
        (**self).inspect(id)
    }

    fn stop(&self, id: &str) -> Result<()> {
        (**self).stop(id)
    }

    fn remove(&self, id: &str) -> Result<()> {
        (**self).remove(id)
    }
}

/// What to start: image, command and pass-through runtime options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSpec {
    pub image: String,
    pub command: Option<Vec<String>>,
    pub network: Option<String>,
    pub name: Option<String>,
    pub env: Vec<(String, String)>,
    pub labels: Vec<(String, String)>,
    pub publish: Vec<String>,
    /// Raw arguments appended before the image name
    pub extra_args: Vec<String>,
    /// Overrides the controller's readiness timeout for this request
    pub timeout: Option<Duration>,
}

impl RunSpec {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Self::default()
        }
    }

    pub fn command<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub fn network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.push((key.into(), value.into()));
        self
    }

    pub fn publish(mut self, port: impl Into<String>) -> Self {
        self.publish.push(port.into());
        self
    }

    pub fn extra_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Whether the container shares the host's network stack, selected either
    /// through [`RunSpec::network`] or a `--network`/`--net` extra argument
    pub fn uses_host_network(&self) -> bool {
        if let Some(network) = &self.network {
            return network == "host";
        }

        let mut args = self.extra_args.iter().map(String::as_str);
        while let Some(arg) = args.next() {
            let mode = match arg {
                "--network" | "--net" => args.next(),
                other => other
                    .strip_prefix("--network=")
                    .or_else(|| other.strip_prefix("--net=")),
            };
            if mode == Some("host") {
                return true;
            }
        }
        false
    }
}
