// Session entry point: one runtime connection shared by every group

use crate::attrs::AttrPath;
use crate::clock::Clock;
use crate::config::Settings;
use crate::container::Container;
use crate::docker::DockerCli;
use crate::errors::{DockerCtlError, Result};
use crate::events::{Event, EventSink, TracingSink};
use crate::group::ContainerGroup;
use crate::runtime::{ContainerRuntime, RunSpec};
use crate::wait::{Expectation, ReadinessWaiter, DEFAULT_TIMEOUT};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const HEALTH_STATUS: [&str; 3] = ["State", "Health", "Status"];
pub const BRIDGE_IP: [&str; 2] = ["NetworkSettings", "IPAddress"];
pub const HOST_NETWORK: [&str; 3] = ["NetworkSettings", "Networks", "host"];

/// Controls containers on one daemon for the duration of a test session
pub struct DockerCtl {
    runtime: Box<dyn ContainerRuntime>,
    sink: Arc<dyn EventSink>,
    waiter: ReadinessWaiter,
    timeout: Duration,
}

impl DockerCtl {
    /// Connect through the docker CLI, to `url` or to whatever the
    /// environment (`DOCKER_HOST`, the active context) points at
    pub fn connect(url: Option<&str>) -> Result<Self> {
        Ok(Self::with_runtime(Box::new(DockerCli::new(url)?)))
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let cli = DockerCli::new(settings.docker_url.as_deref())?.with_program(&settings.docker_bin);
        Ok(Self::with_runtime(Box::new(cli))
            .with_timeout(settings.timeout())
            .with_poll_interval(settings.poll_interval()))
    }

    pub fn with_runtime(runtime: Box<dyn ContainerRuntime>) -> Self {
        Self {
            runtime,
            sink: Arc::new(TracingSink),
            waiter: ReadinessWaiter::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.waiter = ReadinessWaiter::new(clock, self.waiter.poll_interval());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.waiter.set_poll_interval(interval);
        self
    }

    /// Default readiness timeout per waited attribute
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn runtime(&self) -> &dyn ContainerRuntime {
        self.runtime.as_ref()
    }

    pub fn waiter(&self) -> &ReadinessWaiter {
        &self.waiter
    }

    /// Check the daemon answers
    pub fn ping(&self) -> Result<()> {
        self.runtime.ping()
    }

    /// Start one detached container. Its snapshot is empty until refreshed.
    pub fn start_container(&self, spec: &RunSpec) -> Result<Container<'_>> {
        let id = self.runtime.start_container(spec)?;
        Ok(Container::new(self.runtime.as_ref(), id, spec.image.clone()))
    }

    /// Start `num` containers from `spec` and wait until each is networked
    /// and, when it defines a health check, healthy.
    ///
    /// If any start or wait fails, every container created so far is
    /// stopped and removed before the error is returned.
    pub fn acquire(&self, spec: &RunSpec, num: usize) -> Result<ContainerGroup<'_>> {
        if num == 0 {
            return Err(DockerCtlError::InvalidRequest(
                "container count must be at least 1".to_string(),
            ));
        }

        let mut group = ContainerGroup::new(self.sink.clone(), num);
        for _ in 0..num {
            let container = self.start_container(spec)?;
            self.sink.info(&Event::Started {
                image: spec.image.clone(),
                container: container.short_id().to_string(),
            });
            group.push(container);
        }

        let timeout = spec.timeout.unwrap_or(self.timeout);
        for container in group.containers_mut() {
            self.wait_ready(container, spec.uses_host_network(), timeout)?;
        }

        Ok(group)
    }

    fn wait_ready(
        &self,
        container: &mut Container<'_>,
        host_network: bool,
        timeout: Duration,
    ) -> Result<()> {
        let image = container.image().to_string();
        let short_id = container.short_id().to_string();
        self.sink.info(&Event::Waiting {
            image: image.clone(),
            container: short_id.clone(),
        });

        let outcome = self.wait_network_and_health(container, host_network, timeout);
        match outcome {
            Ok(()) => {
                self.sink.info(&Event::Ready {
                    image,
                    container: short_id,
                });
                Ok(())
            }
            Err(e) => {
                self.sink.error(&Event::WaitTimedOut {
                    image,
                    container: short_id,
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn wait_network_and_health(
        &self,
        container: &mut Container<'_>,
        host_network: bool,
        timeout: Duration,
    ) -> Result<()> {
        let network = if host_network {
            AttrPath::from(HOST_NETWORK)
        } else {
            AttrPath::from(BRIDGE_IP)
        };
        self.waiter
            .wait_for(container, &network, &Expectation::Truthy, timeout)?;

        // Only images that define a HEALTHCHECK report a health status
        let health = AttrPath::from(HEALTH_STATUS);
        if container.has_attr(&health) {
            self.waiter
                .wait_for(container, &health, &Expectation::equals("healthy"), timeout)?;
        }
        Ok(())
    }

    /// Scoped acquisition: run `body` against a ready group, then release it.
    ///
    /// Release always runs, also when `body` returns an error or panics. An
    /// error from `body` wins over release failures, which are then only
    /// reported to the sink.
    pub fn run<T, E, F>(&self, spec: &RunSpec, num: usize, body: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut ContainerGroup<'_>) -> std::result::Result<T, E>,
        E: From<DockerCtlError>,
    {
        let mut group = self.acquire(spec, num)?;
        let outcome = body(&mut group);
        let released = group.release();
        let value = outcome?;
        released?;
        Ok(value)
    }
}

impl fmt::Debug for DockerCtl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DockerCtl")
            .field("timeout", &self.timeout)
            .field("poll_interval", &self.waiter.poll_interval())
            .finish_non_exhaustive()
    }
}
