// Container groups: acquired together, released together in creation order

use crate::container::Container;
use crate::errors::{DockerCtlError, Result};
use crate::events::{Event, EventSink};
use std::fmt;
use std::ops::Index;
use std::sync::Arc;

/// Which half of a release failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStep {
    Stop,
    Remove,
}

impl fmt::Display for ReleaseStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseStep::Stop => write!(f, "stop"),
            ReleaseStep::Remove => write!(f, "remove"),
        }
    }
}

/// A stop or remove request that failed during release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseFailure {
    pub image: String,
    pub container: String,
    pub step: ReleaseStep,
    pub message: String,
}

impl fmt::Display for ReleaseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} {} failed: {}",
            self.image, self.container, self.step, self.message
        )
    }
}

pub struct ContainerGroup<'a> {
    containers: Vec<Container<'a>>,
    sink: Arc<dyn EventSink>,
    released: bool,
}

impl<'a> ContainerGroup<'a> {
    pub(crate) fn new(sink: Arc<dyn EventSink>, capacity: usize) -> Self {
        Self {
            containers: Vec::with_capacity(capacity),
            sink,
            released: false,
        }
    }

    pub(crate) fn push(&mut self, container: Container<'a>) {
        self.containers.push(container);
    }

    pub(crate) fn containers_mut(&mut self) -> &mut [Container<'a>] {
        &mut self.containers
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Container<'a>> {
        self.containers.get(index)
    }

    /// Members in creation order
    pub fn iter(&self) -> std::slice::Iter<'_, Container<'a>> {
        self.containers.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.containers.iter().map(Container::id).collect()
    }

    /// Refresh every member's snapshot, e.g. before reading ports or IPs
    pub fn refresh_all(&mut self) -> Result<()> {
        for container in &mut self.containers {
            container.refresh()?;
        }
        Ok(())
    }

    /// Stop and remove every member now, reporting any step that failed
    pub fn release(mut self) -> Result<()> {
        let failures = self.release_all();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(DockerCtlError::ReleaseFailed(failures))
        }
    }

    fn release_all(&mut self) -> Vec<ReleaseFailure> {
        if self.released {
            return Vec::new();
        }
        self.released = true;

        let mut failures = Vec::new();
        for container in &self.containers {
            let image = container.image().to_string();
            let short_id = container.short_id().to_string();

            match container.stop() {
                Ok(()) => self.sink.info(&Event::Stopped {
                    image: image.clone(),
                    container: short_id.clone(),
                }),
                Err(e) => {
                    self.sink.error(&Event::StopFailed {
                        image: image.clone(),
                        container: short_id.clone(),
                        reason: e.to_string(),
                    });
                    failures.push(ReleaseFailure {
                        image: image.clone(),
                        container: short_id.clone(),
                        step: ReleaseStep::Stop,
                        message: e.to_string(),
                    });
                }
            }

            // Attempted even when stop failed; the container may already be down
            match container.remove() {
                Ok(()) => self.sink.info(&Event::Removed {
                    image,
                    container: short_id,
                }),
                Err(e) => {
                    self.sink.error(&Event::RemoveFailed {
                        image: image.clone(),
                        container: short_id.clone(),
                        reason: e.to_string(),
                    });
                    failures.push(ReleaseFailure {
                        image,
                        container: short_id,
                        step: ReleaseStep::Remove,
                        message: e.to_string(),
                    });
                }
            }
        }
        failures
    }
}

impl<'a> Index<usize> for ContainerGroup<'a> {
    type Output = Container<'a>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.containers[index]
    }
}

impl<'g, 'a> IntoIterator for &'g ContainerGroup<'a> {
    type Item = &'g Container<'a>;
    type IntoIter = std::slice::Iter<'g, Container<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.containers.iter()
    }
}

impl fmt::Debug for ContainerGroup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerGroup")
            .field("containers", &self.containers)
            .field("released", &self.released)
            .finish()
    }
}

impl Drop for ContainerGroup<'_> {
    fn drop(&mut self) {
        // Failures were already reported to the sink
        let _ = self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{ContainerRuntime, RunSpec};
    use crate::testing::{Call, ContainerScript, FakeRuntime, RecordingSink};

    fn group_of<'a>(runtime: &'a FakeRuntime, sink: Arc<RecordingSink>, n: usize) -> ContainerGroup<'a> {
        let mut group = ContainerGroup::new(sink, n);
        for _ in 0..n {
            let id = runtime.start_container(&RunSpec::new("echo-server")).unwrap();
            group.push(Container::new(runtime, id, "echo-server".to_string()));
        }
        group
    }

    #[test]
    fn test_release_stops_then_removes_in_order() {
        let runtime = FakeRuntime::new();
        let sink = Arc::new(RecordingSink::new());
        let group = group_of(&runtime, sink.clone(), 2);
        let ids = runtime.started_ids();

        group.release().unwrap();

        let release_calls: Vec<Call> = runtime
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Stop(_) | Call::Remove(_)))
            .collect();
        assert_eq!(
            release_calls,
            vec![
                Call::Stop(ids[0].clone()),
                Call::Remove(ids[0].clone()),
                Call::Stop(ids[1].clone()),
                Call::Remove(ids[1].clone()),
            ]
        );
        assert!(sink.errors().is_empty());
    }

    #[test]
    fn test_drop_releases_once() {
        let runtime = FakeRuntime::new();
        let sink = Arc::new(RecordingSink::new());
        {
            let _group = group_of(&runtime, sink.clone(), 3);
        }
        assert_eq!(runtime.stopped_ids(), runtime.started_ids());
        assert_eq!(runtime.removed_ids(), runtime.started_ids());
    }

    #[test]
    fn test_stop_failure_still_removes() {
        let runtime = FakeRuntime::new().with_script(ContainerScript::ready("172.17.0.2").fail_stop());
        let sink = Arc::new(RecordingSink::new());
        let group = group_of(&runtime, sink.clone(), 1);

        let err = group.release().unwrap_err();
        match err {
            DockerCtlError::ReleaseFailed(failures) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].step, ReleaseStep::Stop);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(runtime.removed_ids().len(), 1);
        assert_eq!(sink.errors().len(), 1);
    }
}
