// In-memory doubles for exercising harness code without a daemon

use crate::clock::Clock;
use crate::errors::{DockerCtlError, Result};
use crate::events::{Event, EventSink, Level};
use crate::runtime::{ContainerRuntime, RunSpec};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Fake clock for testing that doesn't use real time
#[derive(Clone)]
pub struct FakeClock {
    time: Arc<Mutex<Instant>>,
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            time: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        let mut time = lock(&self.time);
        *time += duration;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *lock(&self.time)
    }

    fn sleep(&self, duration: Duration) {
        // Advance time manually instead of sleeping
        self.advance(duration);
    }
}

/// A runtime call, in the order it was made
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Ping,
    Start(String),
    Inspect(String),
    Stop(String),
    Remove(String),
}

/// Scripted behaviour for the next started container
#[derive(Debug, Clone, Default)]
pub struct ContainerScript {
    snapshots: Vec<Value>,
    fail_stop: bool,
    fail_remove: bool,
}

impl ContainerScript {
    /// Successive inspects return these snapshots; the last one repeats
    pub fn new(snapshots: Vec<Value>) -> Self {
        Self {
            snapshots,
            ..Self::default()
        }
    }

    /// Networked container with no health check
    pub fn ready(ip: &str) -> Self {
        Self::new(vec![json!({
            "State": { "Status": "running", "Running": true },
            "NetworkSettings": { "IPAddress": ip, "Networks": { "bridge": { "IPAddress": ip } } }
        })])
    }

    pub fn fail_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    pub fn fail_remove(mut self) -> Self {
        self.fail_remove = true;
        self
    }
}

#[derive(Default)]
struct FakeState {
    reachable: bool,
    pending: VecDeque<ContainerScript>,
    containers: HashMap<String, ContainerScript>,
    inspects: HashMap<String, usize>,
    broken_inspect: HashSet<String>,
    fail_start_at: Option<usize>,
    started: usize,
    calls: Vec<Call>,
}

/// Runtime double that replays [`ContainerScript`]s in start order
pub struct FakeRuntime {
    state: Mutex<FakeState>,
}

impl Default for FakeRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                reachable: true,
                ..FakeState::default()
            }),
        }
    }

    /// Daemon that refuses every ping
    pub fn unreachable() -> Self {
        let runtime = Self::new();
        lock(&runtime.state).reachable = false;
        runtime
    }

    /// Queue the script for the next container started
    pub fn push_script(&self, script: ContainerScript) {
        lock(&self.state).pending.push_back(script);
    }

    pub fn with_script(self, script: ContainerScript) -> Self {
        self.push_script(script);
        self
    }

    /// Make the start request with this 0-based index fail
    pub fn fail_start_at(self, index: usize) -> Self {
        lock(&self.state).fail_start_at = Some(index);
        self
    }

    /// Make every further inspect of `id` fail
    pub fn fail_inspect(&self, id: &str) {
        lock(&self.state).broken_inspect.insert(id.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.state).calls.clone()
    }

    /// Ids handed out so far, in start order
    pub fn started_ids(&self) -> Vec<String> {
        (0..lock(&self.state).started).map(fake_id).collect()
    }

    pub fn stopped_ids(&self) -> Vec<String> {
        self.calls_matching(|call| match call {
            Call::Stop(id) => Some(id.clone()),
            _ => None,
        })
    }

    pub fn removed_ids(&self) -> Vec<String> {
        self.calls_matching(|call| match call {
            Call::Remove(id) => Some(id.clone()),
            _ => None,
        })
    }

    pub fn inspect_count(&self, id: &str) -> usize {
        lock(&self.state).inspects.get(id).copied().unwrap_or(0)
    }

    fn calls_matching<F>(&self, f: F) -> Vec<String>
    where
        F: Fn(&Call) -> Option<String>,
    {
        lock(&self.state).calls.iter().filter_map(f).collect()
    }
}

fn fake_id(index: usize) -> String {
    format!("fake{:02}{}", index + 1, "0".repeat(58))
}

impl ContainerRuntime for FakeRuntime {
    fn ping(&self) -> Result<()> {
        let mut state = lock(&self.state);
        state.calls.push(Call::Ping);
        if state.reachable {
            Ok(())
        } else {
            Err(DockerCtlError::Connection(
                "connection refused (fake daemon)".to_string(),
            ))
        }
    }

    fn start_container(&self, spec: &RunSpec) -> Result<String> {
        let mut state = lock(&self.state);
        state.calls.push(Call::Start(spec.image.clone()));

        let index = state.started;
        if state.fail_start_at == Some(index) {
            return Err(DockerCtlError::Runtime(format!(
                "Unable to find image '{}' locally",
                spec.image
            )));
        }

        let script = state
            .pending
            .pop_front()
            .unwrap_or_else(|| ContainerScript::ready(&format!("172.17.0.{}", index + 2)));
        let id = fake_id(index);
        state.started += 1;
        state.containers.insert(id.clone(), script);
        Ok(id)
    }

    fn inspect(&self, id: &str) -> Result<Value> {
        let mut state = lock(&self.state);
        state.calls.push(Call::Inspect(id.to_string()));
        if state.broken_inspect.contains(id) {
            return Err(DockerCtlError::Runtime(format!("Error: No such container: {}", id)));
        }

        let count = state.inspects.entry(id.to_string()).or_insert(0);
        let index = *count;
        *count += 1;

        let script = state
            .containers
            .get(id)
            .ok_or_else(|| DockerCtlError::Runtime(format!("Error: No such container: {}", id)))?;
        let snapshot = script
            .snapshots
            .get(index)
            .or_else(|| script.snapshots.last())
            .cloned()
            .unwrap_or_else(|| json!({}));
        Ok(snapshot)
    }

    fn stop(&self, id: &str) -> Result<()> {
        let mut state = lock(&self.state);
        state.calls.push(Call::Stop(id.to_string()));
        match state.containers.get(id).map(|script| script.fail_stop) {
            Some(true) => Err(DockerCtlError::Runtime(format!(
                "cannot stop container {}: permission denied",
                id
            ))),
            Some(false) => Ok(()),
            None => Err(DockerCtlError::Runtime(format!("Error: No such container: {}", id))),
        }
    }

    fn remove(&self, id: &str) -> Result<()> {
        let mut state = lock(&self.state);
        state.calls.push(Call::Remove(id.to_string()));
        match state.containers.get(id).map(|script| script.fail_remove) {
            Some(true) => Err(DockerCtlError::Runtime(format!(
                "removal of container {} is already in progress",
                id
            ))),
            Some(false) => {
                state.containers.remove(id);
                Ok(())
            }
            None => Err(DockerCtlError::Runtime(format!("Error: No such container: {}", id))),
        }
    }
}

/// Sink that keeps every event for later assertions
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(Level, Event)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        lock(&self.events).iter().map(|(_, e)| e.clone()).collect()
    }

    pub fn errors(&self) -> Vec<Event> {
        lock(&self.events)
            .iter()
            .filter(|(level, _)| *level == Level::Error)
            .map(|(_, e)| e.clone())
            .collect()
    }

    /// Rendered messages, in emission order
    pub fn messages(&self) -> Vec<String> {
        lock(&self.events).iter().map(|(_, e)| e.to_string()).collect()
    }
}

impl EventSink for RecordingSink {
    fn info(&self, event: &Event) {
        lock(&self.events).push((Level::Info, event.clone()));
    }

    fn error(&self, event: &Event) {
        lock(&self.events).push((Level::Error, event.clone()));
    }
}

// A panicking test may poison a lock; the data is still usable for assertions.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
