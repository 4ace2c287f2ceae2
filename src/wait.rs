// Readiness polling for a single container
// Refresh, resolve, compare; repeat until the condition holds or time runs out

use crate::attrs::{self, AttrPath};
use crate::clock::{Clock, SystemClock};
use crate::container::Container;
use crate::errors::{DockerCtlError, Result};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Timeout applied when the caller does not pick one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Pause between polls so the daemon is not hammered
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Condition a polled value must satisfy
#[derive(Debug, Clone, PartialEq)]
pub enum Expectation {
    /// Any truthy value
    Truthy,
    /// Exactly this value
    Equals(Value),
}

impl Expectation {
    pub fn equals(value: impl Into<Value>) -> Self {
        Expectation::Equals(value.into())
    }

    pub fn is_met_by(&self, value: &Value) -> bool {
        match self {
            Expectation::Truthy => attrs::is_truthy(value),
            Expectation::Equals(expected) => value == expected,
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Truthy => write!(f, "not null"),
            Expectation::Equals(Value::String(s)) => write!(f, "{}", s),
            Expectation::Equals(other) => write!(f, "{}", other),
        }
    }
}

pub struct ReadinessWaiter {
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
}

impl Default for ReadinessWaiter {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), DEFAULT_POLL_INTERVAL)
    }
}

impl ReadinessWaiter {
    pub fn new(clock: Arc<dyn Clock>, poll_interval: Duration) -> Self {
        Self {
            clock,
            poll_interval,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn set_poll_interval(&mut self, interval: Duration) {
        self.poll_interval = interval;
    }

    /// Poll `container` until the value at `path` satisfies `expect`.
    ///
    /// Every iteration refreshes the snapshot before reading it. A path that
    /// has not appeared yet is treated as not ready rather than as an error.
    /// Fails with [`DockerCtlError::Timeout`] carrying the last observed value
    /// once `timeout` has elapsed, or immediately if a refresh fails.
    pub fn wait_for(
        &self,
        container: &mut Container<'_>,
        path: &AttrPath,
        expect: &Expectation,
        timeout: Duration,
    ) -> Result<Value> {
        let start = self.clock.now();
        let mut last: Option<Value> = None;

        while self.clock.now().duration_since(start) < timeout {
            let snapshot = container.refresh()?;
            match attrs::resolve(snapshot, path) {
                Ok(value) if expect.is_met_by(value) => return Ok(value.clone()),
                Ok(value) => last = Some(value.clone()),
                Err(DockerCtlError::PathNotFound(_)) => last = None,
                Err(e) => return Err(e),
            }
            self.clock.sleep(self.poll_interval);
        }

        Err(DockerCtlError::Timeout {
            container: container.short_id().to_string(),
            path: path.to_string(),
            expected: expect.to_string(),
            last: describe(last.as_ref()),
        })
    }
}

fn describe(value: Option<&Value>) -> String {
    match value {
        None => "<absent>".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
