/// Common test utilities for dockerctl integration tests
use dockerctl::testing::{FakeClock, FakeRuntime, RecordingSink};
use dockerctl::DockerCtl;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// A session wired to in-memory doubles, with handles kept for assertions
#[allow(dead_code)]
pub struct TestSession {
    pub ctl: DockerCtl,
    pub runtime: Arc<FakeRuntime>,
    pub sink: Arc<RecordingSink>,
    pub clock: FakeClock,
}

impl TestSession {
    pub fn new(runtime: FakeRuntime) -> Self {
        let runtime = Arc::new(runtime);
        let sink = Arc::new(RecordingSink::new());
        let clock = FakeClock::new();
        let ctl = DockerCtl::with_runtime(Box::new(runtime.clone()))
            .with_sink(sink.clone())
            .with_clock(Arc::new(clock.clone()))
            .with_poll_interval(Duration::from_millis(100));

        TestSession {
            ctl,
            runtime,
            sink,
            clock,
        }
    }
}

/// Snapshot of a container on the default bridge network
#[allow(dead_code)]
pub fn bridge(ip: &str) -> Value {
    json!({
        "State": { "Status": "running" },
        "NetworkSettings": { "IPAddress": ip, "Networks": { "bridge": { "IPAddress": ip } } }
    })
}

/// Snapshot of a bridge container whose health check reports `status`
#[allow(dead_code)]
pub fn healthy_as(ip: &str, status: &str) -> Value {
    json!({
        "State": { "Status": "running", "Health": { "Status": status, "FailingStreak": 0 } },
        "NetworkSettings": { "IPAddress": ip }
    })
}

/// Snapshot of a container sharing the host network stack
#[allow(dead_code)]
pub fn host_network(attached: bool) -> Value {
    let networks = if attached {
        json!({ "host": { "NetworkID": "3c1f0e2d", "IPAddress": "" } })
    } else {
        json!({})
    };
    json!({
        "State": { "Status": "running" },
        "NetworkSettings": { "IPAddress": "", "Networks": networks }
    })
}
