// End-to-end checks against a real Docker daemon
// Run with: cargo test --test docker_daemon -- --ignored

use dockerctl::attrs::AttrPath;
use dockerctl::{require_docker, DockerCtlError, RunSpec};
use std::time::Duration;

#[test]
#[ignore = "requires a Docker daemon"]
fn test_alpine_pair_lifecycle() {
    let ctl = require_docker!();
    let spec = RunSpec::new("alpine:3")
        .command(["sleep", "300"])
        .label("dockerctl.test", "lifecycle");

    let ids = ctl
        .run(&spec, 2, |group| {
            for container in group.iter() {
                assert!(container.ip_address().is_some());
            }
            Ok::<_, DockerCtlError>(group.ids().iter().map(|id| id.to_string()).collect::<Vec<_>>())
        })
        .unwrap();

    // Removed containers can no longer be inspected
    for id in ids {
        assert!(ctl.runtime().inspect(&id).is_err());
    }
}

#[test]
#[ignore = "requires a Docker daemon"]
fn test_health_check_reaches_healthy() {
    let ctl = require_docker!();
    let spec = RunSpec::new("alpine:3")
        .command(["sleep", "300"])
        .extra_arg("--health-cmd=true")
        .extra_arg("--health-interval=1s")
        .timeout(Duration::from_secs(30));

    let group = ctl.acquire(&spec, 1).unwrap();
    let status = group[0]
        .attr(&AttrPath::parse("State.Health.Status"))
        .unwrap()
        .clone();
    assert_eq!(status, "healthy");
    group.release().unwrap();
}

#[test]
#[ignore = "requires a Docker daemon"]
fn test_never_healthy_times_out() {
    let ctl = require_docker!();
    let spec = RunSpec::new("alpine:3")
        .command(["sleep", "300"])
        .extra_arg("--health-cmd=false")
        .extra_arg("--health-interval=1s")
        .timeout(Duration::from_secs(5));

    let err = ctl.acquire(&spec, 1).unwrap_err();
    assert!(err.is_timeout());
    assert!(err.to_string().contains("State.Health.Status"));
}
