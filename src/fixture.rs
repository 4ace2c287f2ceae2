// Test-session integration: shared session and skip-vs-fail policy

use crate::config::Settings;
use crate::errors::{DockerCtlError, Result};
use crate::session::DockerCtl;
use std::sync::OnceLock;

pub const NO_DOCKER_REASON: &str =
    "Could not connect to a Docker daemon? Make sure the test process can access the Docker socket.";

/// Validate `ctl` once. On an unreachable daemon either skip (`Ok(None)`) or
/// fail, depending on `skip_no_docker`.
pub fn establish(ctl: DockerCtl, skip_no_docker: bool) -> Result<Option<DockerCtl>> {
    match ctl.ping() {
        Ok(()) => Ok(Some(ctl)),
        Err(DockerCtlError::Connection(detail)) => {
            tracing::error!(detail = %detail, "{}", NO_DOCKER_REASON);
            if skip_no_docker {
                Ok(None)
            } else {
                Err(DockerCtlError::Connection(format!("{} ({})", NO_DOCKER_REASON, detail)))
            }
        }
        Err(e) => Err(e),
    }
}

/// Build a session from `settings` and validate it
pub fn session(settings: &Settings) -> Result<Option<DockerCtl>> {
    establish(DockerCtl::from_settings(settings)?, settings.skip_no_docker)
}

static SHARED: OnceLock<std::result::Result<Option<DockerCtl>, String>> = OnceLock::new();

/// Process-wide session, created on first use from [`Settings::from_env`]
pub fn shared_session() -> Result<Option<&'static DockerCtl>> {
    let cached = SHARED.get_or_init(|| {
        Settings::from_env()
            .and_then(|settings| session(&settings))
            .map_err(|e| e.to_string())
    });
    match cached {
        Ok(ctl) => Ok(ctl.as_ref()),
        Err(msg) => Err(DockerCtlError::Connection(msg.clone())),
    }
}

/// Yield the shared `&'static DockerCtl`, returning early from the enclosing
/// test when the daemon is unreachable and skipping is enabled
///
/// ```no_run
/// use dockerctl::{require_docker, RunSpec};
///
/// fn echo_server_answers() {
///     let ctl = require_docker!();
///     ctl.run(&RunSpec::new("hashicorp/http-echo"), 2, |group| {
///         for container in group.iter() {
///             assert!(container.ip_address().is_some());
///         }
///         Ok::<_, dockerctl::DockerCtlError>(())
///     })
///     .unwrap();
/// }
/// ```
#[macro_export]
macro_rules! require_docker {
    () => {
        match $crate::fixture::shared_session() {
            Ok(Some(ctl)) => ctl,
            Ok(None) => {
                eprintln!("skipping: {}", $crate::fixture::NO_DOCKER_REASON);
                return;
            }
            Err(e) => panic!("{}", e),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::RunSpec;
    use crate::testing::{Call, FakeRuntime};
    use std::sync::Arc;

    #[test]
    fn test_establish_reachable() {
        let ctl = DockerCtl::with_runtime(Box::new(FakeRuntime::new()));
        assert!(establish(ctl, false).unwrap().is_some());
    }

    #[test]
    fn test_unreachable_skips_when_enabled() {
        let ctl = DockerCtl::with_runtime(Box::new(FakeRuntime::unreachable()));
        assert!(establish(ctl, true).unwrap().is_none());
    }

    #[test]
    fn test_unreachable_fails_by_default() {
        let ctl = DockerCtl::with_runtime(Box::new(FakeRuntime::unreachable()));
        let err = establish(ctl, false).unwrap_err();
        assert!(err.to_string().contains("Could not connect to a Docker daemon?"));
    }

    #[test]
    fn test_session_pings_once() {
        let runtime = Arc::new(FakeRuntime::new());
        let ctl = DockerCtl::with_runtime(Box::new(runtime.clone()));
        let ctl = establish(ctl, false).unwrap().unwrap();
        ctl.start_container(&RunSpec::new("alpine")).unwrap();

        let calls = runtime.calls();
        assert_eq!(calls.iter().filter(|c| **c == Call::Ping).count(), 1);
        assert_eq!(calls[0], Call::Ping);
    }

    #[test]
    fn test_session_rejects_bad_url() {
        let settings = Settings {
            docker_url: Some("localhost:2375".to_string()),
            ..Settings::default()
        };
        assert!(matches!(session(&settings), Err(DockerCtlError::Config(_))));
    }
}
