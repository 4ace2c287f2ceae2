// Library interface for dockerctl
// Throwaway containers for integration tests: start, wait until ready, always tear down

pub mod attrs;
pub mod cli;
pub mod clock;
pub mod config;
pub mod container;
pub mod docker;
pub mod errors;
pub mod events;
pub mod fixture;
pub mod group;
pub mod logging;
pub mod runtime;
pub mod session;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod wait;

pub use attrs::AttrPath;
pub use container::Container;
pub use errors::{DockerCtlError, Result};
pub use group::ContainerGroup;
pub use runtime::{ContainerRuntime, RunSpec};
pub use session::DockerCtl;
pub use wait::Expectation;
