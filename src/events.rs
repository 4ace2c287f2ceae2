// Lifecycle events reported while acquiring and releasing containers

use std::fmt;

/// Severity of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

/// One step in a container's life inside a group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Started { image: String, container: String },
    Waiting { image: String, container: String },
    Ready { image: String, container: String },
    WaitTimedOut { image: String, container: String, reason: String },
    Stopped { image: String, container: String },
    StopFailed { image: String, container: String, reason: String },
    Removed { image: String, container: String },
    RemoveFailed { image: String, container: String, reason: String },
}

impl Event {
    pub fn level(&self) -> Level {
        match self {
            Event::WaitTimedOut { .. } | Event::StopFailed { .. } | Event::RemoveFailed { .. } => {
                Level::Error
            }
            _ => Level::Info,
        }
    }

    pub fn image(&self) -> &str {
        match self {
            Event::Started { image, .. }
            | Event::Waiting { image, .. }
            | Event::Ready { image, .. }
            | Event::WaitTimedOut { image, .. }
            | Event::Stopped { image, .. }
            | Event::StopFailed { image, .. }
            | Event::Removed { image, .. }
            | Event::RemoveFailed { image, .. } => image,
        }
    }

    /// Short id of the container the event is about
    pub fn container(&self) -> &str {
        match self {
            Event::Started { container, .. }
            | Event::Waiting { container, .. }
            | Event::Ready { container, .. }
            | Event::WaitTimedOut { container, .. }
            | Event::Stopped { container, .. }
            | Event::StopFailed { container, .. }
            | Event::Removed { container, .. }
            | Event::RemoveFailed { container, .. } => container,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ", self.image(), self.container())?;
        match self {
            Event::Started { .. } => write!(f, "Started container"),
            Event::Waiting { .. } => write!(f, "Waiting on networking and health check..."),
            Event::Ready { .. } => write!(f, "Container ready"),
            Event::WaitTimedOut { reason, .. } => write!(f, "Container not ready: {}", reason),
            Event::Stopped { .. } => write!(f, "Stopped container"),
            Event::StopFailed { reason, .. } => write!(f, "Failed to stop container: {}", reason),
            Event::Removed { .. } => write!(f, "Removed container"),
            Event::RemoveFailed { reason, .. } => {
                write!(f, "Failed to remove container: {}", reason)
            }
        }
    }
}

/// Receiver for lifecycle events
pub trait EventSink: Send + Sync {
    fn info(&self, event: &Event);

    fn error(&self, event: &Event);

    /// Dispatch on the event's own level
    fn emit(&self, event: &Event) {
        match event.level() {
            Level::Info => self.info(event),
            Level::Error => self.error(event),
        }
    }
}

/// Forwards events to the `tracing` subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn info(&self, event: &Event) {
        tracing::info!(image = %event.image(), container = %event.container(), "{}", event);
    }

    fn error(&self, event: &Event) {
        tracing::error!(image = %event.image(), container = %event.container(), "{}", event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> Event {
        Event::Started {
            image: "echo-server".to_string(),
            container: "4f1c2a9e8b7d".to_string(),
        }
    }

    #[test]
    fn test_display_prefixes_image_and_container() {
        assert_eq!(started().to_string(), "echo-server:4f1c2a9e8b7d Started container");
    }

    #[test]
    fn test_levels() {
        assert_eq!(started().level(), Level::Info);
        let failed = Event::StopFailed {
            image: "echo-server".to_string(),
            container: "4f1c2a9e8b7d".to_string(),
            reason: "no such container".to_string(),
        };
        assert_eq!(failed.level(), Level::Error);
        assert!(failed.to_string().ends_with("Failed to stop container: no such container"));
    }
}
