// Attribute path resolution over container state snapshots
// Snapshots are untyped JSON trees as reported by `docker inspect`

use crate::errors::{DockerCtlError, Result};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Ordered sequence of keys locating a value inside a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AttrPath(Vec<String>);

impl AttrPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse dotted notation, e.g. "State.Health.Status"
    /// An empty string yields the empty path.
    pub fn parse(dotted: &str) -> Self {
        if dotted.is_empty() {
            return Self::default();
        }
        Self::new(dotted.split('.'))
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl FromStr for AttrPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&[&str]> for AttrPath {
    fn from(segments: &[&str]) -> Self {
        Self::new(segments.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for AttrPath {
    fn from(segments: [&str; N]) -> Self {
        Self::new(segments)
    }
}

/// Walk `path` through `snapshot`, stopping at the first missing key
fn traverse<'v>(snapshot: &'v Value, path: &AttrPath) -> Option<&'v Value> {
    let mut current = snapshot;
    for key in path.segments() {
        current = current.as_object()?.get(key)?;
    }
    Some(current)
}

/// Check whether every segment of `path` is present in `snapshot`.
///
/// Never fails: a missing key or a non-object value met part way down the
/// path both report `false`. A key holding `null` counts as present.
pub fn path_exists(snapshot: &Value, path: &AttrPath) -> bool {
    traverse(snapshot, path).is_some()
}

/// Extract the value at `path`, failing with `PathNotFound` on any missing segment
pub fn resolve<'v>(snapshot: &'v Value, path: &AttrPath) -> Result<&'v Value> {
    traverse(snapshot, path).ok_or_else(|| DockerCtlError::PathNotFound(path.to_string()))
}

/// Truthiness of a snapshot value: null, false, zero and empty
/// strings/arrays/objects are falsy
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
