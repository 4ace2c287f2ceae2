// Handle to a runtime-managed container
// The snapshot is only as fresh as the last refresh()

use crate::attrs::{self, AttrPath};
use crate::errors::Result;
use crate::runtime::ContainerRuntime;
use serde_json::Value;
use std::fmt;

const SHORT_ID_LEN: usize = 12;

/// A container started through a runtime, plus its last seen state
pub struct Container<'a> {
    runtime: &'a dyn ContainerRuntime,
    id: String,
    image: String,
    attrs: Value,
}

impl<'a> Container<'a> {
    pub(crate) fn new(runtime: &'a dyn ContainerRuntime, id: String, image: String) -> Self {
        Self {
            runtime,
            id,
            image,
            attrs: Value::Null,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// First 12 characters of the id, as the docker CLI shows it
    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(SHORT_ID_LEN) {
            Some((idx, _)) => &self.id[..idx],
            None => &self.id,
        }
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    /// Last fetched state snapshot (`null` before the first refresh)
    pub fn attrs(&self) -> &Value {
        &self.attrs
    }

    /// Re-read the state snapshot from the runtime
    pub fn refresh(&mut self) -> Result<&Value> {
        self.attrs = self.runtime.inspect(&self.id)?;
        Ok(&self.attrs)
    }

    /// Whether `path` is present on the current snapshot
    pub fn has_attr(&self, path: &AttrPath) -> bool {
        attrs::path_exists(&self.attrs, path)
    }

    /// Value at `path` on the current snapshot
    pub fn attr(&self, path: &AttrPath) -> Result<&Value> {
        attrs::resolve(&self.attrs, path)
    }

    /// Bridge-network IP address, if the runtime reported one
    pub fn ip_address(&self) -> Option<&str> {
        self.attr(&AttrPath::from(["NetworkSettings", "IPAddress"]))
            .ok()
            .and_then(Value::as_str)
            .filter(|ip| !ip.is_empty())
    }

    pub fn stop(&self) -> Result<()> {
        self.runtime.stop(&self.id)
    }

    pub fn remove(&self) -> Result<()> {
        self.runtime.remove(&self.id)
    }
}

impl fmt::Debug for Container<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("id", &self.id)
            .field("image", &self.image)
            .finish_non_exhaustive()
    }
}
