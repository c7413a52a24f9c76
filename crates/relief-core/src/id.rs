use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use std::borrow::Borrow;
use std::fmt;

new_key_type! {
    /// Slot of a node in the world's storage. Only meaningful for the
    /// [`World`](crate::world::World) that issued it.
    pub struct NodeKey;

    /// Slot of a route in the world's storage.
    pub struct EdgeKey;
}

/// Stable, human-readable node identifier such as `"Village_B"`.
///
/// Unique within a world and stable for the lifetime of a simulation run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// Lets ordered maps keyed by `NodeId` be queried with a plain `&str`.
impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
