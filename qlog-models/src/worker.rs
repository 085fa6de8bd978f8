use std::fmt::Display;

use serde_derive::{Deserialize, Serialize};

/// The `<k>` of a `T<k>` worker marker.
pub type WorkerId = u32;

/// Key of a demultiplexed worker stream.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum Worker {
    /// The whole log, when it carries no worker markers.
    Implicit,
    Tagged(WorkerId),
}

impl Worker {
    pub fn id(&self) -> Option<WorkerId> {
        match self {
            Worker::Implicit => None,
            Worker::Tagged(id) => Some(*id),
        }
    }
}

impl Display for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Worker::Implicit => write!(f, "all"),
            Worker::Tagged(id) => write!(f, "T{}", id),
        }
    }
}
