use thiserror::Error;

use crate::hierarchy::NodeRef;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("unknown node in hierarchy graph: {0:?}")]
    UnknownNode(NodeRef),

    #[error("node {0:?} has more than one parent edge")]
    MultipleParents(NodeRef),

    #[error("cycle detected in hierarchy graph starting from {0:?}")]
    CycleDetected(NodeRef),
}
