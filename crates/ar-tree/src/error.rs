use ar_core::NodeId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("tree `{tree}` references unknown node {node}")]
    UnknownNode { tree: String, node: NodeId },

    #[error("tree `{tree}`: transitions may only leave behavior nodes, {node} is a branch")]
    TransitionFromBranch { tree: String, node: NodeId },

    #[error("tree `{tree}`: entry {entry} of {node} has invalid weight {value}")]
    InvalidWeight {
        tree:  String,
        node:  NodeId,
        entry: usize,
        value: f32,
    },

    #[error("tree `{tree}`: branch children form a cycle through {node}")]
    Cycle { tree: String, node: NodeId },
}

pub type TreeResult<T> = Result<T, TreeError>;
