//! Error types for DOM queries and mutations

use thiserror::Error;

use crate::node::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("Invalid selector '{selector}' at column {column}")]
    InvalidSelector { selector: String, column: u32 },

    #[error("Node {0:?} does not exist in this document")]
    InvalidNode(NodeId),

    #[error("Cannot insert {child:?} under {parent:?}: {reason}")]
    HierarchyRequest {
        parent: NodeId,
        child: NodeId,
        reason: &'static str,
    },
}
