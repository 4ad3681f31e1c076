//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::NodeId;

/// Domain errors represent broken tree invariants.
/// The three UI policies (not found, boundary, last sibling) are outcomes, not errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("duplicate node id: {0}")]
    DuplicateId(NodeId),

    #[error("node id must not be empty")]
    EmptyId,

    #[error("forest has no root nodes")]
    EmptyForest,

    #[error("parent back-reference of {0} does not match its container")]
    BrokenParentLink(NodeId),

    #[error("cycle detected at node: {0}")]
    CycleDetected(NodeId),

    #[error("{count} node(s) unreachable from the forest roots")]
    Orphaned { count: usize },

    #[error("no fresh node id after {attempts} attempts")]
    IdExhausted { attempts: usize },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
