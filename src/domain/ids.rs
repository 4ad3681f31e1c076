//! Client-side node id generation.

use uuid::Uuid;

use crate::domain::NodeId;

/// Source of candidate node ids. The forest rejects candidates it has already seen.
pub trait IdGenerator {
    fn next_id(&mut self) -> NodeId;
}

/// Random ids: `<prefix><uuid-v4 simple>`.
#[derive(Debug, Clone)]
pub struct UuidIds {
    prefix: String,
}

impl UuidIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for UuidIds {
    fn default() -> Self {
        Self::new("temp-")
    }
}

impl IdGenerator for UuidIds {
    fn next_id(&mut self) -> NodeId {
        NodeId::new(format!("{}{}", self.prefix, Uuid::new_v4().simple()))
    }
}

/// Deterministic ids: `<prefix>1`, `<prefix>2`, ...
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> NodeId {
        let id = NodeId::new(format!("{}{}", self.prefix, self.next));
        self.next += 1;
        id
    }
}
