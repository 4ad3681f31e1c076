//! Domain entities: core data structures

use std::fmt;

use generational_arena::Index;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

/// Opaque, forest-unique node identifier.
///
/// Ids coming from storage may be numeric; they are kept as their decimal
/// string so that every id in a forest compares the same way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NodeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => NodeId(s),
            RawId::Signed(n) => NodeId(n.to_string()),
            RawId::Unsigned(n) => NodeId(n.to_string()),
        })
    }
}

/// Node discriminator. Serialized as the numeric `type` code: 0 = Leaf, 1 = Container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum NodeKind {
    /// Holds direct content
    Leaf,
    /// May hold children; created with one default Leaf
    Container,
}

impl From<NodeKind> for u8 {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Leaf => 0,
            NodeKind::Container => 1,
        }
    }
}

impl TryFrom<u8> for NodeKind {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(NodeKind::Leaf),
            1 => Ok(NodeKind::Container),
            other => Err(format!("unknown node type code: {other}")),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Leaf => f.write_str("leaf"),
            NodeKind::Container => f.write_str("container"),
        }
    }
}

/// Opaque block payload produced and consumed by the editor widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Content(Value);

impl Content {
    /// `{}`: content of the default Leaf inside a new Container.
    pub fn empty() -> Self {
        Self(json!({}))
    }

    /// `{"blocks": []}`: content of a freshly added node.
    pub fn empty_blocks() -> Self {
        Self(json!({ "blocks": [] }))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn as_value_mut(&mut self) -> &mut Value {
        &mut self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Content blocks, empty when the payload has no `blocks` array.
    pub fn blocks(&self) -> &[Value] {
        self.0
            .get("blocks")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl Default for Content {
    fn default() -> Self {
        Self::empty()
    }
}

/// A node stored in the forest arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub name: String,
    pub content: Content,
    /// Back-reference to the containing node, None at root level
    pub(crate) parent: Option<Index>,
    /// Owned children in display order
    pub(crate) children: Vec<Index>,
}

impl Node {
    pub(crate) fn new(
        id: NodeId,
        kind: NodeKind,
        name: String,
        content: Content,
        parent: Option<Index>,
    ) -> Self {
        Self {
            id,
            kind,
            name,
            content,
            parent,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<Index> {
        self.parent
    }

    pub fn children(&self) -> &[Index] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Serialized nested node shape, as supplied at startup and handed to storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content: Content,
    #[serde(default, rename = "parent_chapter")]
    pub parent: Option<NodeId>,
    #[serde(default)]
    pub children: Vec<NodeRecord>,
}

/// Handle to an ordered sibling sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiblingGroup {
    /// The forest's root sequence
    Root,
    /// The `children` sequence of the node at this index
    Children(Index),
}

impl SiblingGroup {
    pub(crate) fn owner(self) -> Option<Index> {
        match self {
            SiblingGroup::Root => None,
            SiblingGroup::Children(idx) => Some(idx),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    /// Already first (Up) or last (Down)
    BoundaryNoOp,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(NodeId),
    NotFound,
}

impl InsertOutcome {
    pub fn inserted(&self) -> Option<&NodeId> {
        match self {
            InsertOutcome::Inserted(id) => Some(id),
            InsertOutcome::NotFound => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The node is the only member of its sibling group
    LastSibling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Ids of the removed node and its whole subtree, pre-order
    Deleted(Vec<NodeId>),
    Rejected(RejectReason),
    NotFound,
}
