//! Arena-backed chapter forest and its structural mutations.
//!
//! Ownership is the forward `children` relation; `parent` is a back-reference
//! kept in step by every mutation. All mutations follow the same shape:
//! locate the containing sibling group, find the index inside it, splice.

use std::collections::HashSet;

use generational_arena::{Arena, Index};
use termtree::Tree;
use tracing::{debug, instrument};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::ids::IdGenerator;
use crate::domain::{
    Content, DeleteOutcome, Direction, InsertOutcome, MoveOutcome, Node, NodeId, NodeKind,
    NodeRecord, RejectReason, SiblingGroup,
};

const MAX_ID_ATTEMPTS: usize = 64;

/// Ordered forest of chapter nodes. Never empty.
#[derive(Debug)]
pub struct Forest {
    /// Arena storage for all nodes
    arena: Arena<Node>,
    /// Root sibling group in display order
    roots: Vec<Index>,
    /// Every id this forest has held; fresh ids never repeat one
    issued: HashSet<NodeId>,
}

impl Forest {
    fn empty() -> Self {
        Self {
            arena: Arena::new(),
            roots: Vec::new(),
            issued: HashSet::new(),
        }
    }

    /// Default forest: one Container holding one default Leaf.
    #[instrument(level = "debug", skip(ids))]
    pub fn seeded(name: &str, ids: &mut dyn IdGenerator) -> DomainResult<Self> {
        let mut forest = Self::empty();
        let (root, _) = forest.create_node(NodeKind::Container, name, None, ids)?;
        forest.roots.push(root);
        Ok(forest)
    }

    /// Build a forest from the serialized nested shape.
    ///
    /// Parent back-references are recomputed from the nesting. An empty
    /// input is seeded with the default tree.
    #[instrument(level = "debug", skip(records, ids))]
    pub fn from_records(
        records: Vec<NodeRecord>,
        seed_name: &str,
        ids: &mut dyn IdGenerator,
    ) -> DomainResult<Self> {
        if records.is_empty() {
            debug!("from_records: empty input, seeding default tree");
            return Self::seeded(seed_name, ids);
        }
        let mut forest = Self::empty();
        for record in records {
            let idx = forest.load_record(record, None)?;
            forest.roots.push(idx);
        }
        debug!("from_records: loaded {} nodes", forest.len());
        Ok(forest)
    }

    fn load_record(&mut self, record: NodeRecord, parent: Option<Index>) -> DomainResult<Index> {
        if record.id.is_empty() {
            return Err(DomainError::EmptyId);
        }
        if !self.issued.insert(record.id.clone()) {
            return Err(DomainError::DuplicateId(record.id));
        }
        let NodeRecord {
            id,
            kind,
            name,
            content,
            children,
            ..
        } = record;
        let idx = self
            .arena
            .insert(Node::new(id, kind, name, content, parent));
        for child in children {
            let child_idx = self.load_record(child, Some(idx))?;
            if let Some(node) = self.arena.get_mut(idx) {
                node.children.push(child_idx);
            }
        }
        Ok(idx)
    }

    /// Serialized nested shape, roots first, children in order.
    pub fn to_records(&self) -> Vec<NodeRecord> {
        self.roots
            .iter()
            .filter_map(|&idx| self.record_of(idx))
            .collect()
    }

    fn record_of(&self, idx: Index) -> Option<NodeRecord> {
        let node = self.arena.get(idx)?;
        Some(NodeRecord {
            id: node.id.clone(),
            kind: node.kind,
            name: node.name.clone(),
            content: node.content.clone(),
            parent: node
                .parent
                .and_then(|p| self.arena.get(p))
                .map(|p| p.id.clone()),
            children: node
                .children
                .iter()
                .filter_map(|&child| self.record_of(child))
                .collect(),
        })
    }

    // ============================================================
    // Queries
    // ============================================================

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn node(&self, idx: Index) -> Option<&Node> {
        self.arena.get(idx)
    }

    pub fn get(&self, node_id: &str) -> Option<&Node> {
        self.index_of(node_id).and_then(|idx| self.arena.get(idx))
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.index_of(node_id).is_some()
    }

    pub fn first_id(&self) -> Option<&NodeId> {
        self.roots
            .first()
            .and_then(|&idx| self.arena.get(idx))
            .map(|node| &node.id)
    }

    /// Id of the node holding `node_id`, None at root level or if unknown.
    pub fn parent_id(&self, node_id: &str) -> Option<&NodeId> {
        let parent = self.get(node_id)?.parent?;
        self.arena.get(parent).map(|node| &node.id)
    }

    fn index_of(&self, node_id: &str) -> Option<Index> {
        if node_id.is_empty() {
            return None;
        }
        self.iter()
            .find(|(_, _, node)| node.id == node_id)
            .map(|(idx, _, _)| idx)
    }

    /// Pre-order traversal in document order: `(index, depth, node)`.
    pub fn iter(&self) -> ForestIter<'_> {
        ForestIter::new(self)
    }

    /// Number of levels in the deepest branch.
    pub fn depth(&self) -> usize {
        self.iter().map(|(_, depth, _)| depth + 1).max().unwrap_or(0)
    }

    /// Members of a sibling group in order.
    pub fn members(&self, group: SiblingGroup) -> &[Index] {
        match group {
            SiblingGroup::Root => &self.roots,
            SiblingGroup::Children(idx) => self
                .arena
                .get(idx)
                .map(|node| node.children.as_slice())
                .unwrap_or(&[]),
        }
    }

    /// Nodes of a sibling group in order.
    pub fn siblings(&self, group: SiblingGroup) -> Vec<&Node> {
        self.members(group)
            .iter()
            .filter_map(|&idx| self.arena.get(idx))
            .collect()
    }

    fn members_mut(&mut self, group: SiblingGroup) -> Option<&mut Vec<Index>> {
        match group {
            SiblingGroup::Root => Some(&mut self.roots),
            SiblingGroup::Children(idx) => self.arena.get_mut(idx).map(|node| &mut node.children),
        }
    }

    /// Sibling group containing `node_id`.
    ///
    /// Depth-first pre-order search in document order: each node is checked
    /// before its children. Empty or unknown ids yield None.
    #[instrument(level = "trace", skip(self))]
    pub fn find_sibling_group(&self, node_id: &str) -> Option<SiblingGroup> {
        self.locate(node_id).map(|(group, _)| group)
    }

    /// Sibling group and position of `node_id`.
    pub fn locate(&self, node_id: &str) -> Option<(SiblingGroup, usize)> {
        if node_id.is_empty() {
            return None;
        }
        self.search(SiblingGroup::Root, node_id)
    }

    fn search(&self, group: SiblingGroup, node_id: &str) -> Option<(SiblingGroup, usize)> {
        for (pos, &idx) in self.members(group).iter().enumerate() {
            let Some(node) = self.arena.get(idx) else {
                continue;
            };
            if node.id == node_id {
                return Some((group, pos));
            }
            if let Some(found) = self.search(SiblingGroup::Children(idx), node_id) {
                return Some(found);
            }
        }
        None
    }

    /// Sibling that takes over after `node_id` is removed: previous one, else next one.
    pub fn neighbour(&self, node_id: &str) -> Option<&NodeId> {
        let (group, pos) = self.locate(node_id)?;
        let members = self.members(group);
        let idx = if pos > 0 {
            members.get(pos - 1)
        } else {
            members.get(pos + 1)
        }?;
        self.arena.get(*idx).map(|node| &node.id)
    }

    // ============================================================
    // Mutations
    // ============================================================

    /// Swap `node_id` with its neighbour in `direction`.
    ///
    /// Moving the first node Up or the last node Down leaves the forest untouched.
    #[instrument(level = "debug", skip(self))]
    pub fn move_node(&mut self, node_id: &str, direction: Direction) -> MoveOutcome {
        let Some((group, pos)) = self.locate(node_id) else {
            debug!("move_node: {} not found", node_id);
            return MoveOutcome::NotFound;
        };
        let Some(members) = self.members_mut(group) else {
            return MoveOutcome::NotFound;
        };
        let target = match direction {
            Direction::Up if pos == 0 => return MoveOutcome::BoundaryNoOp,
            Direction::Up => pos - 1,
            Direction::Down if pos + 1 >= members.len() => return MoveOutcome::BoundaryNoOp,
            Direction::Down => pos + 1,
        };
        members.swap(pos, target);
        MoveOutcome::Moved
    }

    /// Insert a new node right after `after_id` in the same sibling group.
    ///
    /// A Container is created with exactly one default Leaf child.
    #[instrument(level = "debug", skip(self, ids))]
    pub fn insert_node(
        &mut self,
        after_id: &str,
        kind: NodeKind,
        name: &str,
        ids: &mut dyn IdGenerator,
    ) -> DomainResult<InsertOutcome> {
        let Some((group, pos)) = self.locate(after_id) else {
            debug!("insert_node: {} not found", after_id);
            return Ok(InsertOutcome::NotFound);
        };
        let (idx, id) = self.create_node(kind, name, group.owner(), ids)?;
        if let Some(members) = self.members_mut(group) {
            members.insert(pos + 1, idx);
        }
        Ok(InsertOutcome::Inserted(id))
    }

    /// Remove `node_id` and its whole subtree.
    ///
    /// The only member of a sibling group is never removed.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_node(&mut self, node_id: &str) -> DeleteOutcome {
        let Some((group, pos)) = self.locate(node_id) else {
            debug!("delete_node: {} not found", node_id);
            return DeleteOutcome::NotFound;
        };
        let Some(members) = self.members_mut(group) else {
            return DeleteOutcome::NotFound;
        };
        if members.len() <= 1 {
            debug!("delete_node: {} is the last sibling", node_id);
            return DeleteOutcome::Rejected(RejectReason::LastSibling);
        }
        let idx = members.remove(pos);
        DeleteOutcome::Deleted(self.remove_subtree(idx))
    }

    pub fn rename(&mut self, node_id: &str, name: impl Into<String>) -> bool {
        match self.node_mut(node_id) {
            Some(node) => {
                node.name = name.into();
                true
            }
            None => false,
        }
    }

    pub fn set_content(&mut self, node_id: &str, content: Content) -> bool {
        match self.node_mut(node_id) {
            Some(node) => {
                node.content = content;
                true
            }
            None => false,
        }
    }

    pub fn node_mut(&mut self, node_id: &str) -> Option<&mut Node> {
        let idx = self.index_of(node_id)?;
        self.arena.get_mut(idx)
    }

    fn create_node(
        &mut self,
        kind: NodeKind,
        name: &str,
        parent: Option<Index>,
        ids: &mut dyn IdGenerator,
    ) -> DomainResult<(Index, NodeId)> {
        let id = self.fresh_id(ids)?;
        let idx = self.arena.insert(Node::new(
            id.clone(),
            kind,
            name.to_string(),
            Content::empty_blocks(),
            parent,
        ));
        if kind == NodeKind::Container {
            let leaf_id = self.fresh_id(ids)?;
            let leaf = self.arena.insert(Node::new(
                leaf_id,
                NodeKind::Leaf,
                name.to_string(),
                Content::empty(),
                Some(idx),
            ));
            if let Some(node) = self.arena.get_mut(idx) {
                node.children.push(leaf);
            }
        }
        Ok((idx, id))
    }

    fn fresh_id(&mut self, ids: &mut dyn IdGenerator) -> DomainResult<NodeId> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = ids.next_id();
            if !candidate.is_empty() && self.issued.insert(candidate.clone()) {
                return Ok(candidate);
            }
        }
        Err(DomainError::IdExhausted {
            attempts: MAX_ID_ATTEMPTS,
        })
    }

    fn remove_subtree(&mut self, idx: Index) -> Vec<NodeId> {
        let mut removed = Vec::new();
        let mut stack = vec![idx];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current) {
                stack.extend(node.children.iter().rev());
                removed.push(node.id);
            }
        }
        removed
    }

    // ============================================================
    // Invariants
    // ============================================================

    /// Check every structural invariant of the forest.
    pub fn validate(&self) -> DomainResult<()> {
        if self.roots.is_empty() {
            return Err(DomainError::EmptyForest);
        }
        let mut seen_ids = HashSet::new();
        let mut visited = HashSet::new();
        let mut stack: Vec<(Index, Option<Index>)> =
            self.roots.iter().rev().map(|&idx| (idx, None)).collect();

        while let Some((idx, expected_parent)) = stack.pop() {
            let Some(node) = self.arena.get(idx) else {
                continue;
            };
            if !visited.insert(idx) {
                return Err(DomainError::CycleDetected(node.id.clone()));
            }
            if node.id.is_empty() {
                return Err(DomainError::EmptyId);
            }
            if !seen_ids.insert(&node.id) {
                return Err(DomainError::DuplicateId(node.id.clone()));
            }
            if node.parent != expected_parent {
                return Err(DomainError::BrokenParentLink(node.id.clone()));
            }
            stack.extend(node.children.iter().rev().map(|&child| (child, Some(idx))));
        }

        if visited.len() != self.arena.len() {
            return Err(DomainError::Orphaned {
                count: self.arena.len() - visited.len(),
            });
        }
        Ok(())
    }

    // ============================================================
    // Display
    // ============================================================

    pub fn to_tree(&self, title: &str) -> Tree<String> {
        fn build(forest: &Forest, idx: Index) -> Option<Tree<String>> {
            let node = forest.arena.get(idx)?;
            let label = match node.kind {
                NodeKind::Container => format!("{} [{}]", node.name, node.id),
                NodeKind::Leaf => format!("{} ({})", node.name, node.id),
            };
            let leaves: Vec<_> = node
                .children
                .iter()
                .filter_map(|&child| build(forest, child))
                .collect();
            Some(Tree::new(label).with_leaves(leaves))
        }

        let leaves: Vec<_> = self
            .roots
            .iter()
            .filter_map(|&idx| build(self, idx))
            .collect();
        Tree::new(title.to_string()).with_leaves(leaves)
    }
}

/// Pre-order iterator, left-to-right.
pub struct ForestIter<'a> {
    forest: &'a Forest,
    stack: Vec<(Index, usize)>,
}

impl<'a> ForestIter<'a> {
    fn new(forest: &'a Forest) -> Self {
        let stack = forest.roots.iter().rev().map(|&idx| (idx, 0)).collect();
        Self { forest, stack }
    }
}

impl<'a> Iterator for ForestIter<'a> {
    type Item = (Index, usize, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((idx, depth)) = self.stack.pop() {
            if let Some(node) = self.forest.arena.get(idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push((child, depth + 1));
                }
                return Some((idx, depth, node));
            }
        }
        None
    }
}
