//! Editor state owner: forest, selection and editor bridge.
//!
//! All UI events go through an explicit [`EditorState`]; nothing is global.
//! Construction seeds an empty outline and binds the first root node,
//! teardown commits pending edits and disposes the widget.

use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::application::bridge::EditorBridge;
use crate::application::ApplicationResult;
use crate::config::Settings;
use crate::domain::{
    content, Content, DeleteOutcome, Direction, DomainError, Forest, IdGenerator, InsertOutcome,
    MoveOutcome, Node, NodeId, NodeKind, NodeRecord,
};
use crate::infrastructure::traits::WidgetFactory;

pub struct EditorState {
    forest: Forest,
    selected: NodeId,
    bridge: EditorBridge,
    ids: Box<dyn IdGenerator + Send>,
    default_name: String,
}

impl EditorState {
    /// Build state from the serialized tree supplied at startup.
    pub fn new(
        records: Vec<NodeRecord>,
        settings: &Settings,
        factory: Arc<dyn WidgetFactory>,
        mut ids: Box<dyn IdGenerator + Send>,
    ) -> ApplicationResult<Self> {
        let forest = Forest::from_records(records, &settings.default_name, ids.as_mut())?;
        Self::with_forest(forest, settings, factory, ids)
    }

    /// Take ownership of an already built forest and bind its first root.
    pub fn with_forest(
        forest: Forest,
        settings: &Settings,
        factory: Arc<dyn WidgetFactory>,
        ids: Box<dyn IdGenerator + Send>,
    ) -> ApplicationResult<Self> {
        forest.validate()?;
        let selected = forest.first_id().cloned().ok_or(DomainError::EmptyForest)?;
        let mut bridge = EditorBridge::new(factory, settings.editor.clone());
        bridge.select_node(&forest, selected.as_str());
        info!("editor state ready: {} nodes, selected {}", forest.len(), selected);
        Ok(Self {
            forest,
            selected,
            bridge,
            ids,
            default_name: settings.default_name.clone(),
        })
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn selected(&self) -> &NodeId {
        &self.selected
    }

    pub fn selected_node(&self) -> Option<&Node> {
        self.forest.get(self.selected.as_str())
    }

    pub fn bridge(&self) -> &EditorBridge {
        &self.bridge
    }

    /// Commit edits the widget has posted so far.
    pub fn apply_pending_changes(&mut self) -> usize {
        self.bridge.apply_pending(&mut self.forest)
    }

    /// Select `node_id` and re-point the widget at it.
    ///
    /// Edits already posted by the outgoing widget are committed first.
    #[instrument(level = "debug", skip(self))]
    pub fn select(&mut self, node_id: &str) -> bool {
        if !self.forest.contains(node_id) {
            debug!("select: {} not found", node_id);
            return false;
        }
        self.apply_pending_changes();
        if self.bridge.select_node(&self.forest, node_id) {
            self.selected = NodeId::from(node_id);
            true
        } else {
            false
        }
    }

    pub fn move_node(&mut self, node_id: &str, direction: Direction) -> MoveOutcome {
        self.forest.move_node(node_id, direction)
    }

    pub fn insert_node(&mut self, after_id: &str, kind: NodeKind) -> ApplicationResult<InsertOutcome> {
        Ok(self
            .forest
            .insert_node(after_id, kind, &self.default_name, self.ids.as_mut())?)
    }

    /// Delete `node_id` with its subtree.
    ///
    /// When the selection disappears with it, the previous sibling of the
    /// deleted node is selected, else the next one.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_node(&mut self, node_id: &str) -> DeleteOutcome {
        let fallback = self.forest.neighbour(node_id).cloned();
        self.apply_pending_changes();
        let outcome = self.forest.delete_node(node_id);
        if let DeleteOutcome::Deleted(removed) = &outcome {
            if removed.contains(&self.selected) {
                if let Some(next) = fallback {
                    debug!("delete_node: selection {} removed, selecting {}", self.selected, next);
                    self.select(next.as_str());
                }
            }
        }
        outcome
    }

    pub fn rename(&mut self, node_id: &str, name: impl Into<String>) -> bool {
        self.forest.rename(node_id, name)
    }

    // ============================================================
    // Question blocks of the selected node
    // ============================================================

    pub fn add_question(&mut self) -> bool {
        let option_id = self.ids.next_id();
        self.edit_selected(|content| {
            content::add_question(content, option_id.as_str());
            true
        })
    }

    pub fn add_option(&mut self, question: usize) -> bool {
        let option_id = self.ids.next_id();
        self.edit_selected(|content| content::add_option(content, question, option_id.as_str()))
    }

    pub fn remove_question(&mut self, question: usize) -> bool {
        self.edit_selected(|content| content::remove_question(content, question))
    }

    pub fn remove_option(&mut self, question: usize, option: usize) -> bool {
        self.edit_selected(|content| content::remove_option(content, question, option))
    }

    /// Apply `edit` to the selected node's content.
    ///
    /// Snapshots already posted by the widget land first; on change the
    /// widget is re-initialized so its next save carries the edit.
    fn edit_selected(&mut self, edit: impl FnOnce(&mut Content) -> bool) -> bool {
        self.apply_pending_changes();
        let changed = self
            .forest
            .node_mut(self.selected.as_str())
            .is_some_and(|node| edit(&mut node.content));
        if changed {
            self.bridge.select_node(&self.forest, self.selected.as_str());
        }
        changed
    }

    /// Commit pending edits, dispose the widget and hand the forest to the caller.
    pub fn teardown(mut self) -> Forest {
        self.apply_pending_changes();
        self.bridge.dispose();
        let Self { forest, .. } = self;
        forest
    }
}
