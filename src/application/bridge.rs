//! Editor bridge: binds exactly one rich-text widget to the selected node.
//!
//! Widgets report edits by posting a [`ContentChange`] through their
//! [`ChangeNotifier`]. The owner drains the channel in arrival order; a change
//! is committed only while the widget that produced it is still the active one.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::config::EditorConfig;
use crate::domain::{Content, Forest, NodeId};
use crate::infrastructure::traits::{EditorWidget, WidgetFactory};

/// Serialized snapshot posted by a widget after its save step resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentChange {
    /// Binding the snapshot was produced under
    pub generation: u64,
    pub content: Content,
}

/// Handle a widget uses to post content snapshots back to the bridge.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    generation: u64,
    sender: Sender<ContentChange>,
}

impl ChangeNotifier {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Post a snapshot. Returns false once the bridge is gone.
    pub fn notify(&self, content: Content) -> bool {
        self.sender
            .send(ContentChange {
                generation: self.generation,
                content,
            })
            .is_ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// Produced by a widget that has since been disposed
    Stale,
    /// The bound node is no longer in the forest
    NotFound,
}

struct Binding {
    node: NodeId,
    generation: u64,
    widget: Box<dyn EditorWidget>,
}

pub struct EditorBridge {
    factory: Arc<dyn WidgetFactory>,
    config: EditorConfig,
    active: Option<Binding>,
    generation: u64,
    sender: Sender<ContentChange>,
    receiver: Receiver<ContentChange>,
}

impl EditorBridge {
    pub fn new(factory: Arc<dyn WidgetFactory>, config: EditorConfig) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            factory,
            config,
            active: None,
            generation: 0,
            sender,
            receiver,
        }
    }

    /// Node the active widget is bound to.
    pub fn bound_node(&self) -> Option<&NodeId> {
        self.active.as_ref().map(|binding| &binding.node)
    }

    /// Generation of the active binding.
    pub fn active_generation(&self) -> Option<u64> {
        self.active.as_ref().map(|binding| binding.generation)
    }

    /// Re-point the widget at `node_id`.
    ///
    /// The previous widget is disposed before the next one is constructed.
    /// Unknown ids leave the current binding in place and return false.
    #[instrument(level = "debug", skip(self, forest))]
    pub fn select_node(&mut self, forest: &Forest, node_id: &str) -> bool {
        let Some(node) = forest.get(node_id) else {
            debug!("select_node: {} not found", node_id);
            return false;
        };
        self.dispose();

        self.generation += 1;
        let notifier = ChangeNotifier {
            generation: self.generation,
            sender: self.sender.clone(),
        };
        let mut widget = self.factory.create(&self.config, notifier);
        widget.initialize(&node.content);

        self.active = Some(Binding {
            node: node.id.clone(),
            generation: self.generation,
            widget,
        });
        debug!("select_node: bound {} (generation {})", node_id, self.generation);
        true
    }

    /// Dispose the active widget, if any.
    pub fn dispose(&mut self) {
        if let Some(mut binding) = self.active.take() {
            debug!("dispose: releasing widget for {}", binding.node);
            binding.widget.dispose();
        }
    }

    /// Commit one snapshot into the bound node.
    #[instrument(level = "trace", skip(self, forest, change), fields(generation = change.generation))]
    pub fn on_content_changed(&self, forest: &mut Forest, change: ContentChange) -> CommitOutcome {
        match &self.active {
            Some(binding) if binding.generation == change.generation => {
                if forest.set_content(binding.node.as_str(), change.content) {
                    CommitOutcome::Committed
                } else {
                    debug!("on_content_changed: {} no longer exists", binding.node);
                    CommitOutcome::NotFound
                }
            }
            _ => {
                debug!(
                    "on_content_changed: dropping stale change from generation {}",
                    change.generation
                );
                CommitOutcome::Stale
            }
        }
    }

    /// Drain posted snapshots in arrival order. Returns the number committed.
    pub fn apply_pending(&self, forest: &mut Forest) -> usize {
        let mut committed = 0;
        while let Ok(change) = self.receiver.try_recv() {
            if self.on_content_changed(forest, change) == CommitOutcome::Committed {
                committed += 1;
            }
        }
        committed
    }
}

impl Drop for EditorBridge {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NodeKind, NodeRecord, SequentialIds};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Log {
        events: Mutex<Vec<String>>,
        notifiers: Mutex<Vec<ChangeNotifier>>,
    }

    impl Log {
        fn push(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }

        fn notifier(&self, n: usize) -> ChangeNotifier {
            self.notifiers.lock().unwrap()[n].clone()
        }
    }

    struct RecordingWidget {
        generation: u64,
        log: Arc<Log>,
    }

    impl EditorWidget for RecordingWidget {
        fn initialize(&mut self, content: &Content) {
            self.log
                .push(format!("init#{} {}", self.generation, content.as_value()));
        }

        fn dispose(&mut self) {
            self.log.push(format!("dispose#{}", self.generation));
        }
    }

    struct RecordingFactory(Arc<Log>);

    impl WidgetFactory for RecordingFactory {
        fn create(&self, _config: &EditorConfig, notifier: ChangeNotifier) -> Box<dyn EditorWidget> {
            self.0.notifiers.lock().unwrap().push(notifier.clone());
            Box::new(RecordingWidget {
                generation: notifier.generation(),
                log: Arc::clone(&self.0),
            })
        }
    }

    fn leaf(id: &str, content: serde_json::Value) -> NodeRecord {
        NodeRecord {
            id: id.into(),
            kind: NodeKind::Leaf,
            name: id.into(),
            content: Content::from_value(content),
            parent: None,
            children: vec![],
        }
    }

    fn setup() -> (Forest, EditorBridge, Arc<Log>) {
        let forest = Forest::from_records(
            vec![leaf("a", json!({"blocks": ["a"]})), leaf("b", json!({"blocks": ["b"]}))],
            "New item",
            &mut SequentialIds::new("n"),
        )
        .unwrap();
        let log = Arc::new(Log::default());
        let bridge = EditorBridge::new(
            Arc::new(RecordingFactory(Arc::clone(&log))),
            EditorConfig::default(),
        );
        (forest, bridge, log)
    }

    #[test]
    fn switching_selection_disposes_before_constructing() {
        let (forest, mut bridge, log) = setup();
        assert!(bridge.select_node(&forest, "a"));
        assert!(bridge.select_node(&forest, "b"));
        assert_eq!(
            log.events(),
            vec![
                r#"init#1 {"blocks":["a"]}"#.to_string(),
                "dispose#1".to_string(),
                r#"init#2 {"blocks":["b"]}"#.to_string(),
            ]
        );
        assert_eq!(bridge.bound_node().map(NodeId::as_str), Some("b"));
    }

    #[test]
    fn unknown_node_keeps_current_binding() {
        let (forest, mut bridge, _log) = setup();
        bridge.select_node(&forest, "a");
        assert!(!bridge.select_node(&forest, "zzz"));
        assert_eq!(bridge.bound_node().map(NodeId::as_str), Some("a"));
        assert_eq!(bridge.active_generation(), Some(1));
    }

    #[test]
    fn change_is_committed_into_bound_node_only() {
        let (mut forest, mut bridge, log) = setup();
        bridge.select_node(&forest, "a");
        log.notifier(0).notify(Content::from_value(json!({"blocks": [1, 2]})));

        assert_eq!(bridge.apply_pending(&mut forest), 1);
        assert_eq!(
            forest.get("a").unwrap().content.as_value(),
            &json!({"blocks": [1, 2]})
        );
        assert_eq!(
            forest.get("b").unwrap().content.as_value(),
            &json!({"blocks": ["b"]})
        );
    }

    #[test]
    fn stale_change_from_disposed_widget_is_dropped() {
        let (mut forest, mut bridge, log) = setup();
        bridge.select_node(&forest, "a");
        bridge.select_node(&forest, "b");
        log.notifier(0).notify(Content::from_value(json!({"blocks": ["late"]})));

        assert_eq!(bridge.apply_pending(&mut forest), 0);
        assert_eq!(
            forest.get("a").unwrap().content.as_value(),
            &json!({"blocks": ["a"]})
        );
        assert_eq!(
            forest.get("b").unwrap().content.as_value(),
            &json!({"blocks": ["b"]})
        );
    }

    #[test]
    fn dropping_bridge_disposes_widget() {
        let (forest, mut bridge, log) = setup();
        bridge.select_node(&forest, "a");
        drop(bridge);
        assert_eq!(log.events().last().map(String::as_str), Some("dispose#1"));
    }
}
