//! Integration tests for the editor state: selection, the widget bridge and
//! the content commits it performs.

use std::sync::{Arc, Mutex};

use outline::application::{ChangeNotifier, EditorState};
use outline::config::{EditorConfig, Settings};
use outline::domain::{
    Content, DeleteOutcome, Direction, MoveOutcome, NodeId, NodeKind, NodeRecord, SequentialIds,
};
use outline::infrastructure::traits::{EditorWidget, WidgetFactory};
use outline::infrastructure::widget::HeadlessWidgetFactory;
use serde_json::json;

// ============================================================
// Recording widget
// ============================================================

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
    notifiers: Mutex<Vec<ChangeNotifier>>,
}

impl Recorder {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn notifier(&self, n: usize) -> ChangeNotifier {
        self.notifiers.lock().unwrap()[n].clone()
    }

    fn latest(&self) -> ChangeNotifier {
        self.notifiers.lock().unwrap().last().cloned().unwrap()
    }
}

struct RecordingWidget {
    recorder: Arc<Recorder>,
    generation: u64,
}

impl EditorWidget for RecordingWidget {
    fn initialize(&mut self, content: &Content) {
        self.recorder
            .events
            .lock()
            .unwrap()
            .push(format!("init#{} {}", self.generation, content.as_value()));
    }

    fn dispose(&mut self) {
        self.recorder
            .events
            .lock()
            .unwrap()
            .push(format!("dispose#{}", self.generation));
    }
}

struct RecordingFactory(Arc<Recorder>);

impl WidgetFactory for RecordingFactory {
    fn create(&self, config: &EditorConfig, notifier: ChangeNotifier) -> Box<dyn EditorWidget> {
        assert_eq!(config.holder, "element");
        let generation = notifier.generation();
        self.0.notifiers.lock().unwrap().push(notifier);
        Box::new(RecordingWidget {
            recorder: Arc::clone(&self.0),
            generation,
        })
    }
}

// ============================================================
// Fixtures
// ============================================================

fn leaf(id: &str) -> NodeRecord {
    NodeRecord {
        id: NodeId::from(id),
        kind: NodeKind::Leaf,
        name: id.to_string(),
        content: Content::from_value(json!({"blocks": [id]})),
        parent: None,
        children: vec![],
    }
}

fn container(id: &str, children: Vec<NodeRecord>) -> NodeRecord {
    NodeRecord {
        kind: NodeKind::Container,
        children,
        ..leaf(id)
    }
}

fn state_with(records: Vec<NodeRecord>) -> (EditorState, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let state = EditorState::new(
        records,
        &Settings::default(),
        Arc::new(RecordingFactory(Arc::clone(&recorder))),
        Box::new(SequentialIds::new("s")),
    )
    .expect("state");
    (state, recorder)
}

fn blocks(state: &EditorState, id: &str) -> serde_json::Value {
    state
        .forest()
        .get(id)
        .map(|node| node.content.as_value().clone())
        .unwrap_or_default()
}

// ============================================================
// Construction
// ============================================================

#[test]
fn given_records_when_building_state_then_first_root_is_bound() {
    let (state, recorder) = state_with(vec![leaf("a"), leaf("b")]);

    assert_eq!(state.selected().as_str(), "a");
    assert_eq!(state.bridge().bound_node().map(NodeId::as_str), Some("a"));
    assert_eq!(recorder.events(), vec![r#"init#1 {"blocks":["a"]}"#]);
}

#[test]
fn given_no_records_when_building_state_then_seed_container_is_bound() {
    let (state, _) = state_with(vec![]);

    let selected = state.selected_node().expect("selected node");
    assert_eq!(selected.kind, NodeKind::Container);
    assert_eq!(selected.name, "New item");
    assert_eq!(selected.children().len(), 1);
}

// ============================================================
// Content commits
// ============================================================

#[test]
fn given_bound_widget_when_it_posts_content_then_bound_node_is_updated() {
    let (mut state, recorder) = state_with(vec![leaf("a"), leaf("b")]);

    recorder
        .latest()
        .notify(Content::from_value(json!({"blocks": ["edited"]})));

    assert_eq!(state.apply_pending_changes(), 1);
    assert_eq!(blocks(&state, "a"), json!({"blocks": ["edited"]}));
    assert_eq!(blocks(&state, "b"), json!({"blocks": ["b"]}));
}

#[test]
fn given_selection_change_when_old_widget_posts_late_then_change_is_dropped() {
    let (mut state, recorder) = state_with(vec![leaf("a"), leaf("b")]);
    let old = recorder.notifier(0);

    assert!(state.select("b"));
    old.notify(Content::from_value(json!({"blocks": ["late"]})));

    assert_eq!(state.apply_pending_changes(), 0);
    assert_eq!(blocks(&state, "a"), json!({"blocks": ["a"]}));
    assert_eq!(blocks(&state, "b"), json!({"blocks": ["b"]}));
}

#[test]
fn given_posted_edit_when_selecting_other_node_then_edit_lands_on_previous_node() {
    let (mut state, recorder) = state_with(vec![leaf("a"), leaf("b")]);

    recorder
        .latest()
        .notify(Content::from_value(json!({"blocks": ["kept"]})));
    assert!(state.select("b"));

    assert_eq!(blocks(&state, "a"), json!({"blocks": ["kept"]}));
    assert_eq!(blocks(&state, "b"), json!({"blocks": ["b"]}));
}

#[test]
fn given_selection_change_then_old_widget_is_disposed_before_new_one_starts() {
    let (mut state, recorder) = state_with(vec![leaf("a"), leaf("b")]);

    assert!(state.select("b"));

    assert_eq!(
        recorder.events(),
        vec![
            r#"init#1 {"blocks":["a"]}"#.to_string(),
            "dispose#1".to_string(),
            r#"init#2 {"blocks":["b"]}"#.to_string(),
        ]
    );
}

#[test]
fn given_unknown_id_when_selecting_then_binding_is_kept() {
    let (mut state, recorder) = state_with(vec![leaf("a")]);

    assert!(!state.select("ghost"));

    assert_eq!(state.selected().as_str(), "a");
    assert_eq!(recorder.events().len(), 1);
}

// ============================================================
// Structure edits through the state
// ============================================================

#[test]
fn given_selected_node_when_deleting_it_then_previous_sibling_is_selected() {
    let (mut state, _) = state_with(vec![leaf("a"), leaf("b"), leaf("c")]);
    assert!(state.select("c"));

    assert!(matches!(state.delete_node("c"), DeleteOutcome::Deleted(_)));

    assert_eq!(state.selected().as_str(), "b");
    assert_eq!(state.bridge().bound_node().map(NodeId::as_str), Some("b"));
}

#[test]
fn given_selected_first_node_when_deleting_it_then_next_sibling_is_selected() {
    let (mut state, _) = state_with(vec![leaf("a"), leaf("b")]);

    assert!(matches!(state.delete_node("a"), DeleteOutcome::Deleted(_)));

    assert_eq!(state.selected().as_str(), "b");
}

#[test]
fn given_selected_descendant_when_deleting_ancestor_then_ancestor_neighbour_is_selected() {
    let (mut state, _) = state_with(vec![
        container("a", vec![leaf("a1")]),
        leaf("b"),
    ]);
    assert!(state.select("a1"));

    assert!(matches!(state.delete_node("a"), DeleteOutcome::Deleted(_)));

    assert_eq!(state.selected().as_str(), "b");
}

#[test]
fn given_last_sibling_when_deleting_then_selection_is_untouched() {
    let (mut state, recorder) = state_with(vec![container("a", vec![leaf("a1")])]);
    assert!(state.select("a1"));
    let events = recorder.events().len();

    assert!(matches!(state.delete_node("a1"), DeleteOutcome::Rejected(_)));

    assert_eq!(state.selected().as_str(), "a1");
    assert_eq!(recorder.events().len(), events);
}

#[test]
fn given_state_when_moving_and_inserting_then_forest_follows() {
    let (mut state, _) = state_with(vec![leaf("a"), leaf("b")]);

    assert_eq!(state.move_node("b", Direction::Up), MoveOutcome::Moved);
    let inserted = state
        .insert_node("a", NodeKind::Leaf)
        .expect("insert")
        .inserted()
        .cloned()
        .expect("inserted");

    let order: Vec<_> = state
        .forest()
        .iter()
        .map(|(_, _, node)| node.id.to_string())
        .collect();
    assert_eq!(order, vec!["b".to_string(), "a".to_string(), inserted.to_string()]);
    assert_eq!(state.forest().get(inserted.as_str()).unwrap().name, "New item");
}

// ============================================================
// Question helpers and teardown
// ============================================================

#[test]
fn given_selected_node_when_editing_questions_then_its_content_changes() {
    let (mut state, _) = state_with(vec![leaf("a")]);

    assert!(state.add_question());
    assert!(state.add_option(1));
    assert!(!state.add_option(9));

    let content = blocks(&state, "a");
    let question = &content["blocks"][1];
    assert_eq!(question["type"], json!("question"));
    assert_eq!(question["items"].as_array().map(Vec::len), Some(2));

    assert!(state.remove_option(1, 0));
    assert!(state.remove_question(1));
    assert_eq!(blocks(&state, "a"), json!({"blocks": ["a"]}));
}

#[test]
fn given_pending_edit_when_tearing_down_then_edit_is_committed_and_widget_disposed() {
    let (state, recorder) = state_with(vec![leaf("a")]);
    recorder
        .latest()
        .notify(Content::from_value(json!({"blocks": ["final"]})));

    let forest = state.teardown();

    assert_eq!(
        forest.get("a").unwrap().content.as_value(),
        &json!({"blocks": ["final"]})
    );
    assert_eq!(recorder.events().last().map(String::as_str), Some("dispose#1"));
}

#[test]
fn given_headless_factory_when_notifying_then_commit_goes_through_bridge() {
    let factory = HeadlessWidgetFactory::new();
    let mut state = EditorState::new(
        vec![leaf("a"), leaf("b")],
        &Settings::default(),
        Arc::new(factory.clone()),
        Box::new(SequentialIds::new("h")),
    )
    .expect("state");

    assert!(state.select("b"));
    let notifier = factory.notifier().expect("notifier");
    assert!(notifier.notify(Content::from_value(json!({"blocks": ["headless"]}))));

    let forest = state.teardown();
    assert_eq!(
        forest.get("b").unwrap().content.as_value(),
        &json!({"blocks": ["headless"]})
    );
}

#[test]
fn given_posted_edit_when_adding_question_then_both_edit_and_question_survive() {
    let (mut state, recorder) = state_with(vec![leaf("a")]);
    recorder
        .latest()
        .notify(Content::from_value(json!({"blocks": [{"type": "paragraph"}]})));

    assert!(state.add_question());
    state.apply_pending_changes();

    let content = blocks(&state, "a");
    let kinds: Vec<_> = content["blocks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|block| block["type"].clone())
        .collect();
    assert_eq!(kinds, vec![json!("paragraph"), json!("question")]);
}

#[test]
fn given_question_added_when_widget_saves_again_then_question_is_not_reverted() {
    let (mut state, recorder) = state_with(vec![leaf("a")]);

    assert!(state.add_question());

    // The rebound widget starts from the content holding the question
    let last_init = recorder.events().last().cloned().unwrap();
    assert!(last_init.starts_with("init#2"), "{last_init}");
    assert!(last_init.contains("question"), "{last_init}");

    // A snapshot from the replaced widget no longer applies
    recorder
        .notifier(0)
        .notify(Content::from_value(json!({"blocks": ["a"]})));
    assert_eq!(state.apply_pending_changes(), 0);
    assert_eq!(blocks(&state, "a")["blocks"][1]["type"], json!("question"));
}
