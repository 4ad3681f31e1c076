//! Headless editor widget for hosts without a rich-text UI (CLI, scripting).
//!
//! The widget keeps the loaded content in memory; edits are fed in from the
//! outside through the notifier of the most recently created widget.

use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::application::bridge::ChangeNotifier;
use crate::config::EditorConfig;
use crate::domain::Content;
use crate::infrastructure::traits::{EditorWidget, WidgetFactory};

pub struct HeadlessWidget {
    holder: String,
    content: Option<Content>,
    // Dropped on dispose: a disposed widget cannot post anything.
    notifier: Option<ChangeNotifier>,
}

impl EditorWidget for HeadlessWidget {
    fn initialize(&mut self, content: &Content) {
        debug!("headless widget #{}: initialize", self.holder);
        self.content = Some(content.clone());
    }

    fn dispose(&mut self) {
        debug!("headless widget #{}: dispose", self.holder);
        self.content = None;
        self.notifier = None;
    }
}

#[derive(Clone, Default)]
pub struct HeadlessWidgetFactory {
    latest: Arc<Mutex<Option<ChangeNotifier>>>,
}

impl HeadlessWidgetFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifier of the most recently created widget.
    pub fn notifier(&self) -> Option<ChangeNotifier> {
        self.latest.lock().ok().and_then(|slot| slot.clone())
    }
}

impl WidgetFactory for HeadlessWidgetFactory {
    fn create(&self, config: &EditorConfig, notifier: ChangeNotifier) -> Box<dyn EditorWidget> {
        if let Ok(mut slot) = self.latest.lock() {
            *slot = Some(notifier.clone());
        }
        Box::new(HeadlessWidget {
            holder: config.holder.clone(),
            content: None,
            notifier: Some(notifier),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::bridge::EditorBridge;
    use crate::domain::{Forest, SequentialIds};
    use serde_json::json;

    #[test]
    fn factory_exposes_notifier_of_latest_widget() {
        let mut ids = SequentialIds::new("n");
        let mut forest = Forest::seeded("New item", &mut ids).unwrap();
        let factory = HeadlessWidgetFactory::new();
        assert!(factory.notifier().is_none());

        let mut bridge = EditorBridge::new(Arc::new(factory.clone()), EditorConfig::default());
        bridge.select_node(&forest, "n2");
        let notifier = factory.notifier().unwrap();
        assert_eq!(Some(notifier.generation()), bridge.active_generation());

        notifier.notify(Content::from_value(json!({"blocks": ["x"]})));
        assert_eq!(bridge.apply_pending(&mut forest), 1);
        assert_eq!(forest.get("n2").unwrap().content.blocks().len(), 1);
    }
}
