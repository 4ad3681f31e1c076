//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::OutlineService;
use crate::application::{ApplicationResult, EditorState};
use crate::config::Settings;
use crate::domain::{NodeRecord, UuidIds};
use crate::infrastructure::traits::{FileSystem, RealFileSystem, Uploader, WidgetFactory};
use crate::infrastructure::upload::FsUploader;

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Outline file service
    pub outline: OutlineService,

    /// Upload endpoint for media blocks
    pub uploader: Arc<dyn Uploader>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let settings = Arc::new(settings);
        let outline = OutlineService::new(Arc::clone(&fs));
        let uploader = Arc::new(FsUploader::new(
            fs,
            settings.media.dir.clone(),
            settings.media.base_url.clone(),
        ));

        Self {
            settings,
            outline,
            uploader,
        }
    }

    /// Id generator configured with the settings' prefix.
    pub fn id_generator(&self) -> UuidIds {
        UuidIds::new(self.settings.id_prefix.clone())
    }

    /// Editor state over `records`, with the widgets built by `factory`.
    pub fn editor_state(
        &self,
        records: Vec<NodeRecord>,
        factory: Arc<dyn WidgetFactory>,
    ) -> ApplicationResult<EditorState> {
        EditorState::new(
            records,
            &self.settings,
            factory,
            Box::new(self.id_generator()),
        )
    }
}
