//! Outline file service
//!
//! Reads and writes the serialized node tree. Storage is a plain JSON array
//! of nested nodes; this service adds no format of its own.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, PathResultExt};
use crate::domain::{Forest, IdGenerator, NodeRecord};
use crate::infrastructure::traits::FileSystem;

/// Service for loading and saving outline files.
pub struct OutlineService {
    fs: Arc<dyn FileSystem>,
}

impl OutlineService {
    /// Create a new outline service.
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Read the serialized node tree.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> ApplicationResult<Vec<NodeRecord>> {
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read outline", path)?;
        if content.trim().is_empty() {
            debug!("load: {} is empty", path.display());
            return Ok(Vec::new());
        }
        let records: Vec<NodeRecord> =
            serde_json::from_str(&content).with_path_context("parse outline", path)?;
        debug!("load: {} root nodes", records.len());
        Ok(records)
    }

    /// Load and build the forest, seeding an empty outline.
    pub fn load_forest(
        &self,
        path: &Path,
        seed_name: &str,
        ids: &mut dyn IdGenerator,
    ) -> ApplicationResult<Forest> {
        let records = self.load(path)?;
        Ok(Forest::from_records(records, seed_name, ids)?)
    }

    /// Write the full forest.
    #[instrument(level = "debug", skip(self, forest))]
    pub fn save(&self, path: &Path, forest: &Forest) -> ApplicationResult<()> {
        let json = serde_json::to_string_pretty(&forest.to_records())
            .with_path_context("serialize outline", path)?;
        self.fs
            .ensure_parent(path)
            .with_path_context("create parent", path)?;
        self.fs
            .write(path, &format!("{json}\n"))
            .with_path_context("write outline", path)?;
        debug!("save: wrote {} nodes", forest.len());
        Ok(())
    }

    /// Create a new outline holding the default tree.
    pub fn init(
        &self,
        path: &Path,
        seed_name: &str,
        ids: &mut dyn IdGenerator,
    ) -> ApplicationResult<Forest> {
        if self.fs.exists(path) {
            return Err(ApplicationError::OutlineExists(path.to_path_buf()));
        }
        let forest = Forest::seeded(seed_name, ids)?;
        self.save(path, &forest)?;
        Ok(forest)
    }
}
