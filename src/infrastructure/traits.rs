//! I/O boundary traits for testability
//!
//! These traits abstract external collaborators (filesystem, editor widget,
//! upload endpoint), allowing services to be tested with mock implementations.

use std::io;
use std::path::Path;

use crate::application::bridge::ChangeNotifier;
use crate::config::EditorConfig;
use crate::domain::Content;
use crate::infrastructure::upload::{UploadRequest, UploadResponse};
use crate::infrastructure::InfraResult;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write string content to file.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Copy file from source to destination.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64>;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;
}

/// Rich-text editing widget bound to one node's content.
pub trait EditorWidget: Send {
    /// Load `content` into the widget.
    fn initialize(&mut self, content: &Content);

    /// Release everything the widget holds. No notifications follow.
    fn dispose(&mut self);
}

/// Constructs widgets for the editor bridge.
pub trait WidgetFactory: Send + Sync {
    /// Build a widget that reports edits through `notifier`.
    fn create(&self, config: &EditorConfig, notifier: ChangeNotifier) -> Box<dyn EditorWidget>;
}

/// Upload endpoint used by media blocks.
pub trait Uploader: Send + Sync {
    fn upload(&self, request: &UploadRequest) -> InfraResult<UploadResponse>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        std::fs::copy(from, to)
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
                std::fs::create_dir_all(parent)
            }
            _ => Ok(()),
        }
    }
}
