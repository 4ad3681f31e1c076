//! Application layer: editor state, bridge and services
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod bridge;
pub mod error;
pub mod error_ext;
pub mod services;
pub mod state;

pub use bridge::{ChangeNotifier, CommitOutcome, ContentChange, EditorBridge};
pub use error::{ApplicationError, ApplicationResult};
pub use error_ext::PathResultExt;
pub use state::EditorState;
