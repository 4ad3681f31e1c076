//! Domain layer: entities and tree logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod content;
pub mod entities;
pub mod error;
pub mod forest;
pub mod ids;

pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use forest::{Forest, ForestIter};
pub use ids::{IdGenerator, SequentialIds, UuidIds};
