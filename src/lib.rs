//! Chapter outline editor core.
//!
//! An ordered forest of chapters (leaves and containers) with
//! move/insert/delete operations that keep every sibling group non-empty,
//! plus a bridge that binds a single rich-text editor widget to the
//! selected chapter.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
