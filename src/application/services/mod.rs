//! Application services

pub mod outline;

pub use outline::OutlineService;
