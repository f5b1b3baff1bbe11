// src/models/mod.rs

//! Domain models for the watcher application.

mod record;
mod seen;

// Re-export all public types
pub use record::{Record, identity};
pub use seen::{SeenEntry, SeenSet};
