//! Core domain logic for the SketchApp local-first sync engine.
//!
//! The local record store is the single source of truth; every read comes
//! from it, every write lands there first and is reconciled with the remote
//! tiers (a metadata document store and a blob store) by the sync engine.

pub mod errors;
pub mod remote;
pub mod sketch;
pub mod store;
pub mod sync;

pub use errors::{Error, Result};
pub use sketch::{DrawingPath, Sketch, SketchDocument, SketchService, SyncStatus};
pub use store::{MemorySketchStore, SketchStore};
pub use sync::{SyncEngine, SyncRunner, SyncScheduler};

#[cfg(test)]
mod testutil;
