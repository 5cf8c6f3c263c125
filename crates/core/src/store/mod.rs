//! Local durable record store contract.

mod memory;

pub use memory::MemorySketchStore;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::errors::Result;
use crate::sketch::{Sketch, SyncStatus};

/// Local record store keyed by sketch ID. The single source of truth read
/// by the UI layer; all mutations funnel through the sync engine or the
/// sketch service.
#[async_trait]
pub trait SketchStore: Send + Sync {
    /// Subscribe to the full sketch list of one owner, newest first.
    ///
    /// The receiver observes a fresh snapshot on every mutation, including
    /// the transient `Syncing` write. Snapshots are advisory, not
    /// transactional.
    fn subscribe(&self, owner_id: &str) -> watch::Receiver<Vec<Sketch>>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Sketch>>;

    /// Insert or replace the record.
    async fn insert(&self, sketch: Sketch) -> Result<()>;

    /// Update an existing record; a no-op when the record is gone (a
    /// concurrent delete wins over an in-flight status write).
    async fn update(&self, sketch: Sketch) -> Result<()>;

    async fn delete_by_id(&self, id: &str) -> Result<()>;

    /// All records currently in `status`, across owners.
    async fn get_by_status(&self, status: SyncStatus) -> Result<Vec<Sketch>>;
}
