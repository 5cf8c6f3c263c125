//! In-memory reference implementation of [`SketchStore`].

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::errors::{Error, Result};
use crate::sketch::{Sketch, SyncStatus};

use super::SketchStore;

/// HashMap-backed store with per-owner watch channels.
///
/// Used by the test suites and as the behavioral reference for durable
/// implementations: per-record write atomicity, full-list snapshots on
/// every mutation, newest-first ordering.
#[derive(Default)]
pub struct MemorySketchStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    records: HashMap<String, Sketch>,
    subscribers: HashMap<String, watch::Sender<Vec<Sketch>>>,
}

impl Inner {
    fn owner_snapshot(&self, owner_id: &str) -> Vec<Sketch> {
        let mut sketches: Vec<Sketch> = self
            .records
            .values()
            .filter(|sketch| sketch.owner_id == owner_id)
            .cloned()
            .collect();
        sketches.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sketches
    }

    fn notify(&self, owner_id: &str) {
        if let Some(tx) = self.subscribers.get(owner_id) {
            let _ = tx.send(self.owner_snapshot(owner_id));
        }
    }
}

impl MemorySketchStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| Error::store("sketch store lock poisoned"))
    }
}

#[async_trait]
impl SketchStore for MemorySketchStore {
    fn subscribe(&self, owner_id: &str) -> watch::Receiver<Vec<Sketch>> {
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let snapshot = inner.owner_snapshot(owner_id);
        inner
            .subscribers
            .entry(owner_id.to_string())
            .or_insert_with(|| watch::channel(snapshot).0)
            .subscribe()
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Sketch>> {
        Ok(self.lock()?.records.get(id).cloned())
    }

    async fn insert(&self, sketch: Sketch) -> Result<()> {
        let mut inner = self.lock()?;
        let owner_id = sketch.owner_id.clone();
        inner.records.insert(sketch.id.clone(), sketch);
        inner.notify(&owner_id);
        Ok(())
    }

    async fn update(&self, sketch: Sketch) -> Result<()> {
        let mut inner = self.lock()?;
        if !inner.records.contains_key(&sketch.id) {
            return Ok(());
        }
        let owner_id = sketch.owner_id.clone();
        inner.records.insert(sketch.id.clone(), sketch);
        inner.notify(&owner_id);
        Ok(())
    }

    async fn delete_by_id(&self, id: &str) -> Result<()> {
        let mut inner = self.lock()?;
        if let Some(removed) = inner.records.remove(id) {
            inner.notify(&removed.owner_id);
        }
        Ok(())
    }

    async fn get_by_status(&self, status: SyncStatus) -> Result<Vec<Sketch>> {
        Ok(self
            .lock()?
            .records
            .values()
            .filter(|sketch| sketch.sync_status == status)
            .cloned()
            .collect())
    }
}
