//! Concurrency-safe in-memory task registry.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use remux_models::{TaskId, TaskRecord};

/// Shared map from task identity to task record.
///
/// One coarse lock guards the map; critical sections only clone or mutate a
/// record and never block on IO, so status reads stay cheap under load.
/// Records are kept for the process lifetime: no eviction policy is defined
/// for completed tasks.
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    inner: Arc<RwLock<HashMap<TaskId, TaskRecord>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record under its own id.
    pub fn insert(&self, record: TaskRecord) {
        let mut map = self.inner.write().expect("task registry lock poisoned");
        map.insert(record.id.clone(), record);
    }

    /// Consistent point-in-time copy of a record.
    pub fn snapshot(&self, id: &TaskId) -> Option<TaskRecord> {
        let map = self.inner.read().expect("task registry lock poisoned");
        map.get(id).cloned()
    }

    /// Mutate a record in place and return the post-update snapshot.
    ///
    /// Returns `None` when the id is unknown.
    pub fn update<F>(&self, id: &TaskId, mutate: F) -> Option<TaskRecord>
    where
        F: FnOnce(&mut TaskRecord),
    {
        let mut map = self.inner.write().expect("task registry lock poisoned");
        let record = map.get_mut(id)?;
        mutate(record);
        Some(record.clone())
    }

    /// Number of registered tasks.
    pub fn len(&self) -> usize {
        self.inner.read().expect("task registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
