//! Ordered id→task mapping shared between producer threads and the
//! renderer. Iteration order is first-insertion order among the entries
//! currently present; replacing an entry keeps its position.

use std::sync::{Arc, RwLock};

use crate::task::Task;

#[derive(Default)]
pub struct TaskRegistry {
    entries: RwLock<Vec<(String, Arc<Task>)>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `task` under `id`, or replaces the existing task in place
    /// without changing its position.
    pub fn insert(&self, id: impl Into<String>, task: Arc<Task>) {
        let id = id.into();
        let mut entries = self.entries.write().unwrap();
        match entries.iter().position(|(existing, _)| *existing == id) {
            Some(index) => entries[index].1 = task,
            None => entries.push((id, task)),
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<Task>> {
        self.entries
            .read()
            .unwrap()
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, task)| task.clone())
    }

    /// Removes and returns the task under `id`. Remaining entries keep
    /// their relative order.
    pub fn remove(&self, id: &str) -> Option<Arc<Task>> {
        let mut entries = self.entries.write().unwrap();
        let index = entries.iter().position(|(existing, _)| existing == id)?;
        Some(entries.remove(index).1)
    }

    /// Visits every entry in insertion order. The traversal runs over a
    /// snapshot taken under the read lock, so the visitor may insert or
    /// remove entries (on this or any other thread) without deadlocking or
    /// observing a torn sequence.
    pub fn for_each(&self, mut visit: impl FnMut(&str, &Arc<Task>)) {
        let snapshot = self.entries.read().unwrap().clone();
        for (id, task) in &snapshot {
            visit(id, task);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
