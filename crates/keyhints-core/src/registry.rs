//! Named completer sets.
//!
//! The omnibar asks for completions by name ("omni", "bookmarks", "tabs");
//! each name maps to one [`MultiCompleter`].

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use keyhints_completion::MultiCompleter;
use keyhints_protocols::KernelError;

pub struct CompleterRegistry {
    items: DashMap<String, Arc<MultiCompleter>>,
}

impl CompleterRegistry {
    pub fn new() -> Self {
        Self {
            items: DashMap::new(),
        }
    }

    /// Fails if `name` is already taken.
    pub fn register(&self, name: &str, completer: Arc<MultiCompleter>) -> Result<(), KernelError> {
        if self.items.contains_key(name) {
            return Err(KernelError::AlreadyRegistered(name.to_string()));
        }
        debug!(name, sources = completer.completers().len(), "completer registered");
        self.items.insert(name.to_string(), completer);
        Ok(())
    }

    pub fn unregister(&self, name: &str) -> Result<Arc<MultiCompleter>, KernelError> {
        self.items
            .remove(name)
            .map(|(_, completer)| completer)
            .ok_or_else(|| KernelError::NotFound(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<Arc<MultiCompleter>> {
        self.items.get(name).map(|item| item.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.items.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.items.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Cancel whatever every completer set is doing.
    pub fn cancel_all(&self) {
        for entry in self.items.iter() {
            entry.value().cancel();
        }
    }
}

impl Default for CompleterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
