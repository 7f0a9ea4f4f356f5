//! Small expiring cache with a capacity bound.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::time::Duration;

use tokio::time::Instant;

/// Entries expire after a fixed lifetime (or a per-entry override); once
/// `capacity` is reached the oldest insertion is evicted.
#[derive(Debug)]
pub struct SimpleCache<K, V> {
    expiry: Duration,
    capacity: usize,
    entries: HashMap<K, (V, Instant)>,
    order: VecDeque<K>,
}

impl<K: Eq + Hash + Clone, V: Clone> SimpleCache<K, V> {
    pub fn new(expiry: Duration, capacity: usize) -> Self {
        Self {
            expiry,
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn get(&mut self, key: &K) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some((_, deadline)) => Instant::now() >= *deadline,
            None => return None,
        };
        if expired {
            self.remove(key);
            return None;
        }
        self.entries.get(key).map(|(value, _)| value.clone())
    }

    pub fn contains(&mut self, key: &K) -> bool {
        self.get(key).is_some()
    }

    pub fn set(&mut self, key: K, value: V) -> V {
        let expiry = self.expiry;
        self.set_with_expiry(key, value, expiry)
    }

    pub fn set_with_expiry(&mut self, key: K, value: V, expiry: Duration) -> V {
        if self.entries.contains_key(&key) {
            self.order.retain(|k| k != &key);
        }
        while self.order.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
        self.order.push_back(key.clone());
        self.entries
            .insert(key, (value.clone(), Instant::now() + expiry));
        value
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.order.retain(|k| k != key);
        self.entries.remove(key).map(|(value, _)| value)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
