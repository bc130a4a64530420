use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::path::PathBuf;

/// Maximum number of decoded icons kept around
pub const ICON_CACHE_CAPACITY: usize = 20;

/// Fixed-size map that evicts in insertion order (FIFO, not LRU).
///
/// Lookups do not refresh an entry's position.
#[derive(Debug)]
pub struct BoundedCache<K, V> {
    capacity: usize,
    entries: HashMap<K, V>,
    order: VecDeque<K>,
}

impl<K, V> BoundedCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    #[cfg(test)]
    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert a value. An existing key is overwritten in place.
    /// Returns the evicted key, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<K> {
        if let Some(slot) = self.entries.get_mut(&key) {
            *slot = value;
            return None;
        }

        let mut evicted = None;
        if self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
                evicted = Some(oldest);
            }
        }

        self.order.push_back(key.clone());
        self.entries.insert(key, value);
        evicted
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Process name -> executable path.
///
/// Only successful lookups are stored. Entries are never evicted, only
/// invalidated when the path turns out to be useless.
#[derive(Debug, Default)]
pub struct ExePathMemo {
    paths: HashMap<String, PathBuf>,
}

impl ExePathMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names are compared case-insensitively
    fn key(name: &str) -> String {
        name.to_lowercase()
    }

    pub fn get(&self, name: &str) -> Option<&PathBuf> {
        self.paths.get(&Self::key(name))
    }

    pub fn remember(&mut self, name: &str, path: PathBuf) {
        self.paths.insert(Self::key(name), path);
    }

    pub fn invalidate(&mut self, name: &str) -> Option<PathBuf> {
        self.paths.remove(&Self::key(name))
    }

    /// Return the memoized path, or run `scan` and remember a hit
    pub fn get_or_scan<F>(&mut self, name: &str, scan: F) -> Option<PathBuf>
    where
        F: FnOnce(&str) -> Option<PathBuf>,
    {
        if let Some(path) = self.get(name) {
            return Some(path.clone());
        }
        let found = scan(name)?;
        self.remember(name, found.clone());
        Some(found)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.paths.len()
    }
}
