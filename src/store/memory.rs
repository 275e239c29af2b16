//! In-memory store
//!
//! BTreeMap-based reference implementation of the full store capability,
//! with an explicit Open/Closed lifecycle behind a RwLock.
//!
//! Iterators snapshot the matching range at creation, so a scan is never
//! invalidated by later writes. The batch applies all of its records under
//! a single write-lock acquisition, making them visible together.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Result, StoreError};

use super::{
    replay_ops, Batch, BatchOp, ErrorIterator, KeyValueWriter, Store, StoreIterator,
};

/// Lifecycle of the store contents
enum MemState {
    Open(BTreeMap<Vec<u8>, Vec<u8>>),
    Closed,
}

/// A sorted in-memory key-value store
///
/// Handles are cheap to clone and share the same underlying map, so a
/// store can be handed to a wrapper while the original handle keeps
/// observing (or closing) it.
#[derive(Clone)]
pub struct MemStore {
    state: Arc<RwLock<MemState>>,
}

impl MemStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MemState::Open(BTreeMap::new()))),
        }
    }

    /// Whether `key` is present
    pub fn has(&self, key: &[u8]) -> Result<bool> {
        match &*self.state.read() {
            MemState::Open(map) => Ok(map.contains_key(key)),
            MemState::Closed => Err(StoreError::Closed),
        }
    }

    /// Fetch the value stored under `key`
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        match &*self.state.read() {
            MemState::Open(map) => map.get(key).cloned().ok_or(StoreError::KeyNotFound),
            MemState::Closed => Err(StoreError::Closed),
        }
    }

    /// Store `value` under `key`
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        match &mut *self.state.write() {
            MemState::Open(map) => {
                map.insert(key.to_vec(), value.to_vec());
                Ok(())
            }
            MemState::Closed => Err(StoreError::Closed),
        }
    }

    /// Remove `key`; removing an absent key is not an error
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        match &mut *self.state.write() {
            MemState::Open(map) => {
                map.remove(key);
                Ok(())
            }
            MemState::Closed => Err(StoreError::Closed),
        }
    }

    /// Create a batch accumulating writes against this store
    pub fn new_batch(&self) -> Box<dyn Batch> {
        Box::new(MemBatch {
            store: self.clone(),
            ops: Vec::new(),
        })
    }

    /// Iterate keys >= `start` that begin with `prefix`, snapshotting the
    /// matching entries at creation
    pub fn new_iterator_with_start_and_prefix(
        &self,
        start: Option<&[u8]>,
        prefix: Option<&[u8]>,
    ) -> Box<dyn StoreIterator> {
        let state = self.state.read();
        let map = match &*state {
            MemState::Open(map) => map,
            MemState::Closed => return Box::new(ErrorIterator::closed()),
        };

        let lower = match start {
            Some(start) => Bound::Included(start),
            None => Bound::Unbounded,
        };
        let prefix = prefix.unwrap_or_default();
        let entries: Vec<(Vec<u8>, Vec<u8>)> = map
            .range::<[u8], _>((lower, Bound::Unbounded))
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Box::new(MemIterator {
            entries: entries.into_iter(),
            current: None,
        })
    }

    /// Report a named statistic: `entries` (count) or `size` (approximate
    /// bytes of keys plus values)
    pub fn stat(&self, name: &str) -> Result<String> {
        match &*self.state.read() {
            MemState::Open(map) => match name {
                "entries" => Ok(map.len().to_string()),
                "size" => {
                    let bytes: usize = map.iter().map(|(k, v)| k.len() + v.len()).sum();
                    Ok(bytes.to_string())
                }
                other => Err(StoreError::Storage(format!("unknown stat: {other}"))),
            },
            MemState::Closed => Err(StoreError::Closed),
        }
    }

    /// Compaction is a no-op for a memory store
    pub fn compact(&self, _start: Option<&[u8]>, _end: Option<&[u8]>) -> Result<()> {
        match &*self.state.read() {
            MemState::Open(_) => Ok(()),
            MemState::Closed => Err(StoreError::Closed),
        }
    }

    /// Close the store, dropping its contents
    ///
    /// Closing twice is an error.
    pub fn close(&self) -> Result<()> {
        let mut state = self.state.write();
        if matches!(*state, MemState::Closed) {
            return Err(StoreError::Closed);
        }
        *state = MemState::Closed;
        Ok(())
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemStore {
    fn has(&self, key: &[u8]) -> Result<bool> {
        MemStore::has(self, key)
    }

    fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        MemStore::get(self, key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        MemStore::put(self, key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        MemStore::delete(self, key)
    }

    fn new_batch(&self) -> Box<dyn Batch> {
        MemStore::new_batch(self)
    }

    fn new_iterator_with_start_and_prefix(
        &self,
        start: Option<&[u8]>,
        prefix: Option<&[u8]>,
    ) -> Box<dyn StoreIterator> {
        MemStore::new_iterator_with_start_and_prefix(self, start, prefix)
    }

    fn stat(&self, name: &str) -> Result<String> {
        MemStore::stat(self, name)
    }

    fn compact(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Result<()> {
        MemStore::compact(self, start, end)
    }

    fn close(&self) -> Result<()> {
        MemStore::close(self)
    }
}

impl KeyValueWriter for MemStore {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        MemStore::put(self, key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        MemStore::delete(self, key)
    }
}

/// Batch over a MemStore
///
/// Records are buffered in insertion order and applied under one write-lock
/// acquisition on `write`, so they become visible together.
struct MemBatch {
    store: MemStore,
    ops: Vec<BatchOp>,
}

impl KeyValueWriter for MemBatch {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.ops.push(BatchOp::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        });
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        self.ops.push(BatchOp::Delete { key: key.to_vec() });
        Ok(())
    }
}

impl Batch for MemBatch {
    fn write(&mut self) -> Result<()> {
        match &mut *self.store.state.write() {
            MemState::Open(map) => {
                for op in &self.ops {
                    match op {
                        BatchOp::Put { key, value } => {
                            map.insert(key.clone(), value.clone());
                        }
                        BatchOp::Delete { key } => {
                            map.remove(key);
                        }
                    }
                }
                Ok(())
            }
            MemState::Closed => Err(StoreError::Closed),
        }
    }

    fn reset(&mut self) {
        self.ops.clear();
    }

    fn replay(&self, target: &mut dyn KeyValueWriter) -> Result<()> {
        replay_ops(&self.ops, target)
    }

    fn len(&self) -> usize {
        self.ops.len()
    }
}

/// Snapshot iterator over a range of a MemStore
struct MemIterator {
    entries: std::vec::IntoIter<(Vec<u8>, Vec<u8>)>,
    current: Option<(Vec<u8>, Vec<u8>)>,
}

impl StoreIterator for MemIterator {
    fn next(&mut self) -> bool {
        self.current = self.entries.next();
        self.current.is_some()
    }

    fn key(&self) -> &[u8] {
        self.current.as_ref().map(|(k, _)| k.as_slice()).unwrap_or(&[])
    }

    fn value(&self) -> &[u8] {
        self.current.as_ref().map(|(_, v)| v.as_slice()).unwrap_or(&[])
    }

    fn error(&self) -> Result<()> {
        Ok(())
    }
}
