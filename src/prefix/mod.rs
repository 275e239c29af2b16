//! Prefix Module
//!
//! Partitions a store into a sub-store by prefixing all keys with a
//! hash-derived value.
//!
//! ## Responsibilities
//! - Derive a fixed-length, collision-resistant prefix from a caller label
//! - Route every physical key through pooled, allocation-free construction
//! - Collapse nested prefix layers into one physical layer at construction
//! - Enforce the permanent Open -> Closed lifecycle
//!
//! A `PrefixedStore` implements the full [`Store`] capability itself, so it
//! is usable anywhere a store is expected, including as the target of
//! another `PrefixedStore`.

mod batch;
mod iterator;

pub use batch::PrefixBatch;
pub use iterator::PrefixIterator;

use std::sync::Arc;

use bytes::BytesMut;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use tracing::{debug, trace};

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::pool::BufferPool;
use crate::store::{Batch, ErrorIterator, KeyValueWriter, Store, StoreIterator};

/// Length in bytes of every derived prefix (SHA-256 output)
///
/// Independent of the caller-supplied label's length.
pub const PREFIX_LEN: usize = 32;

/// Hash a label into its fixed-length key-space prefix
fn derive_prefix(label: &[u8]) -> [u8; PREFIX_LEN] {
    Sha256::digest(label).into()
}

/// Lifecycle of the wrapped store reference
///
/// Closed is permanent; the transition drops the only reference this layer
/// holds to the wrapped store.
enum State {
    Open(Arc<dyn Store>),
    Closed,
}

/// State shared between a store, its batches, and its iterators
struct Core {
    /// Pre-hash label, retained because nested construction composes
    /// labels rather than derived prefixes
    label: Vec<u8>,
    prefix: [u8; PREFIX_LEN],
    state: RwLock<State>,
    pool: BufferPool,
    config: Config,
}

impl Core {
    /// Build the physical key `prefix || key` in a pooled buffer
    ///
    /// The caller must hand the buffer back via `self.pool.release` once
    /// the delegated call returns, on success and failure paths alike.
    fn prefixed_key(&self, key: &[u8]) -> BytesMut {
        let mut buf = self.pool.acquire();
        let needed = PREFIX_LEN + key.len();
        if buf.capacity() < needed {
            // Undersized buffers go back unused; never resized while a
            // caller is being serviced.
            self.pool.release(buf);
            buf = BytesMut::with_capacity(needed);
        }
        buf.extend_from_slice(&self.prefix);
        buf.extend_from_slice(key);
        buf
    }
}

/// A collision-free, prefixed view of a shared key-value store
///
/// Stores bytes at `sha256(label) || key` in the wrapped store; values
/// pass through verbatim. Distinct labels yield disjoint key spaces with
/// overwhelming probability, even under adversarial label or key content,
/// so independently-evolving subsystems can persist state in one physical
/// store without coordinating on key naming.
///
/// Reads share a read lock; put/delete/compact/close exclude each other
/// and all reads. Key construction borrows from a lock-free buffer pool,
/// keeping heap allocation off the common path.
pub struct PrefixedStore {
    core: Arc<Core>,
}

impl PrefixedStore {
    /// Wrap `store` in a prefixed view derived from `label`
    pub fn new(label: &[u8], store: Arc<dyn Store>) -> Self {
        Self::with_config(label, store, Config::default())
    }

    /// `new` with explicit tuning knobs
    pub fn with_config(label: &[u8], store: Arc<dyn Store>, config: Config) -> Self {
        let prefix = derive_prefix(label);
        trace!(label_len = label.len(), "derived key-space prefix");
        Self {
            core: Arc::new(Core {
                label: label.to_vec(),
                prefix,
                state: RwLock::new(State::Open(store)),
                pool: BufferPool::new(config.pool_capacity, config.buffer_capacity),
                config,
            }),
        }
    }

    /// Wrap an existing prefixed view, compressing the two logical layers
    /// into one physical layer
    ///
    /// The new prefix is derived from `outer.label() || label` in a single
    /// hash, and the new view targets `outer`'s own wrapped store directly,
    /// so any nesting depth costs one hop of locking and prefixing at
    /// runtime. Fails with [`StoreError::Closed`] if `outer` has already
    /// closed, since its wrapped store is no longer reachable.
    pub fn wrap(label: &[u8], outer: &PrefixedStore) -> Result<Self> {
        Self::wrap_with_config(label, outer, outer.core.config.clone())
    }

    /// `wrap` with explicit tuning knobs
    pub fn wrap_with_config(
        label: &[u8],
        outer: &PrefixedStore,
        config: Config,
    ) -> Result<Self> {
        let store = match &*outer.core.state.read() {
            State::Open(store) => Arc::clone(store),
            State::Closed => return Err(StoreError::Closed),
        };
        let mut composed = Vec::with_capacity(outer.core.label.len() + label.len());
        composed.extend_from_slice(&outer.core.label);
        composed.extend_from_slice(label);
        Ok(Self::with_config(&composed, store, config))
    }

    /// The pre-hash label this view was built from
    ///
    /// For a view built with [`PrefixedStore::wrap`] this is the composed
    /// label of the whole chain.
    pub fn label(&self) -> &[u8] {
        &self.core.label
    }

    /// The derived physical prefix, always [`PREFIX_LEN`] bytes
    pub fn prefix(&self) -> &[u8] {
        &self.core.prefix
    }

    /// Whether `key` is present in this view
    pub fn has(&self, key: &[u8]) -> Result<bool> {
        let state = self.core.state.read();
        let store = match &*state {
            State::Open(store) => store,
            State::Closed => return Err(StoreError::Closed),
        };
        let prefixed = self.core.prefixed_key(key);
        let result = store.has(&prefixed);
        self.core.pool.release(prefixed);
        result
    }

    /// Fetch the value stored under `key` in this view
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        let state = self.core.state.read();
        let store = match &*state {
            State::Open(store) => store,
            State::Closed => return Err(StoreError::Closed),
        };
        let prefixed = self.core.prefixed_key(key);
        let result = store.get(&prefixed);
        self.core.pool.release(prefixed);
        result
    }

    /// Store `value` under `key` in this view
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let state = self.core.state.write();
        let store = match &*state {
            State::Open(store) => store,
            State::Closed => return Err(StoreError::Closed),
        };
        let prefixed = self.core.prefixed_key(key);
        let result = store.put(&prefixed, value);
        self.core.pool.release(prefixed);
        result
    }

    /// Remove `key` from this view
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        let state = self.core.state.write();
        let store = match &*state {
            State::Open(store) => store,
            State::Closed => return Err(StoreError::Closed),
        };
        let prefixed = self.core.prefixed_key(key);
        let result = store.delete(&prefixed);
        self.core.pool.release(prefixed);
        result
    }

    /// Create a batch accumulating writes against this view
    ///
    /// On a store that has already closed, the batch is created without an
    /// underlying handle and every operation on it fails with
    /// [`StoreError::Closed`]; a batch created while open still fails at
    /// `write` if the store closes in the meantime.
    pub fn new_batch(&self) -> Box<dyn Batch> {
        Box::new(PrefixBatch::new(Arc::clone(&self.core)))
    }

    /// Iterate this view's whole key space
    pub fn new_iterator(&self) -> Box<dyn StoreIterator> {
        self.new_iterator_with_start_and_prefix(None, None)
    }

    /// Iterate this view's keys greater than or equal to `start`
    pub fn new_iterator_with_start(&self, start: &[u8]) -> Box<dyn StoreIterator> {
        self.new_iterator_with_start_and_prefix(Some(start), None)
    }

    /// Iterate this view's keys beginning with `prefix`
    pub fn new_iterator_with_prefix(&self, prefix: &[u8]) -> Box<dyn StoreIterator> {
        self.new_iterator_with_start_and_prefix(None, Some(prefix))
    }

    /// Iterate this view's keys beginning with `prefix`, starting at `start`
    ///
    /// Both bounds are translated into the physical key space; absent
    /// bounds cover the whole view. On a closed store this returns a
    /// degenerate iterator reporting [`StoreError::Closed`] rather than a
    /// live scan.
    pub fn new_iterator_with_start_and_prefix(
        &self,
        start: Option<&[u8]>,
        prefix: Option<&[u8]>,
    ) -> Box<dyn StoreIterator> {
        let state = self.core.state.read();
        let store = match &*state {
            State::Open(store) => store,
            State::Closed => return Box::new(ErrorIterator::closed()),
        };
        let start = self.core.prefixed_key(start.unwrap_or_default());
        let prefix = self.core.prefixed_key(prefix.unwrap_or_default());
        let inner = store.new_iterator_with_start_and_prefix(Some(&start[..]), Some(&prefix[..]));
        self.core.pool.release(start);
        self.core.pool.release(prefix);
        Box::new(PrefixIterator::new(inner, PREFIX_LEN))
    }

    /// Report a named statistic of the underlying store
    ///
    /// Stat names are not namespaced; the answer describes the whole
    /// physical store, not just this view.
    pub fn stat(&self, name: &str) -> Result<String> {
        let state = self.core.state.read();
        match &*state {
            State::Open(store) => store.stat(name),
            State::Closed => Err(StoreError::Closed),
        }
    }

    /// Compact the given range of this view's key space
    pub fn compact(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Result<()> {
        let state = self.core.state.write();
        let store = match &*state {
            State::Open(store) => store,
            State::Closed => return Err(StoreError::Closed),
        };
        let start = self.core.prefixed_key(start.unwrap_or_default());
        let end = self.core.prefixed_key(end.unwrap_or_default());
        let result = store.compact(Some(&start[..]), Some(&end[..]));
        self.core.pool.release(start);
        self.core.pool.release(end);
        result
    }

    /// Close this view, dropping its reference to the wrapped store
    ///
    /// Never calls the wrapped store's own `close`; the wrapped store's
    /// lifetime belongs to its original owner. Closing twice is an error.
    pub fn close(&self) -> Result<()> {
        let mut state = self.core.state.write();
        if matches!(*state, State::Closed) {
            return Err(StoreError::Closed);
        }
        *state = State::Closed;
        debug!("prefixed store closed");
        Ok(())
    }
}

impl Store for PrefixedStore {
    fn has(&self, key: &[u8]) -> Result<bool> {
        PrefixedStore::has(self, key)
    }

    fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        PrefixedStore::get(self, key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        PrefixedStore::put(self, key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        PrefixedStore::delete(self, key)
    }

    fn new_batch(&self) -> Box<dyn Batch> {
        PrefixedStore::new_batch(self)
    }

    fn new_iterator_with_start_and_prefix(
        &self,
        start: Option<&[u8]>,
        prefix: Option<&[u8]>,
    ) -> Box<dyn StoreIterator> {
        PrefixedStore::new_iterator_with_start_and_prefix(self, start, prefix)
    }

    fn stat(&self, name: &str) -> Result<String> {
        PrefixedStore::stat(self, name)
    }

    fn compact(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Result<()> {
        PrefixedStore::compact(self, start, end)
    }

    fn close(&self) -> Result<()> {
        PrefixedStore::close(self)
    }
}

impl KeyValueWriter for PrefixedStore {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        PrefixedStore::put(self, key, value)
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        PrefixedStore::delete(self, key)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::MemStore;

    #[test]
    fn test_derive_prefix_fixed_length_and_deterministic() {
        let prefix = derive_prefix(b"chains");
        assert_eq!(prefix.len(), PREFIX_LEN);
        assert_eq!(prefix, derive_prefix(b"chains"));
        assert_ne!(prefix, derive_prefix(b"chainz"));
    }

    #[test]
    fn test_prefixed_key_layout() {
        let store = PrefixedStore::new(b"label", Arc::new(MemStore::new()));

        let key = store.core.prefixed_key(b"abc");
        assert_eq!(&key[..PREFIX_LEN], store.prefix());
        assert_eq!(&key[PREFIX_LEN..], b"abc");
        store.core.pool.release(key);
    }

    #[test]
    fn test_prefixed_key_returns_buffer_to_pool() {
        let store = PrefixedStore::new(b"label", Arc::new(MemStore::new()));

        let key = store.core.prefixed_key(b"abc");
        store.core.pool.release(key);
        assert_eq!(store.core.pool.len(), 1);

        // The same retained buffer services the next construction
        let key = store.core.prefixed_key(b"defgh");
        assert_eq!(store.core.pool.len(), 0);
        store.core.pool.release(key);
    }

    #[test]
    fn test_prefixed_key_replaces_undersized_buffer() {
        let config = Config::builder().buffer_capacity(8).pool_capacity(4).build();
        let store = PrefixedStore::with_config(b"label", Arc::new(MemStore::new()), config);

        // Needed length exceeds the pooled capacity: the small buffer goes
        // back unused and a fresh exact-size one is handed out
        let key = store.core.prefixed_key(&[0u8; 100]);
        assert_eq!(key.len(), PREFIX_LEN + 100);
        assert_eq!(store.core.pool.len(), 1);
        store.core.pool.release(key);
    }
}
