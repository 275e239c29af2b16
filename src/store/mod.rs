//! Store Module
//!
//! Capability traits for a physical key-value store and its batch and
//! iterator companions, plus the in-memory reference implementation.
//!
//! ## Responsibilities
//! - Define the surface a wrapped store must provide (point ops, batch and
//!   iterator factories, stat, compact, close)
//! - Define the write-target surface batches replay against
//! - Provide `MemStore`, a sorted in-memory store implementing all of it
//!
//! Every implementation must surface [`StoreError::Closed`] from every
//! operation once `close` has returned, including from a second `close`.

mod memory;

pub use memory::MemStore;

use crate::error::{Result, StoreError};

/// A destination for raw key-value writes
///
/// Implemented by stores and batches alike; batch replay is defined
/// against this trait so a recorded write log is portable to any target.
pub trait KeyValueWriter {
    /// Write a key-value pair
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Remove a key
    fn delete(&mut self, key: &[u8]) -> Result<()>;
}

/// The full key-value store capability
///
/// All methods take `&self`; implementations serialize access internally
/// with a reader/writer lock. `None` iterator and compact bounds mean
/// "unbounded".
pub trait Store: Send + Sync {
    /// Whether `key` is present
    fn has(&self, key: &[u8]) -> Result<bool>;

    /// Fetch the value stored under `key`, or [`StoreError::KeyNotFound`]
    fn get(&self, key: &[u8]) -> Result<Vec<u8>>;

    /// Store `value` under `key`
    fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Remove `key`
    fn delete(&self, key: &[u8]) -> Result<()>;

    /// Create a batch accumulating writes against this store
    fn new_batch(&self) -> Box<dyn Batch>;

    /// Iterate the whole key space
    fn new_iterator(&self) -> Box<dyn StoreIterator> {
        self.new_iterator_with_start_and_prefix(None, None)
    }

    /// Iterate keys greater than or equal to `start`
    fn new_iterator_with_start(&self, start: &[u8]) -> Box<dyn StoreIterator> {
        self.new_iterator_with_start_and_prefix(Some(start), None)
    }

    /// Iterate keys beginning with `prefix`
    fn new_iterator_with_prefix(&self, prefix: &[u8]) -> Box<dyn StoreIterator> {
        self.new_iterator_with_start_and_prefix(None, Some(prefix))
    }

    /// Iterate keys beginning with `prefix`, starting at `start`
    fn new_iterator_with_start_and_prefix(
        &self,
        start: Option<&[u8]>,
        prefix: Option<&[u8]>,
    ) -> Box<dyn StoreIterator>;

    /// Report a named statistic about the store
    fn stat(&self, name: &str) -> Result<String>;

    /// Compact the given key range
    fn compact(&self, start: Option<&[u8]>, end: Option<&[u8]>) -> Result<()>;

    /// Close the store; every later call fails with [`StoreError::Closed`]
    ///
    /// Closing twice is itself an error, not a no-op.
    fn close(&self) -> Result<()>;
}

/// An accumulated set of writes committed together
///
/// A batch also keeps an in-memory log of its records (independent copies
/// of the caller's bytes) so the same writes can be replayed against other
/// targets. A single batch instance is not meant for concurrent use.
pub trait Batch: KeyValueWriter {
    /// Commit every accumulated write atomically, per the owning store's
    /// own durability contract
    fn write(&mut self) -> Result<()>;

    /// Clear the batch for reuse
    fn reset(&mut self);

    /// Re-apply the recorded writes, in insertion order, against `target`
    ///
    /// Stops at the first failing write and returns its error; writes
    /// already applied stay applied. No rollback.
    fn replay(&self, target: &mut dyn KeyValueWriter) -> Result<()>;

    /// Number of pending records
    fn len(&self) -> usize;

    /// Whether the batch has no pending records
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A stateful scan over a store
///
/// `next` must be called before the first `key`/`value` access; both
/// return empty slices once the iterator is exhausted. `error` reports
/// whether the scan terminated abnormally.
pub trait StoreIterator {
    /// Advance to the next entry; false when exhausted
    fn next(&mut self) -> bool;

    /// Key of the current entry
    fn key(&self) -> &[u8];

    /// Value of the current entry
    fn value(&self) -> &[u8];

    /// Error that terminated the scan, if any
    fn error(&self) -> Result<()>;
}

/// A single recorded batch write
///
/// Holds independent copies of the caller's bytes, so caller-owned buffers
/// may be reused as soon as the recording call returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BatchOp {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

/// Re-apply recorded writes in order, stopping at the first failure
pub(crate) fn replay_ops(ops: &[BatchOp], target: &mut dyn KeyValueWriter) -> Result<()> {
    for op in ops {
        match op {
            BatchOp::Put { key, value } => target.put(key, value)?,
            BatchOp::Delete { key } => target.delete(key)?,
        }
    }
    Ok(())
}

/// Degenerate iterator yielding nothing but a fixed error
///
/// Returned by iterator factories on a closed store instead of a live scan.
pub struct ErrorIterator {
    err: StoreError,
}

impl ErrorIterator {
    /// An iterator that reports `err` on every [`StoreIterator::error`] call
    pub fn new(err: StoreError) -> Self {
        Self { err }
    }

    /// An iterator reporting [`StoreError::Closed`]
    pub fn closed() -> Self {
        Self::new(StoreError::Closed)
    }
}

impl StoreIterator for ErrorIterator {
    fn next(&mut self) -> bool {
        false
    }

    fn key(&self) -> &[u8] {
        &[]
    }

    fn value(&self) -> &[u8] {
        &[]
    }

    fn error(&self) -> Result<()> {
        Err(self.err.clone())
    }
}
