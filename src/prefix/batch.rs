//! Prefixed batch
//!
//! Pairs an in-memory, replayable write log with the underlying store's
//! own batch. The log records keys exactly as the caller supplied them;
//! the underlying batch accumulates the same writes under prefixed keys,
//! so `write` commits the real physical mutations while `replay` stays
//! portable to any target.

use std::sync::Arc;

use tracing::trace;

use crate::error::{Result, StoreError};
use crate::store::{replay_ops, Batch, BatchOp, KeyValueWriter};

use super::{Core, State};

/// Batch over a [`PrefixedStore`](super::PrefixedStore)
pub struct PrefixBatch {
    core: Arc<Core>,
    /// Underlying store's batch; absent when the store was already closed
    /// at creation, in which case every operation reports the closed error
    inner: Option<Box<dyn Batch>>,
    writes: Vec<BatchOp>,
}

impl PrefixBatch {
    pub(crate) fn new(core: Arc<Core>) -> Self {
        let inner = match &*core.state.read() {
            State::Open(store) => Some(store.new_batch()),
            State::Closed => None,
        };
        Self {
            core,
            inner,
            writes: Vec::new(),
        }
    }
}

impl KeyValueWriter for PrefixBatch {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        let inner = self.inner.as_mut().ok_or(StoreError::Closed)?;
        self.writes.push(BatchOp::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        });
        let prefixed = self.core.prefixed_key(key);
        let result = inner.put(&prefixed, value);
        self.core.pool.release(prefixed);
        result
    }

    fn delete(&mut self, key: &[u8]) -> Result<()> {
        let inner = self.inner.as_mut().ok_or(StoreError::Closed)?;
        self.writes.push(BatchOp::Delete { key: key.to_vec() });
        let prefixed = self.core.prefixed_key(key);
        let result = inner.delete(&prefixed);
        self.core.pool.release(prefixed);
        result
    }
}

impl Batch for PrefixBatch {
    /// Commit every accumulated prefixed write through the underlying batch
    ///
    /// Takes the owning store's write lock because the commit mutates
    /// physical state shared with point operations and other batches.
    fn write(&mut self) -> Result<()> {
        let state = self.core.state.write();
        if matches!(*state, State::Closed) {
            return Err(StoreError::Closed);
        }
        let inner = self.inner.as_mut().ok_or(StoreError::Closed)?;
        trace!(pending = self.writes.len(), "committing prefixed batch");
        inner.write()
    }

    /// Clear the batch for reuse
    ///
    /// Retained capacity far in excess of the current length is shrunk by
    /// a fixed divisor instead of freed outright, so one oversized batch
    /// does not pin its allocation forever and many small batches do not
    /// thrash the allocator.
    fn reset(&mut self) {
        let threshold = self.writes.len() * self.core.config.max_excess_capacity_factor;
        if self.writes.capacity() > threshold {
            let reduced = self.writes.capacity() / self.core.config.capacity_reduction_factor;
            self.writes = Vec::with_capacity(reduced);
        } else {
            self.writes.clear();
        }
        if let Some(inner) = &mut self.inner {
            inner.reset();
        }
    }

    /// Re-apply the recorded writes with *unprefixed* keys
    ///
    /// The log was captured before prefixing, so it is portable to targets
    /// outside this view's key space.
    fn replay(&self, target: &mut dyn KeyValueWriter) -> Result<()> {
        replay_ops(&self.writes, target)
    }

    fn len(&self) -> usize {
        self.writes.len()
    }
}
