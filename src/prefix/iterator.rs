//! Prefix-stripping iterator
//!
//! Advances exactly as the wrapped iterator does and removes the physical
//! prefix from each key on the way out.

use crate::error::Result;
use crate::store::StoreIterator;

/// Iterator over a prefixed view's key space
pub struct PrefixIterator {
    inner: Box<dyn StoreIterator>,
    /// Captured from the owning store at construction, never recomputed
    prefix_len: usize,
}

impl PrefixIterator {
    pub(crate) fn new(inner: Box<dyn StoreIterator>, prefix_len: usize) -> Self {
        Self { inner, prefix_len }
    }
}

impl StoreIterator for PrefixIterator {
    fn next(&mut self) -> bool {
        self.inner.next()
    }

    /// The current key with the physical prefix stripped
    ///
    /// A raw key shorter than the prefix should not occur under correct
    /// use but is tolerated and returned unchanged.
    fn key(&self) -> &[u8] {
        let key = self.inner.key();
        if key.len() >= self.prefix_len {
            &key[self.prefix_len..]
        } else {
            key
        }
    }

    fn value(&self) -> &[u8] {
        self.inner.value()
    }

    fn error(&self) -> Result<()> {
        self.inner.error()
    }
}
