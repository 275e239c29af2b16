//! Buffer pool
//!
//! Reusable zero-length byte buffers with retained capacity, used to keep
//! per-operation heap allocation off the key-construction hot path.
//!
//! The pool is lock-free (crossbeam `ArrayQueue`) and safe for concurrent
//! acquire/release from many callers, so buffer management never adds
//! serialization beyond what the owning store's read/write lock already
//! requires.

use bytes::BytesMut;
use crossbeam::queue::ArrayQueue;

/// A bounded pool of reusable byte buffers
///
/// Invariant: every buffer stored in the pool has length exactly zero.
/// Capacity is a hint, not a correctness requirement: callers that find a
/// pooled buffer too small put it back and allocate a fresh one.
pub struct BufferPool {
    buffers: ArrayQueue<BytesMut>,
    buffer_capacity: usize,
}

impl BufferPool {
    /// Create a pool with `pool_capacity` slots handing out buffers of
    /// `buffer_capacity` initial bytes
    pub fn new(pool_capacity: usize, buffer_capacity: usize) -> Self {
        Self {
            buffers: ArrayQueue::new(pool_capacity.max(1)),
            buffer_capacity,
        }
    }

    /// Take a zero-length buffer from the pool, allocating one if the pool
    /// is empty
    pub fn acquire(&self) -> BytesMut {
        self.buffers
            .pop()
            .unwrap_or_else(|| BytesMut::with_capacity(self.buffer_capacity))
    }

    /// Return a buffer to the pool
    ///
    /// The buffer is truncated to length zero before it is stored. If the
    /// pool is full the buffer is dropped.
    pub fn release(&self, mut buf: BytesMut) {
        buf.clear();
        let _ = self.buffers.push(buf);
    }

    /// Number of buffers currently resting in the pool
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Whether the pool currently holds no buffers
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("pooled", &self.buffers.len())
            .field("buffer_capacity", &self.buffer_capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_returns_empty_buffer() {
        let pool = BufferPool::new(4, 512);
        let buf = pool.acquire();
        assert_eq!(buf.len(), 0);
        assert!(buf.capacity() >= 512);
    }

    #[test]
    fn test_release_truncates_to_zero() {
        let pool = BufferPool::new(4, 512);
        let mut buf = pool.acquire();
        buf.extend_from_slice(b"some bytes");
        pool.release(buf);

        let reused = pool.acquire();
        assert_eq!(reused.len(), 0);
    }

    #[test]
    fn test_capacity_retained_across_release() {
        let pool = BufferPool::new(4, 16);
        let mut buf = pool.acquire();
        buf.extend_from_slice(&vec![0u8; 1024]);
        let grown = buf.capacity();
        pool.release(buf);

        let reused = pool.acquire();
        assert!(reused.capacity() >= grown);
    }

    #[test]
    fn test_full_pool_drops_buffer() {
        let pool = BufferPool::new(1, 16);
        pool.release(BytesMut::with_capacity(16));
        pool.release(BytesMut::with_capacity(16));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_concurrent_acquire_release() {
        use std::sync::Arc;
        use std::thread;

        let pool = Arc::new(BufferPool::new(8, 64));
        let mut handles = vec![];

        for _ in 0..8 {
            let pool = Arc::clone(&pool);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    let mut buf = pool.acquire();
                    assert_eq!(buf.len(), 0);
                    buf.extend_from_slice(b"scratch");
                    pool.release(buf);
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }
    }
}
