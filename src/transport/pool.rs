//! Fixed-size datagram buffer pool (`spec.md` §5), the idiomatic-Rust
//! analogue of a `sync.Pool` of scratch byte slices.

use crossbeam_queue::ArrayQueue;
use std::sync::Arc;

pub const BUFFER_SIZE: usize = 64 * 1024;

pub struct BufferPool {
    queue: ArrayQueue<Vec<u8>>,
}

impl BufferPool {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(BufferPool { queue: ArrayQueue::new(capacity) })
    }

    /// Takes a buffer from the pool, or allocates a fresh one if the pool
    /// is empty.
    pub fn acquire(&self) -> Vec<u8> {
        self.queue.pop().unwrap_or_else(|| vec![0u8; BUFFER_SIZE])
    }

    /// Returns a buffer to the pool. Dropped silently if the pool is full
    /// (the allocation is simply not reused).
    pub fn release(&self, mut buf: Vec<u8>) {
        buf.clear();
        buf.resize(BUFFER_SIZE, 0);
        let _ = self.queue.push(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reuses_released_buffers() {
        let pool = BufferPool::new(4);
        let buf = pool.acquire();
        assert_eq!(buf.len(), BUFFER_SIZE);
        pool.release(buf);
        assert_eq!(pool.queue.len(), 1);
        let _ = pool.acquire();
        assert_eq!(pool.queue.len(), 0);
    }
}
