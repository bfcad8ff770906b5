//! Block memory subsystem: fixed-capacity pools, atomic reference counting,
//! and copy-on-write escalation.
//!
//! Grounded on the teacher's `buffer_pool.rs` (lock-free `ArrayQueue` free
//! list, atomic stats) but with no allocate-on-miss fallback: exhaustion is
//! observable, never silently absorbed by the heap. The descriptor and
//! reference count live inside an `Arc`, so `Clone` is `retain` and `Drop`
//! is `release` — the "ownership-tracked smart handle" pattern the spec's
//! design notes call for instead of hand-rolled atomics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_queue::ArrayQueue;

use crate::config::BLOCK_SAMPLES;
use crate::error::Error;

type Samples = [i16; BLOCK_SAMPLES];

struct PoolInner {
    buffers: ArrayQueue<Samples>,
    descriptors: ArrayQueue<()>,
    capacity: usize,
    exhausted_events: AtomicU64,
}

/// A bounded source of [`Block`]s. Cheap to clone (an `Arc` around the two
/// free lists); every clone refers to the same underlying pool.
#[derive(Clone)]
pub struct BlockPool {
    inner: Arc<PoolInner>,
}

impl BlockPool {
    /// Creates a pool with `capacity` descriptor slots and `capacity`
    /// buffer slots, both pre-filled — no allocation happens past this
    /// point.
    pub fn new(capacity: usize) -> Self {
        let buffers = ArrayQueue::new(capacity);
        let descriptors = ArrayQueue::new(capacity);
        for _ in 0..capacity {
            let _ = buffers.push([0i16; BLOCK_SAMPLES]);
            let _ = descriptors.push(());
        }
        Self {
            inner: Arc::new(PoolInner {
                buffers,
                descriptors,
                capacity,
                exhausted_events: AtomicU64::new(0),
            }),
        }
    }

    /// Total descriptor/buffer slots this pool was constructed with.
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Free buffers currently available (pool usage is `capacity - this`).
    pub fn available(&self) -> usize {
        self.inner.buffers.len()
    }

    /// Count of `acquire`/`make_writable` calls that observed exhaustion.
    pub fn exhausted_events(&self) -> u64 {
        self.inner.exhausted_events.load(Ordering::Relaxed)
    }

    /// Obtains one free descriptor and one free buffer, zeroes the buffer,
    /// and returns a block with refcount 1. Never blocks; returns `None`
    /// on exhaustion of either free list, returning the descriptor first
    /// if the buffer acquisition is what failed (acquire ordering: a
    /// failed buffer pop must not leak the already-popped descriptor).
    pub fn acquire(&self) -> Option<Block> {
        let Some(()) = self.inner.descriptors.pop() else {
            self.inner.exhausted_events.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(
                available = self.available(),
                capacity = self.capacity(),
                "block pool exhausted (descriptor)"
            );
            return None;
        };
        let Some(buffer) = self.inner.buffers.pop() else {
            // Buffer pool empty: return the descriptor we already took
            // before reporting failure.
            let _ = self.inner.descriptors.push(());
            self.inner.exhausted_events.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(
                available = self.available(),
                capacity = self.capacity(),
                "block pool exhausted (buffer)"
            );
            return None;
        };
        Some(Block {
            inner: Arc::new(BlockInner {
                data: buffer,
                len: BLOCK_SAMPLES,
                pool: self.clone(),
            }),
        })
    }

    fn release_raw(&self, data: Samples) {
        // Buffer first, then descriptor, mirroring the release order the
        // spec mandates.
        let _ = self.inner.buffers.push(data);
        let _ = self.inner.descriptors.push(());
    }
}

struct BlockInner {
    data: Samples,
    len: usize,
    pool: BlockPool,
}

impl Drop for BlockInner {
    fn drop(&mut self) {
        self.pool.release_raw(self.data);
    }
}

/// An owning handle to one PCM block. `Clone` performs `retain` (atomic
/// refcount increment); the final `Drop` performs `release`, returning the
/// buffer and descriptor to their pools. A block with refcount greater
/// than one is read-only to every holder — [`Block::make_writable`] is the
/// only legal path to mutation in that case.
#[derive(Clone)]
pub struct Block {
    inner: Arc<BlockInner>,
}

impl Block {
    /// Current reference count. `1` means this handle is the unique owner
    /// and may call [`Block::as_mut_slice`] directly.
    pub fn refcount(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    pub fn len(&self) -> usize {
        self.inner.len
    }

    pub fn is_empty(&self) -> bool {
        self.inner.len == 0
    }

    pub fn as_slice(&self) -> &[i16] {
        &self.inner.data[..self.inner.len]
    }

    /// Unique mutable access. Only valid when `refcount() == 1`; panics
    /// otherwise, since a non-unique mutation would violate the CoW
    /// invariant that every node in the pipeline relies on. Callers that
    /// might hold a shared block must call [`Block::make_writable`] first.
    pub fn as_mut_slice(&mut self) -> &mut [i16] {
        let len = self.inner.len;
        Arc::get_mut(&mut self.inner)
            .expect("as_mut_slice called on a shared block; call make_writable first")
            .data[..len]
            .as_mut()
    }

    /// Copy-on-write escalation. If this handle is already unique, this is
    /// a zero-copy no-op. Otherwise acquires a fresh block from `pool`,
    /// copies the full buffer, and replaces `self` with the new unique
    /// handle (dropping the old one, which decrements its refcount).
    pub fn make_writable(&mut self, pool: &BlockPool) -> Result<(), Error> {
        if self.refcount() == 1 {
            return Ok(());
        }
        let mut fresh = pool.acquire().ok_or(Error::OutOfMemory)?;
        fresh.as_mut_slice().copy_from_slice(self.as_slice());
        *self = fresh;
        Ok(())
    }

    /// Bulk-retain for fan-out: returns `n` handles to the same underlying
    /// block, consuming `self` as one of them. All `n - 1` atomic
    /// increments happen before this call returns, so a splitter can
    /// perform every retain before its first `put` — the ordering §4.3
    /// requires to avoid a premature-free window.
    pub fn retain_n(self, n: usize) -> Vec<Block> {
        assert!(n >= 1, "retain_n requires at least one output");
        let mut handles = Vec::with_capacity(n);
        for _ in 0..n - 1 {
            handles.push(self.clone());
        }
        handles.push(self);
        handles
    }
}
