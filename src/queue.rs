//! Queue primitive: the edge type connecting workers. Bounded FIFO,
//! non-blocking `put`, `take` that blocks up to a timeout. Built on
//! `crossbeam::channel`, matching the teacher's `node_task.rs`/
//! `thread_pool.rs` worker-loop plumbing.

use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TrySendError};

/// One queue edge. Construct once, then hand [`Queue::sender`] clones to
/// producers and a single [`Queue::receiver`] clone to the consumer.
/// Multiple producers are fine; the framework enforces "exactly one
/// consumer" only by convention, as the spec states — nothing here
/// prevents a caller from cloning the receiver too.
pub struct Queue<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> Queue<T> {
    pub fn bounded(capacity: usize) -> Self {
        let (tx, rx) = channel::bounded(capacity);
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<T> {
        self.tx.clone()
    }

    pub fn receiver(&self) -> Receiver<T> {
        self.rx.clone()
    }

    /// Non-blocking put. Transfers ownership of `item`. Fails (returning
    /// `item` back) if the queue is full or disconnected.
    pub fn put(&self, item: T) -> Result<(), T> {
        match self.tx.try_send(item) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(item)) | Err(TrySendError::Disconnected(item)) => Err(item),
        }
    }

    /// Blocks until an item is available or `timeout` elapses, whichever
    /// comes first. Returns ownership of the item.
    pub fn take(&self, timeout: Duration) -> Option<T> {
        match self.rx.recv_timeout(timeout) {
            Ok(item) => Some(item),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}
