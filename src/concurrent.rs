//! Concurrent engine: one worker thread per [`ConcurrentNode`], looping
//! its `step` until aborted. Grounded on the teacher's `node_task.rs`
//! (per-node worker loop over `crossbeam::channel`) and `thread_pool.rs`
//! (clean join-on-drop shutdown).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::Sender;

use crate::config::WorkerPriority;
use crate::node::ConcurrentNode;
use crate::platform;
use crate::pool::Block;
use crate::queue::Queue;

/// Default time a concurrent node's `take` waits before giving the loop a
/// chance to observe the abort flag. Not a spec-mandated value; the spec
/// leaves suspension-point timeouts to the integrator.
pub const DEFAULT_TAKE_TIMEOUT: Duration = Duration::from_millis(50);

/// Handed to a [`ConcurrentNode`] so it can implement `push_output`
/// without owning queue plumbing directly: if an output queue is set,
/// `put`s the block there; otherwise releases it by dropping it.
#[derive(Clone, Default)]
pub struct OutputPort {
    sender: Option<Sender<Block>>,
}

impl OutputPort {
    pub fn unconnected() -> Self {
        Self { sender: None }
    }

    pub fn connected(sender: Sender<Block>) -> Self {
        Self { sender: Some(sender) }
    }

    /// `push_output(self, block)`: puts the block if an output queue is
    /// set, otherwise drops (releases) it.
    pub fn push(&self, block: Block) {
        if let Some(sender) = &self.sender {
            let _ = sender.try_send(block);
        }
        // else: `block` drops here, returning to its pool.
    }
}

/// Owns the worker thread running one [`ConcurrentNode`]'s loop. The loop
/// never terminates on its own; dropping the handle (or calling
/// [`ConcurrentWorker::abort`]) is the only way to stop it.
pub struct ConcurrentWorker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ConcurrentWorker {
    pub fn start<N: ConcurrentNode + 'static>(mut node: N, priority: WorkerPriority, name: &str) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let thread_name = name.to_string();
        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .stack_size(crate::config::WORKER_STACK_SIZE)
            .spawn(move || {
                platform::apply_priority_hint(priority);
                while !stop_flag.load(Ordering::Relaxed) {
                    node.step();
                }
                tracing::trace!(worker = %thread_name, "concurrent worker exited");
            })
            .expect("failed to spawn worker thread");
        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Signals the worker to stop after its current `step` returns and
    /// waits for it to exit. Any block the node was holding when it
    /// noticed the stop flag is dropped along with it.
    pub fn abort(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ConcurrentWorker {
    fn drop(&mut self) {
        self.abort();
    }
}

/// 1-in / N-out fan-out node. On each step, takes one block, bulk-retains
/// it `N` times (all increments complete before any `put`, per §4.3's
/// ordering requirement), and `put`s one handle on each output queue.
pub struct Splitter {
    input: Queue<Block>,
    outputs: Vec<Sender<Block>>,
    take_timeout: Duration,
}

impl Splitter {
    pub fn new(input: Queue<Block>, outputs: Vec<Sender<Block>>) -> Self {
        assert!(
            outputs.len() <= crate::config::SPLITTER_MAX_OUTS,
            "splitter fan-out exceeds SPLITTER_MAX_OUTS"
        );
        Self {
            input,
            outputs,
            take_timeout: DEFAULT_TAKE_TIMEOUT,
        }
    }
}

impl ConcurrentNode for Splitter {
    fn step(&mut self) {
        let Some(block) = self.input.take(self.take_timeout) else {
            return;
        };
        if self.outputs.is_empty() {
            // No consumers: the block is simply released.
            return;
        }
        let handles = block.retain_n(self.outputs.len());
        for (sender, handle) in self.outputs.iter().zip(handles) {
            let _ = sender.try_send(handle);
        }
    }

    fn name(&self) -> &str {
        "Splitter"
    }
}
