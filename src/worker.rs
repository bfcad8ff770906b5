//! Generic worker plumbing shared by the channel strip and the mixer:
//! both are "take one block, run a synchronous kernel, forward or drop
//! the result" loops driven by a single dedicated thread. Factored out so
//! the thread-lifecycle code (spawn, clean shutdown via a control channel,
//! join on drop) is written once, in the style of the teacher's
//! `thread_pool.rs` persistent-worker pattern.

use std::thread::{self, JoinHandle};

use crossbeam::channel::{bounded, select, Receiver, Sender};

use crate::config::WorkerPriority;
use crate::platform;
use crate::pool::Block;

/// A synchronous one-block-in, maybe-one-block-out kernel. Implemented by
/// `StripCore` and `MixerCore`.
pub trait StepProcessor: Send {
    fn process(&mut self, input: Block) -> Option<Block>;
}

enum Control<T> {
    Shutdown(Sender<T>),
}

/// Owns the worker thread driving a `StepProcessor`. Dropping it (or
/// calling [`SequentialWorker::stop`]) signals shutdown and joins the
/// thread; any block the thread was mid-processing when asked to stop is
/// simply dropped with it, released back to its pool — the "in-flight
/// blocks are lost" cancellation semantics of §5.
pub struct SequentialWorker<T> {
    control_tx: Sender<Control<T>>,
    handle: Option<JoinHandle<()>>,
}

impl<T: StepProcessor + 'static> SequentialWorker<T> {
    pub fn start(
        mut core: T,
        input_rx: Receiver<Block>,
        output_tx: Option<Sender<Block>>,
        priority: WorkerPriority,
        name: &str,
    ) -> Self {
        let (control_tx, control_rx) = bounded::<Control<T>>(1);
        let thread_name = name.to_string();
        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .stack_size(crate::config::WORKER_STACK_SIZE)
            .spawn(move || {
                platform::apply_priority_hint(priority);
                loop {
                    select! {
                        recv(control_rx) -> msg => {
                            if let Ok(Control::Shutdown(reply)) = msg {
                                let _ = reply.send(core);
                            }
                            break;
                        }
                        recv(input_rx) -> msg => match msg {
                            Ok(block) => {
                                if let Some(out) = core.process(block) {
                                    if let Some(tx) = &output_tx {
                                        let _ = tx.try_send(out);
                                    }
                                }
                            }
                            Err(_) => break,
                        }
                    }
                }
                tracing::trace!(worker = %thread_name, "worker loop exited");
            })
            .expect("failed to spawn worker thread");
        Self {
            control_tx,
            handle: Some(handle),
        }
    }

    /// Signals shutdown, waits for the thread to exit, and recovers the
    /// core (its node list, accumulated state, etc.) for reuse.
    pub fn stop(mut self) -> Option<T> {
        let (reply_tx, reply_rx) = bounded(1);
        let core = if self.control_tx.send(Control::Shutdown(reply_tx)).is_ok() {
            reply_rx.recv().ok()
        } else {
            None
        };
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        core
    }
}

impl<T> Drop for SequentialWorker<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            // Best-effort shutdown signal; a reply sender the thread can
            // use if it happens to still be waiting on control_rx.
            let (reply_tx, _reply_rx) = bounded(1);
            let _ = self.control_tx.send(Control::Shutdown(reply_tx));
            let _ = handle.join();
        }
    }
}
