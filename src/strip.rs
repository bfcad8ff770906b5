//! Sequential engine: the channel strip. An ordered, fixed-capacity chain
//! of [`SequentialNode`]s processed by a single worker — no per-edge
//! context switch between nodes of the same strip.

use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::Sender;

use crate::config::{WorkerPriority, QUEUE_CAPACITY, STRIP_MAX_NODES};
use crate::error::Error;
use crate::node::SequentialNode;
use crate::pool::Block;
use crate::queue::Queue;
use crate::worker::{SequentialWorker, StepProcessor};

/// The synchronous kernel: iterates nodes in insertion order, feeding
/// each one's output to the next. A node returning `None` drops the
/// block for this cycle immediately — no retry with the same input (see
/// §9's resolved open question).
pub(crate) struct StripCore {
    name: Arc<str>,
    nodes: Vec<Box<dyn SequentialNode>>,
}

impl StripCore {
    fn new(name: Arc<str>) -> Self {
        Self {
            name,
            nodes: Vec::with_capacity(STRIP_MAX_NODES),
        }
    }

    fn add_node(&mut self, node: Box<dyn SequentialNode>) -> Result<(), Error> {
        if self.nodes.len() >= STRIP_MAX_NODES {
            return Err(Error::Full);
        }
        self.nodes.push(node);
        Ok(())
    }

    fn clear(&mut self) {
        self.nodes.clear();
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn process_block(&mut self, block: Block) -> Option<Block> {
        let mut current = Some(block);
        for node in self.nodes.iter_mut() {
            current = node.step(current);
            if current.is_none() {
                tracing::debug!(strip = %self.name, node = node.name(), "node dropped block");
                return None;
            }
        }
        current
    }
}

impl StepProcessor for StripCore {
    fn process(&mut self, input: Block) -> Option<Block> {
        self.process_block(input)
    }
}

/// An ordered chain of sequential nodes plus the queue plumbing to run it
/// as its own worker. While idle, `process_block` can be called directly
/// (tests and mixer-owned channels both do this, the latter because a
/// mixer drives its channels' kernels synchronously in lock-step rather
/// than through their own queues). Once `start` moves the kernel onto a
/// worker thread, the array is frozen — `add_node` and `clear` fail until
/// `stop` recovers it.
pub struct ChannelStrip {
    name: Arc<str>,
    input_tx: Sender<Block>,
    input_rx: Option<crossbeam::channel::Receiver<Block>>,
    output: Option<Sender<Block>>,
    core: Option<StripCore>,
    worker: Option<SequentialWorker<StripCore>>,
}

impl ChannelStrip {
    pub fn new(name: impl Into<String>) -> Self {
        let name: Arc<str> = Arc::from(name.into());
        let queue = Queue::bounded(QUEUE_CAPACITY);
        Self {
            input_tx: queue.sender(),
            input_rx: Some(queue.receiver()),
            output: None,
            core: Some(StripCore::new(Arc::clone(&name))),
            name,
            worker: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_node(&mut self, node: Box<dyn SequentialNode>) -> Result<(), Error> {
        self.core
            .as_mut()
            .ok_or(Error::Invalid { reason: "strip is running" })?
            .add_node(node)
    }

    pub fn clear(&mut self) -> Result<(), Error> {
        self.core
            .as_mut()
            .ok_or(Error::Invalid { reason: "strip is running" })?
            .clear();
        Ok(())
    }

    pub fn node_count(&self) -> Option<usize> {
        self.core.as_ref().map(StripCore::len)
    }

    /// Connects this strip's output to the given queue's sender side
    /// (typically a downstream strip or mixer's input).
    pub fn set_output(&mut self, sender: Sender<Block>) {
        self.output = Some(sender);
    }

    /// The core sequential kernel, callable directly while the strip is
    /// idle. Returns `None` (with a warning logged) if the strip has
    /// already been moved onto a worker thread by `start`.
    pub fn process_block(&mut self, block: Block) -> Option<Block> {
        match self.core.as_mut() {
            Some(core) => core.process_block(block),
            None => {
                tracing::warn!(strip = %self.name, "process_block called while strip is running");
                None
            }
        }
    }

    pub fn push_input(&self, block: Block) -> Result<(), Error> {
        self.input_tx.try_send(block).map_err(|_| Error::Full)
    }

    pub fn start(&mut self, priority: WorkerPriority) -> Result<(), Error> {
        let core = self.core.take().ok_or(Error::Invalid { reason: "already running" })?;
        let input_rx = self
            .input_rx
            .take()
            .ok_or(Error::Invalid { reason: "already running" })?;
        let worker = SequentialWorker::start(core, input_rx, self.output.clone(), priority, &self.name);
        self.worker = Some(worker);
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), Error> {
        let worker = self.worker.take().ok_or(Error::Invalid { reason: "not running" })?;
        let core = worker.stop();
        // In-flight messages on the old channel are lost along with it;
        // a fresh queue backs future push_input calls.
        let queue: Queue<Block> = Queue::bounded(QUEUE_CAPACITY);
        self.input_tx = queue.sender();
        self.input_rx = Some(queue.receiver());
        self.core = core.or_else(|| Some(StripCore::new(Arc::clone(&self.name))));
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Default suspension-point timeout used when a strip is exercised
    /// directly rather than through a started worker.
    pub fn default_take_timeout() -> Duration {
        crate::concurrent::DEFAULT_TAKE_TIMEOUT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::SequentialNode;
    use crate::pool::BlockPool;

    struct AddOne;
    impl SequentialNode for AddOne {
        fn step(&mut self, input: Option<Block>) -> Option<Block> {
            let mut block = input?;
            block.as_mut_slice().iter_mut().for_each(|s| *s = s.saturating_add(1));
            Some(block)
        }
        fn name(&self) -> &str {
            "AddOne"
        }
    }

    struct DropEverything;
    impl SequentialNode for DropEverything {
        fn step(&mut self, input: Option<Block>) -> Option<Block> {
            drop(input);
            None
        }
        fn name(&self) -> &str {
            "DropEverything"
        }
    }

    struct RecordOrder(Arc<std::sync::Mutex<Vec<&'static str>>>, &'static str);
    impl SequentialNode for RecordOrder {
        fn step(&mut self, input: Option<Block>) -> Option<Block> {
            self.0.lock().unwrap().push(self.1);
            input
        }
        fn name(&self) -> &str {
            self.1
        }
    }

    #[test]
    fn add_node_past_capacity_returns_full_and_leaves_strip_unchanged() {
        let mut strip = ChannelStrip::new("s");
        for _ in 0..STRIP_MAX_NODES {
            strip.add_node(Box::new(AddOne)).unwrap();
        }
        let before = strip.node_count();
        assert_eq!(strip.add_node(Box::new(AddOne)), Err(Error::Full));
        assert_eq!(strip.node_count(), before);
    }

    #[test]
    fn strip_determinism_same_inputs_same_outputs() {
        let pool = BlockPool::new(8);
        let order: Arc<std::sync::Mutex<Vec<&'static str>>> = Arc::new(std::sync::Mutex::new(Vec::new()));

        let mut strip = ChannelStrip::new("order");
        strip.add_node(Box::new(RecordOrder(Arc::clone(&order), "a"))).unwrap();
        strip.add_node(Box::new(RecordOrder(Arc::clone(&order), "b"))).unwrap();
        strip.add_node(Box::new(RecordOrder(Arc::clone(&order), "c"))).unwrap();

        let block = pool.acquire().unwrap();
        strip.process_block(block);
        assert_eq!(*order.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn node_dropping_block_stops_the_chain_with_no_retry() {
        let pool = BlockPool::new(8);
        let order: Arc<std::sync::Mutex<Vec<&'static str>>> = Arc::new(std::sync::Mutex::new(Vec::new()));

        let mut strip = ChannelStrip::new("gate");
        strip.add_node(Box::new(DropEverything)).unwrap();
        strip.add_node(Box::new(RecordOrder(Arc::clone(&order), "never"))).unwrap();

        let block = pool.acquire().unwrap();
        assert!(strip.process_block(block).is_none());
        assert!(order.lock().unwrap().is_empty());
    }

    #[test]
    fn process_block_returns_last_nodes_output() {
        let pool = BlockPool::new(8);
        let mut strip = ChannelStrip::new("addtwice");
        strip.add_node(Box::new(AddOne)).unwrap();
        strip.add_node(Box::new(AddOne)).unwrap();

        let block = pool.acquire().unwrap();
        let out = strip.process_block(block).unwrap();
        assert!(out.as_slice().iter().all(|&s| s == 2));
    }
}
