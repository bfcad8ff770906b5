//! Log sink: a terminal sink node. Reports the block's peak sample and
//! current refcount via `tracing`, releases it, and always returns
//! `None`. Grounded on the teacher's logging conventions (bare
//! `tracing` macros, no module-scoped logger object).

use std::sync::Arc;

use crate::node::SequentialNode;
use crate::pool::Block;

pub struct LogSinkNode {
    name: Arc<str>,
    blocks_seen: u64,
}

impl LogSinkNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Arc::from(name.into()),
            blocks_seen: 0,
        }
    }

    pub fn blocks_seen(&self) -> u64 {
        self.blocks_seen
    }
}

impl SequentialNode for LogSinkNode {
    fn step(&mut self, input: Option<Block>) -> Option<Block> {
        let block = input?;
        self.blocks_seen += 1;
        let peak = block.as_slice().iter().map(|s| s.unsigned_abs()).max().unwrap_or(0);
        tracing::info!(
            sink = %self.name,
            peak,
            refcount = block.refcount(),
            blocks_seen = self.blocks_seen,
            "block reached sink"
        );
        drop(block);
        None
    }

    fn reset(&mut self) {
        self.blocks_seen = 0;
    }

    fn name(&self) -> &str {
        "LogSinkNode"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::BlockPool;

    #[test]
    fn always_returns_none_and_releases_the_block() {
        let pool = BlockPool::new(2);
        let mut sink = LogSinkNode::new("test-sink");
        let block = pool.acquire().unwrap();
        assert!(sink.step(Some(block)).is_none());
        assert_eq!(pool.available(), pool.capacity());
        assert_eq!(sink.blocks_seen(), 1);
    }

    #[test]
    fn none_input_is_a_no_op() {
        let mut sink = LogSinkNode::new("test-sink");
        assert!(sink.step(None).is_none());
        assert_eq!(sink.blocks_seen(), 0);
    }

    #[test]
    fn reset_clears_the_counter() {
        let pool = BlockPool::new(2);
        let mut sink = LogSinkNode::new("test-sink");
        sink.step(Some(pool.acquire().unwrap()));
        sink.reset();
        assert_eq!(sink.blocks_seen(), 0);
    }
}
