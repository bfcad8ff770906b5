//! The node abstraction: a uniform "process one step" contract with two
//! disjoint flavors. Rather than a single interface tagged by a function
//! table (the systems-language "vtable on a struct" pattern), these are
//! two distinct traits — the re-architecture §9 calls for.

use crate::pool::Block;

/// A node driven by its own worker thread, pulling from its own input
/// queue and pushing to zero, one, or many output queues. `step` is
/// expected to `take` from its input, produce output, and either `put` it
/// downstream or drop it (release); it never blocks except at that
/// `take`.
pub trait ConcurrentNode: Send {
    /// Runs one iteration of the node's loop.
    fn step(&mut self);

    /// Restores initial state (e.g. oscillator phase). Default is a no-op
    /// for nodes with no persistent state to rewind.
    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "ConcurrentNode"
    }
}

/// A node with no queue of its own: it is driven synchronously by a
/// channel strip (or directly, in tests), receiving its input and
/// returning its output in the same call. Returning `None` means "drop
/// this block" — the strip stops forwarding it to later nodes for this
/// cycle, per the no-retry policy in §9.
pub trait SequentialNode: Send {
    fn step(&mut self, input: Option<Block>) -> Option<Block>;

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "SequentialNode"
    }
}
