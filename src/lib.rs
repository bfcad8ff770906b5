//! # blockgraph
//!
//! A block-based real-time audio processing framework for a
//! preemptive, priority-scheduled embedded kernel.
//!
//! Audio moves through the system as fixed-size PCM blocks handed out by a
//! bounded [`pool::BlockPool`]. Blocks are copy-on-write: cloning a
//! [`pool::Block`] retains it (bumps a reference count), dropping it
//! releases it back to the pool, and [`pool::Block::make_writable`] copies
//! only when a mutator holds a shared handle. No allocation happens past
//! pool construction; exhaustion degrades to dropped blocks and counters,
//! never panics or blocking.
//!
//! Two execution models sit on top of the block pool:
//!
//! - [`node::ConcurrentNode`] — one worker thread per node, pulling
//!   blocks from its own queue ([`concurrent::ConcurrentWorker`]). The
//!   only concurrent node shipped here is [`concurrent::Splitter`], the
//!   1-in/N-out fan-out primitive.
//! - [`node::SequentialNode`] — a chain of nodes driven lock-step inside
//!   one worker thread, either as a [`strip::ChannelStrip`] or, nested N
//!   channels at a time, as a [`mixer::Mixer`].
//!
//! [`nodes`] holds the concrete leaf nodes (`SineNode`, `VolumeNode`,
//! `PeakRmsNode`, `LogSinkNode`); [`spectrum`] holds the one
//! representative hard node, a streaming FFT-based analyzer with
//! bounded, arena-allocated instances and lock-guarded concurrent
//! readout.
//!
//! Errors surface only at construction, copy-on-write escalation, and
//! readout boundaries (see [`error::Error`]); the hot per-block path
//! never propagates a typed error; it returns `None`, drops the block,
//! and logs via `tracing`. The embedding application owns subscriber
//! setup — this crate never installs one itself.

pub mod concurrent;
pub mod config;
pub mod error;
pub mod mixer;
pub mod node;
pub mod nodes;
pub mod platform;
pub mod pool;
pub mod queue;
pub mod spectrum;
pub mod strip;
pub mod worker;

pub use concurrent::{ConcurrentWorker, OutputPort, Splitter};
pub use config::WorkerPriority;
pub use error::{Error, Result};
pub use mixer::Mixer;
pub use node::{ConcurrentNode, SequentialNode};
pub use pool::{Block, BlockPool};
pub use strip::ChannelStrip;
