//! Compile-time configuration.
//!
//! These are the "recognized options" of the external interface: a fixed set
//! of constants, not an open-ended build system. Change a value here to
//! retarget the crate to a different block size, pool budget, or topology
//! limit; there is no other place these are read from (no env vars, no
//! config files — persisted state is out of scope).

/// Number of signed 16-bit samples per block.
pub const BLOCK_SAMPLES: usize = 128;

/// Nominal sample rate in Hz.
pub const SAMPLE_RATE: u32 = 48_000;

/// Descriptor and buffer pool capacity. Typical value is at least
/// 4x the longest fan-out width so a splitter copy storm cannot exhaust it.
pub const POOL_CAPACITY: usize = 64;

/// Maximum sequential nodes per channel strip.
pub const STRIP_MAX_NODES: usize = 16;

/// Maximum channel strips per mixer (master strip is separate).
pub const MIXER_MAX_CHANNELS: usize = 8;

/// Maximum fan-out of a single splitter.
pub const SPLITTER_MAX_OUTS: usize = 8;

/// Static instance cap for spectrum analyzer contexts.
pub const MAX_SPECTRUM_INSTANCES: usize = 4;

/// Stack size hint for spawned worker threads.
pub const WORKER_STACK_SIZE: usize = 256 * 1024;

/// Default scheduling priority for workers that don't specify one.
pub const WORKER_PRIORITY_DEFAULT: u8 = 50;

/// Capacity of the bounded channels used as queue edges between workers.
/// Not part of the original recognized-option table; sized generously
/// relative to `POOL_CAPACITY` so back-pressure shows up as pool exhaustion
/// rather than queue-full drops under normal load.
pub const QUEUE_CAPACITY: usize = POOL_CAPACITY;

/// A scheduling priority hint passed to `start(priority)` calls. Mapping
/// this onto real OS/RTOS priority classes is a platform concern (see
/// `platform::apply_priority_hint`); the core only stores and forwards it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WorkerPriority(pub u8);

impl Default for WorkerPriority {
    fn default() -> Self {
        WorkerPriority(WORKER_PRIORITY_DEFAULT)
    }
}
