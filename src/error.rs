//! Typed error taxonomy for construction, CoW escalation, and readout
//! boundaries. The hot per-step path never uses this type (see module docs
//! in `node.rs`): leaf nodes signal failure by returning `None` or dropping
//! their output, never by propagating an `Error`.

use thiserror::Error;

/// Errors reported at the boundaries named in the external interface:
/// construction, `make_writable`, readouts, and capacity-limited inserts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A fixed-capacity pool was exhausted. Never allocates past capacity.
    #[error("pool exhausted")]
    OutOfMemory,

    /// Bad configuration at construction time; the object is left
    /// uninitialized.
    #[error("invalid configuration: {reason}")]
    Invalid { reason: &'static str },

    /// Readout attempted before sufficient data accumulated.
    #[error("result not ready")]
    NotReady,

    /// Feature queried that isn't enabled in this configuration.
    #[error("feature not supported")]
    NotSupported,

    /// Tried to add more nodes/channels/outputs than the static cap allows.
    #[error("capacity exceeded")]
    Full,
}

/// Crate-wide result alias for the boundary operations that use [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
