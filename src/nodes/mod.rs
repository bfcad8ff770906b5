//! Leaf nodes: the minimal set needed to illustrate the contracts (§1),
//! plus the routing primitives covered elsewhere (`Splitter` in
//! `concurrent.rs`, mixer summation in `mixer.rs`).

mod log_sink;
mod peak_rms;
mod sine;
mod volume;

pub use log_sink::LogSinkNode;
pub use peak_rms::{PeakRmsNode, PeakRmsReading};
pub use sine::SineNode;
pub use volume::VolumeNode;
