//! Streaming spectrum analyzer: the representative hard node. Bounded
//! sample accumulation, windowed real FFT, and concurrency-safe readout
//! of magnitude/phase/peak from a fixed-capacity arena of instances.

mod analyzer;
mod window;

pub use analyzer::{
    bin_to_freq, AnalyzerConfig, AnalyzerResult, SpectrumAnalyzer, SpectrumArena, SpectrumHandle,
};
pub use window::WindowKind;
