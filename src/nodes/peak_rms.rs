//! Peak/RMS analyzer: a pass-through metering node. Computes per-block
//! peak and RMS, exponentially smooths the RMS, and publishes
//! `{rms_db, peak_db, clipping}` under a short lock. Never mutates the
//! block. O(1)-per-block incremental-update style grounded on the
//! teacher's `nodes/rms.rs`, adapted from circular-buffer windowed RMS to
//! single-pole exponential smoothing per this spec's contract.

use std::sync::Arc;

use crate::node::SequentialNode;
use crate::platform::SpinLock;
use crate::pool::Block;

const FLOOR_LINEAR: f32 = 1e-6;

#[derive(Debug, Clone, Copy, Default)]
pub struct PeakRmsReading {
    pub rms_db: f32,
    pub peak_db: f32,
    pub clipping: bool,
}

fn to_db(linear: f32) -> f32 {
    20.0 * linear.max(FLOOR_LINEAR).log10()
}

pub struct PeakRmsNode {
    /// Exponential smoothing factor in `[0, 1)`: weight given to the
    /// running average versus the current block's RMS.
    smoothing: f32,
    smoothed_rms: f32,
    reading: Arc<SpinLock<PeakRmsReading>>,
}

impl PeakRmsNode {
    pub fn new(smoothing: f32) -> Self {
        assert!((0.0..1.0).contains(&smoothing), "smoothing must be in [0, 1)");
        Self {
            smoothing,
            smoothed_rms: 0.0,
            reading: Arc::new(SpinLock::new(PeakRmsReading::default())),
        }
    }

    /// A cheap handle to the published reading, safe to poll from any
    /// thread while this node runs in its strip's worker.
    pub fn reading_handle(&self) -> Arc<SpinLock<PeakRmsReading>> {
        Arc::clone(&self.reading)
    }

    pub fn reading(&self) -> PeakRmsReading {
        *self.reading.lock()
    }
}

impl SequentialNode for PeakRmsNode {
    fn step(&mut self, input: Option<Block>) -> Option<Block> {
        let block = input?;
        let samples = block.as_slice();
        let full_scale = i16::MAX as f32;

        let mut sum_sq = 0.0f32;
        let mut peak_abs: u16 = 0;
        let mut clipping = false;
        for &s in samples {
            let v = s as f32;
            sum_sq += v * v;
            peak_abs = peak_abs.max(s.unsigned_abs());
            if s == i16::MIN || s == i16::MAX {
                clipping = true;
            }
        }

        let block_rms = (sum_sq / samples.len() as f32).sqrt() / full_scale;
        self.smoothed_rms = self.smoothed_rms * self.smoothing + block_rms * (1.0 - self.smoothing);
        let peak_norm = peak_abs as f32 / full_scale;

        {
            let mut guard = self.reading.lock();
            guard.rms_db = to_db(self.smoothed_rms);
            guard.peak_db = to_db(peak_norm);
            guard.clipping = clipping;
        }

        Some(block)
    }

    fn reset(&mut self) {
        self.smoothed_rms = 0.0;
        *self.reading.lock() = PeakRmsReading::default();
    }

    fn name(&self) -> &str {
        "PeakRmsNode"
    }
}
