//! Sine generator: the representative source node. Ignores its input,
//! fills a freshly acquired block, and advances a phase accumulator
//! across calls to preserve continuity. Phase-accumulator style and
//! `reset()` semantics are grounded on the teacher's
//! `nodes/oscillator.rs`, adapted from f32 sample output to clamped int16
//! PCM at a fixed 50% full-scale amplitude.

use std::f32::consts::TAU;

use crate::node::SequentialNode;
use crate::pool::{Block, BlockPool};

/// Default amplitude: 50% of full 16-bit scale, per §4.6.
const DEFAULT_AMPLITUDE: f32 = i16::MAX as f32 * 0.5;

pub struct SineNode {
    pool: BlockPool,
    frequency_hz: f32,
    sample_rate: u32,
    amplitude: f32,
    /// Phase in `[0, 1)`; advances by `frequency_hz / sample_rate` per
    /// sample and wraps modulo 1 (equivalent to modulo 2π).
    phase: f32,
}

impl SineNode {
    /// `pool` is the shared block pool this node acquires its output
    /// blocks from — every node in a pipeline draws from the same bounded
    /// pool, per §3/§4.1's single-resource model, so there is no
    /// pool-less constructor here.
    pub fn new(pool: BlockPool, frequency_hz: f32, sample_rate: u32) -> Self {
        Self {
            pool,
            frequency_hz,
            sample_rate,
            amplitude: DEFAULT_AMPLITUDE,
            phase: 0.0,
        }
    }

    pub fn with_amplitude(mut self, amplitude_fraction: f32) -> Self {
        self.amplitude = i16::MAX as f32 * amplitude_fraction;
        self
    }

    fn phase_increment(&self) -> f32 {
        self.frequency_hz / self.sample_rate as f32
    }

    fn fill(&mut self, block: &mut Block) {
        let increment = self.phase_increment();
        for sample in block.as_mut_slice().iter_mut() {
            *sample = (self.amplitude * (TAU * self.phase).sin()).round() as i16;
            self.phase += increment;
            if self.phase >= 1.0 {
                self.phase -= 1.0;
            }
        }
    }
}

impl SequentialNode for SineNode {
    fn step(&mut self, input: Option<Block>) -> Option<Block> {
        drop(input); // source node: input is ignored (released if present).
        let mut block = self.pool.acquire()?;
        self.fill(&mut block);
        Some(block)
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }

    fn name(&self) -> &str {
        "SineNode"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BLOCK_SAMPLES, SAMPLE_RATE};

    fn zero_crossings(samples: &[i16]) -> usize {
        samples
            .windows(2)
            .filter(|w| (w[0] >= 0) != (w[1] >= 0))
            .count()
    }

    #[test]
    fn seed_sine_frequency_accuracy() {
        let pool = BlockPool::new(4);
        let mut sine = SineNode::new(pool, 1000.0, SAMPLE_RATE);
        let block = sine.step(None).unwrap();
        let crossings = zero_crossings(block.as_slice());
        assert!((4..=6).contains(&crossings), "got {crossings} crossings");
    }

    #[test]
    fn seed_phase_continuity() {
        let pool = BlockPool::new(4);
        let mut sine = SineNode::new(pool, 1000.0, SAMPLE_RATE);
        let a = sine.step(None).unwrap();
        let b = sine.step(None).unwrap();
        let d = (a.as_slice()[BLOCK_SAMPLES - 1] as i32 - b.as_slice()[0] as i32).unsigned_abs();
        assert!(d < 3000, "phase discontinuity {d}");
    }

    #[test]
    fn seed_reset_restores_phase() {
        let pool = BlockPool::new(4);
        let mut sine = SineNode::new(pool, 1000.0, SAMPLE_RATE);
        let first = sine.step(None).unwrap();
        let s0 = first.as_slice()[0];

        for _ in 0..5 {
            sine.step(None);
        }
        sine.reset();
        let after_reset = sine.step(None).unwrap();
        let s1 = after_reset.as_slice()[0];
        assert_eq!(s1, s0);
    }

    #[test]
    fn ignores_and_releases_non_null_input() {
        let pool = BlockPool::new(4);
        let mut sine = SineNode::new(pool.clone(), 440.0, SAMPLE_RATE);
        let input = pool.acquire().unwrap();
        let _ = sine.step(Some(input));
        assert_eq!(pool.available(), pool.capacity(), "no blocks should leak");
    }

    #[test]
    fn amplitude_default_is_half_full_scale() {
        let pool = BlockPool::new(4);
        let mut sine = SineNode::new(pool, 1000.0, SAMPLE_RATE);
        let block = sine.step(None).unwrap();
        let peak = block.as_slice().iter().map(|s| s.unsigned_abs()).max().unwrap();
        assert!(peak as f32 <= DEFAULT_AMPLITUDE * 1.01);
        assert!(peak as f32 >= DEFAULT_AMPLITUDE * 0.5);
    }
}
