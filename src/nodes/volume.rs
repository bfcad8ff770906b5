//! Volume: the representative transform node. Requires `make_writable`
//! before mutating (a shared block must be copied first), then multiplies
//! every sample by a static factor with saturation. Multiply-and-clamp
//! style grounded on the teacher's `nodes/gain.rs`.

use crate::node::SequentialNode;
use crate::pool::{Block, BlockPool};

pub struct VolumeNode {
    pool: BlockPool,
    factor: f32,
}

impl VolumeNode {
    /// `pool` is the shared block pool this node draws a fresh copy from
    /// when it needs to escalate a shared block to unique ownership —
    /// every node in a pipeline draws from the same bounded pool, per
    /// §3/§4.1's single-resource model, so there is no pool-less
    /// constructor here.
    pub fn new(pool: BlockPool, factor: f32) -> Self {
        Self { pool, factor }
    }

    pub fn set_factor(&mut self, factor: f32) {
        self.factor = factor;
    }
}

impl SequentialNode for VolumeNode {
    fn step(&mut self, input: Option<Block>) -> Option<Block> {
        let mut block = input?;
        if block.make_writable(&self.pool).is_err() {
            // Pool exhausted: per §7, mutators drop the block after release.
            return None;
        }
        for sample in block.as_mut_slice().iter_mut() {
            let scaled = (*sample as f32) * self.factor;
            *sample = scaled.clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        }
        Some(block)
    }

    fn name(&self) -> &str {
        "VolumeNode"
    }
}
