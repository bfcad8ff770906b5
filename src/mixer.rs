//! Sequential engine: the mixer. Lock-step fan-in of N channel strips
//! (plus an optional master strip) into one output block per input block.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam::channel::Sender;

use crate::config::{WorkerPriority, MIXER_MAX_CHANNELS, QUEUE_CAPACITY};
use crate::error::Error;
use crate::pool::{Block, BlockPool};
use crate::queue::Queue;
use crate::strip::ChannelStrip;
use crate::worker::{SequentialWorker, StepProcessor};

fn sum_saturating(acc: &mut Block, contribution: &Block) {
    for (a, s) in acc.as_mut_slice().iter_mut().zip(contribution.as_slice()) {
        *a = (*a as i32 + *s as i32).clamp(i16::MIN as i32, i16::MAX as i32) as i16;
    }
}

pub(crate) struct MixerCore {
    name: Arc<str>,
    pool: BlockPool,
    channels: Vec<ChannelStrip>,
    master: Option<Box<ChannelStrip>>,
    silent_channels: Arc<AtomicU64>,
}

impl MixerCore {
    fn new(name: Arc<str>, pool: BlockPool, silent_channels: Arc<AtomicU64>) -> Self {
        Self {
            name,
            pool,
            channels: Vec::with_capacity(MIXER_MAX_CHANNELS),
            master: None,
            silent_channels,
        }
    }
}

impl StepProcessor for MixerCore {
    fn process(&mut self, input: Block) -> Option<Block> {
        let mut acc = self.pool.acquire()?;
        for strip in self.channels.iter_mut() {
            match self.pool.acquire() {
                Some(mut per_channel) => {
                    per_channel.as_mut_slice().copy_from_slice(input.as_slice());
                    if let Some(result) = strip.process_block(per_channel) {
                        sum_saturating(&mut acc, &result);
                    }
                }
                None => {
                    self.silent_channels.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(mixer = %self.name, channel = strip.name(), "channel silent: pool exhausted");
                }
            }
        }
        drop(input);
        match &mut self.master {
            Some(master) => master.process_block(acc),
            None => Some(acc),
        }
    }
}

/// Owns N channel strips and an optional master strip, processed
/// lock-step: every channel sees the same input block index before the
/// next input is pulled. Attached strips are driven synchronously by the
/// mixer's own kernel, never via their own worker/queues — "the mixer is
/// the unique owner of its strips' input for the duration of its worker."
pub struct Mixer {
    name: Arc<str>,
    pool: BlockPool,
    input_tx: Sender<Block>,
    input_rx: Option<crossbeam::channel::Receiver<Block>>,
    output: Option<Sender<Block>>,
    core: Option<MixerCore>,
    silent_channels: Arc<AtomicU64>,
    worker: Option<SequentialWorker<MixerCore>>,
}

impl Mixer {
    pub fn new(name: impl Into<String>, pool: BlockPool) -> Self {
        let name: Arc<str> = Arc::from(name.into());
        let queue = Queue::bounded(QUEUE_CAPACITY);
        let silent_channels = Arc::new(AtomicU64::new(0));
        Self {
            input_tx: queue.sender(),
            input_rx: Some(queue.receiver()),
            output: None,
            core: Some(MixerCore::new(Arc::clone(&name), pool.clone(), Arc::clone(&silent_channels))),
            name,
            pool,
            silent_channels,
            worker: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_channel(&mut self, strip: ChannelStrip) -> Result<(), Error> {
        let core = self.core.as_mut().ok_or(Error::Invalid { reason: "mixer is running" })?;
        if core.channels.len() >= MIXER_MAX_CHANNELS {
            return Err(Error::Full);
        }
        core.channels.push(strip);
        Ok(())
    }

    pub fn set_master(&mut self, strip: ChannelStrip) -> Result<(), Error> {
        let core = self.core.as_mut().ok_or(Error::Invalid { reason: "mixer is running" })?;
        core.master = Some(Box::new(strip));
        Ok(())
    }

    pub fn set_output(&mut self, sender: Sender<Block>) {
        self.output = Some(sender);
    }

    pub fn channel_count(&self) -> Option<usize> {
        self.core.as_ref().map(|c| c.channels.len())
    }

    /// Count of channel-iterations where the per-channel block
    /// acquisition failed and the channel contributed silence instead —
    /// the "observable via counters" requirement of §4.5/§7.
    pub fn silent_channel_count(&self) -> u64 {
        self.silent_channels.load(Ordering::Relaxed)
    }

    pub fn process_block(&mut self, block: Block) -> Option<Block> {
        match self.core.as_mut() {
            Some(core) => core.process(block),
            None => {
                tracing::warn!(mixer = %self.name, "process_block called while mixer is running");
                None
            }
        }
    }

    pub fn push_input(&self, block: Block) -> Result<(), Error> {
        self.input_tx.try_send(block).map_err(|_| Error::Full)
    }

    pub fn start(&mut self, priority: WorkerPriority) -> Result<(), Error> {
        let core = self.core.take().ok_or(Error::Invalid { reason: "already running" })?;
        let input_rx = self
            .input_rx
            .take()
            .ok_or(Error::Invalid { reason: "already running" })?;
        let worker = SequentialWorker::start(core, input_rx, self.output.clone(), priority, &self.name);
        self.worker = Some(worker);
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), Error> {
        let worker = self.worker.take().ok_or(Error::Invalid { reason: "not running" })?;
        let core = worker.stop();
        let queue: Queue<Block> = Queue::bounded(QUEUE_CAPACITY);
        self.input_tx = queue.sender();
        self.input_rx = Some(queue.receiver());
        self.core = core.or_else(|| {
            Some(MixerCore::new(
                Arc::clone(&self.name),
                self.pool.clone(),
                Arc::clone(&self.silent_channels),
            ))
        });
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{SineNode, VolumeNode};

    #[test]
    fn mixer_lock_step_silence_plus_sine() {
        let pool = BlockPool::new(32);
        let mut mixer = Mixer::new("m", pool.clone());

        let mut silence = ChannelStrip::new("silence");
        silence
            .add_node(Box::new(VolumeNode::new(pool.clone(), 0.0)))
            .unwrap();
        mixer.add_channel(silence).unwrap();

        let mut sine = ChannelStrip::new("sine");
        sine.add_node(Box::new(SineNode::new(pool.clone(), 440.0, crate::config::SAMPLE_RATE)))
            .unwrap();
        sine.add_node(Box::new(VolumeNode::new(pool.clone(), 0.25))).unwrap();
        mixer.add_channel(sine).unwrap();

        let mut master = ChannelStrip::new("master");
        master
            .add_node(Box::new(VolumeNode::new(pool.clone(), 0.80)))
            .unwrap();
        mixer.set_master(master).unwrap();

        let input = pool.acquire().unwrap();
        let out = mixer.process_block(input).unwrap();
        let peak = out.as_slice().iter().map(|s| s.unsigned_abs()).max().unwrap() as f64;

        let expected = i16::MAX as f64 * 0.5 * 0.25 * 0.80;
        assert!(
            (peak - expected).abs() < expected * 0.1,
            "peak {peak} not within 10% of {expected}"
        );
    }

    #[test]
    fn add_channel_past_capacity_returns_full() {
        let pool = BlockPool::new(64);
        let mut mixer = Mixer::new("m", pool);
        for i in 0..MIXER_MAX_CHANNELS {
            mixer.add_channel(ChannelStrip::new(format!("c{i}"))).unwrap();
        }
        assert_eq!(mixer.add_channel(ChannelStrip::new("overflow")), Err(Error::Full));
    }
}
