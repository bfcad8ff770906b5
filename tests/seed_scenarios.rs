//! Cross-module integration behavior: the seven seed scenarios from the
//! spec, each driving a real constructed node graph end to end rather
//! than a single module in isolation.

use blockgraph::config::{BLOCK_SAMPLES, SAMPLE_RATE};
use blockgraph::mixer::Mixer;
use blockgraph::node::SequentialNode;
use blockgraph::nodes::{SineNode, VolumeNode};
use blockgraph::pool::BlockPool;
use blockgraph::spectrum::{AnalyzerConfig, SpectrumArena, WindowKind};
use blockgraph::strip::ChannelStrip;

fn zero_crossings(samples: &[i16]) -> usize {
    samples.windows(2).filter(|w| (w[0] >= 0) != (w[1] >= 0)).count()
}

#[test]
fn seed_1_sine_frequency_accuracy() {
    let pool = BlockPool::new(4);
    let mut sine = SineNode::new(pool, 1000.0, SAMPLE_RATE);
    let block = sine.step(None).unwrap();
    let crossings = zero_crossings(block.as_slice());
    assert!((4..=6).contains(&crossings), "got {crossings} crossings");
}

#[test]
fn seed_2_phase_continuity() {
    let pool = BlockPool::new(4);
    let mut sine = SineNode::new(pool, 1000.0, SAMPLE_RATE);
    let a = sine.step(None).unwrap();
    let b = sine.step(None).unwrap();
    let d = (a.as_slice()[BLOCK_SAMPLES - 1] as i32 - b.as_slice()[0] as i32).unsigned_abs();
    assert!(d < 3000, "phase discontinuity {d}");
}

#[test]
fn seed_3_reset_restores_phase() {
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
fn seed_4_analyzer_peak_detection() {
    let pool = BlockPool::new(16);
    let arena = SpectrumArena::new();
    let config = AnalyzerConfig::new(512, SAMPLE_RATE)
        .with_hop_size(512)
        .with_window(WindowKind::Hann);
    let mut analyzer = arena.acquire(config).unwrap();

    let mut sine = SineNode::new(pool, 1000.0, SAMPLE_RATE).with_amplitude(0.5);
    let mut consumed = 0;
    while consumed < 512 {
        let block = sine.step(None).unwrap();
        analyzer.step(Some(block));
        consumed += BLOCK_SAMPLES;
    }

    let (freq, mag) = analyzer.get_peak().unwrap();
    let tolerance = (SAMPLE_RATE as f32 / 512.0) * 2.0;
    assert!((freq - 1000.0).abs() <= tolerance, "peak freq {freq}, tolerance {tolerance}");
    assert!(mag > 0.4, "peak magnitude {mag} not > 0.4");
}

#[test]
fn seed_5_analyzer_silence() {
    let pool = BlockPool::new(16);
    let arena = SpectrumArena::new();
    let mut analyzer = arena.acquire(AnalyzerConfig::new(256, SAMPLE_RATE)).unwrap();

    let mut consumed = 0;
    while consumed < 256 {
        let block = pool.acquire().unwrap();
        analyzer.step(Some(block));
        consumed += BLOCK_SAMPLES;
    }

    let mut out = vec![0.0f32; 128];
    analyzer.get_spectrum(&mut out).unwrap();
    assert!(out.iter().all(|&m| m < 0.01), "{out:?}");
}

#[test]
fn seed_6_cow_under_fan_out() {
    let pool = BlockPool::new(4);
    let mut b = pool.acquire().unwrap();
    b.as_mut_slice().iter_mut().for_each(|s| *s = 1234);

    let original = b.clone();
    assert_eq!(b.refcount(), 2);

    b.make_writable(&pool).unwrap();
    assert_eq!(b.refcount(), 1);
    assert_eq!(original.refcount(), 1);

    b.as_mut_slice().iter_mut().for_each(|s| *s = -1);
    assert!(original.as_slice().iter().all(|&s| s == 1234), "original must be untouched");
    assert!(b.as_slice().iter().all(|&s| s == -1));
}

#[test]
fn seed_7_mixer_silence_and_sine() {
    let pool = BlockPool::new(32);
    let mut mixer = Mixer::new("m", pool.clone());

    let mut silence = ChannelStrip::new("silence");
    silence
        .add_node(Box::new(VolumeNode::new(pool.clone(), 0.0)))
        .unwrap();
    mixer.add_channel(silence).unwrap();

    let mut sine = ChannelStrip::new("sine");
    sine.add_node(Box::new(SineNode::new(pool.clone(), 440.0, SAMPLE_RATE)))
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
    assert!((peak - expected).abs() < expected * 0.1, "peak {peak} not within 10% of {expected}");
}

