//! The spectrum analyzer core: bounded sample accumulation, windowed real
//! FFT, and a fixed-capacity arena of instances. FFT usage is grounded on
//! the teacher's `nodes/spectral_freeze.rs` (`RealFftPlanner`,
//! `make_output_vec`, `process`); the coherent-gain window normalization
//! is new code written in that file's window-generation style, since
//! `spectral_freeze.rs` does not renormalize.

use std::sync::{Arc, Mutex};

use realfft::num_complex::Complex32;
use realfft::{RealFftPlanner, RealToComplex};

use crate::config::MAX_SPECTRUM_INSTANCES;
use crate::error::{Error, Result};
use crate::node::SequentialNode;
use crate::platform::SpinLock;
use crate::pool::Block;

use super::window::{self, WindowKind};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyzerConfig {
    pub fft_size: usize,
    pub hop_size: usize,
    pub window: WindowKind,
    pub compute_phase: bool,
    pub magnitude_floor_db: f32,
    pub sample_rate: u32,
}

impl AnalyzerConfig {
    pub fn new(fft_size: usize, sample_rate: u32) -> Self {
        Self {
            fft_size,
            hop_size: fft_size,
            window: WindowKind::Hann,
            compute_phase: false,
            magnitude_floor_db: -120.0,
            sample_rate,
        }
    }

    pub fn with_hop_size(mut self, hop_size: usize) -> Self {
        self.hop_size = if hop_size == 0 { self.fft_size } else { hop_size };
        self
    }

    pub fn with_window(mut self, window: WindowKind) -> Self {
        self.window = window;
        self
    }

    pub fn with_phase(mut self, compute_phase: bool) -> Self {
        self.compute_phase = compute_phase;
        self
    }

    fn validate(&self) -> Result<()> {
        let power_of_two_in_range = self.fft_size.is_power_of_two() && (32..=2048).contains(&self.fft_size);
        if !power_of_two_in_range {
            return Err(Error::Invalid {
                reason: "fft_size must be a power of two in 32..=2048",
            });
        }
        if self.hop_size == 0 || self.hop_size > self.fft_size {
            return Err(Error::Invalid {
                reason: "hop_size must be in 1..=fft_size",
            });
        }
        Ok(())
    }
}

/// Published results, guarded by a per-instance [`SpinLock`]. Readers hold
/// the lock only long enough to copy these fields out.
#[derive(Debug, Clone)]
pub struct AnalyzerResult {
    pub magnitude: Vec<f32>,
    pub phase: Option<Vec<f32>>,
    pub peak_freq: f32,
    pub peak_mag: f32,
    pub process_count: u64,
    pub ready: bool,
}

impl AnalyzerResult {
    fn fresh(bins: usize, compute_phase: bool) -> Self {
        Self {
            magnitude: vec![0.0; bins],
            phase: compute_phase.then(|| vec![0.0; bins]),
            peak_freq: 0.0,
            peak_mag: 0.0,
            process_count: 0,
            ready: false,
        }
    }
}

pub fn bin_to_freq(bin: usize, fft_size: usize, sample_rate: u32) -> f32 {
    bin as f32 * sample_rate as f32 / fft_size as f32
}

/// Stable index into the arena's fixed slot table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpectrumHandle(usize);

struct ArenaInner {
    occupied: Mutex<[bool; MAX_SPECTRUM_INSTANCES]>,
}

/// Fixed-capacity arena of analyzer instances: "statically reserved
/// storage" realized as stable-index slots rather than a heap pool. The
/// mutex here guards only slot bookkeeping at acquire/release time, never
/// the per-sample hot path.
#[derive(Clone)]
pub struct SpectrumArena {
    inner: Arc<ArenaInner>,
}

impl SpectrumArena {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ArenaInner {
                occupied: Mutex::new([false; MAX_SPECTRUM_INSTANCES]),
            }),
        }
    }

    pub fn acquire(&self, config: AnalyzerConfig) -> Result<SpectrumAnalyzer> {
        config.validate()?;
        let handle = {
            let mut occupied = self.inner.occupied.lock().expect("arena mutex poisoned");
            let slot = occupied
                .iter()
                .position(|&taken| !taken)
                .ok_or(Error::OutOfMemory)?;
            occupied[slot] = true;
            SpectrumHandle(slot)
        };
        Ok(SpectrumAnalyzer::new(self.clone(), handle, config))
    }

    pub fn in_use(&self) -> usize {
        self.inner
            .occupied
            .lock()
            .expect("arena mutex poisoned")
            .iter()
            .filter(|&&taken| taken)
            .count()
    }

    fn release(&self, handle: SpectrumHandle) {
        self.inner.occupied.lock().expect("arena mutex poisoned")[handle.0] = false;
    }
}

impl Default for SpectrumArena {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SpectrumAnalyzer {
    arena: SpectrumArena,
    handle: SpectrumHandle,
    config: AnalyzerConfig,
    window: Vec<f32>,
    accum: Vec<i16>,
    pos: usize,
    r2c: Arc<dyn RealToComplex<f32>>,
    scratch_in: Vec<f32>,
    scratch_spectrum: Vec<Complex32>,
    result: Arc<SpinLock<AnalyzerResult>>,
}

impl SpectrumAnalyzer {
    fn new(arena: SpectrumArena, handle: SpectrumHandle, config: AnalyzerConfig) -> Self {
        let bins = config.fft_size / 2;
        let window = window::generate(config.window, config.fft_size);
        let mut planner = RealFftPlanner::<f32>::new();
        let r2c = planner.plan_fft_forward(config.fft_size);
        let scratch_spectrum = r2c.make_output_vec();
        Self {
            arena,
            handle,
            scratch_in: vec![0.0; config.fft_size],
            scratch_spectrum,
            accum: vec![0; config.fft_size],
            pos: 0,
            r2c,
            window,
            result: Arc::new(SpinLock::new(AnalyzerResult::fresh(bins, config.compute_phase))),
            config,
        }
    }

    pub fn handle(&self) -> SpectrumHandle {
        self.handle
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// A cheap handle to the published result, safe to poll from any
    /// thread while this analyzer runs in its strip's worker.
    pub fn result_handle(&self) -> Arc<SpinLock<AnalyzerResult>> {
        Arc::clone(&self.result)
    }

    pub fn get_spectrum(&self, out: &mut [f32]) -> Result<usize> {
        let guard = self.result.lock();
        if !guard.ready {
            return Err(Error::NotReady);
        }
        let n = out.len().min(guard.magnitude.len());
        out[..n].copy_from_slice(&guard.magnitude[..n]);
        Ok(n)
    }

    pub fn get_spectrum_db(&self, out: &mut [f32], reference: f32) -> Result<usize> {
        let guard = self.result.lock();
        if !guard.ready {
            return Err(Error::NotReady);
        }
        let floor_linear = 10f32.powf(self.config.magnitude_floor_db / 20.0);
        let n = out.len().min(guard.magnitude.len());
        for (o, &mag) in out[..n].iter_mut().zip(guard.magnitude[..n].iter()) {
            *o = 20.0 * (mag.max(floor_linear) / reference).log10();
        }
        Ok(n)
    }

    pub fn get_phase(&self, out: &mut [f32]) -> Result<usize> {
        let guard = self.result.lock();
        let phase = guard.phase.as_ref().ok_or(Error::NotSupported)?;
        if !guard.ready {
            return Err(Error::NotReady);
        }
        let n = out.len().min(phase.len());
        out[..n].copy_from_slice(&phase[..n]);
        Ok(n)
    }

    pub fn get_peak(&self) -> Result<(f32, f32)> {
        let guard = self.result.lock();
        if !guard.ready {
            return Err(Error::NotReady);
        }
        Ok((guard.peak_freq, guard.peak_mag))
    }

    pub fn process_count(&self) -> u64 {
        self.result.lock().process_count
    }

    pub fn bin_to_freq(&self, bin: usize) -> f32 {
        bin_to_freq(bin, self.config.fft_size, self.config.sample_rate)
    }

    fn run_fft(&mut self) {
        let scale = 1.0 / i16::MAX as f32;
        for (dst, (&sample, &w)) in self
            .scratch_in
            .iter_mut()
            .zip(self.accum.iter().zip(self.window.iter()))
        {
            *dst = sample as f32 * scale * w;
        }
        self.r2c
            .process(&mut self.scratch_in, &mut self.scratch_spectrum)
            .expect("fixed-size FFT plan always accepts its own buffer sizes");

        let bins = self.config.fft_size / 2;
        let mut magnitude = vec![0.0f32; bins];
        let mut phase = self.config.compute_phase.then(|| vec![0.0f32; bins]);

        // Single-sided spectrum: every bin but DC (index 0) and the
        // Nyquist-adjacent top bin (index `bins - 1`) accounts for energy
        // split across the folded negative-frequency half, so it gets
        // doubled here rather than in the window normalization.
        let norm = 1.0 / self.config.fft_size as f32;
        for (i, bin) in self.scratch_spectrum.iter().take(bins).enumerate() {
            let one_sided = if i == 0 || i == bins - 1 { 1.0 } else { 2.0 };
            magnitude[i] = (bin.re * bin.re + bin.im * bin.im).sqrt() * norm * one_sided;
            if let Some(phases) = phase.as_mut() {
                phases[i] = bin.im.atan2(bin.re);
            }
        }

        let (peak_bin, peak_mag) = magnitude
            .iter()
            .enumerate()
            .skip(1)
            .fold((0usize, 0.0f32), |best, (i, &mag)| if mag > best.1 { (i, mag) } else { best });
        let peak_freq = bin_to_freq(peak_bin, self.config.fft_size, self.config.sample_rate);

        let mut guard = self.result.lock();
        guard.magnitude = magnitude;
        guard.phase = phase;
        guard.peak_freq = peak_freq;
        guard.peak_mag = peak_mag;
        guard.process_count += 1;
        guard.ready = true;
    }
}

impl SequentialNode for SpectrumAnalyzer {
    fn step(&mut self, input: Option<Block>) -> Option<Block> {
        let block = input?;
        let samples = block.as_slice();

        let available = self.config.fft_size - self.pos;
        let take = available.min(samples.len());
        self.accum[self.pos..self.pos + take].copy_from_slice(&samples[..take]);
        self.pos += take;

        if self.pos < self.config.fft_size {
            return Some(block);
        }

        self.run_fft();

        if self.config.hop_size < self.config.fft_size {
            let keep = self.config.fft_size - self.config.hop_size;
            self.accum.copy_within(self.config.hop_size.., 0);
            self.pos = keep;
        } else {
            self.pos = 0;
        }

        Some(block)
    }

    fn reset(&mut self) {
        self.pos = 0;
        self.accum.fill(0);
        let bins = self.config.fft_size / 2;
        *self.result.lock() = AnalyzerResult::fresh(bins, self.config.compute_phase);
    }

    fn name(&self) -> &str {
        "SpectrumAnalyzer"
    }
}

impl Drop for SpectrumAnalyzer {
    fn drop(&mut self) {
        self.arena.release(self.handle);
    }
}
