//! Window coefficient generation for the spectrum analyzer, with
//! coherent-gain renormalization so windowed RMS power is preserved.

use std::f32::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowKind {
    Rectangular,
    Hann,
    Hamming,
    Blackman,
    FlatTop,
}

/// Generates `n` window coefficients for `kind`, then rescales them so
/// that `sum(w[i]^2) == n` (coherent gain of 1), per the spec's
/// `sqrt(N / sum(w[i]^2))` normalization.
pub fn generate(kind: WindowKind, n: usize) -> Vec<f32> {
    let mut w: Vec<f32> = (0..n).map(|i| raw_coefficient(kind, i, n)).collect();
    let sum_sq: f32 = w.iter().map(|x| x * x).sum();
    if sum_sq > 0.0 {
        let scale = (n as f32 / sum_sq).sqrt();
        w.iter_mut().for_each(|x| *x *= scale);
    }
    w
}

fn raw_coefficient(kind: WindowKind, i: usize, n: usize) -> f32 {
    if n <= 1 {
        return 1.0;
    }
    let phase = 2.0 * PI * i as f32 / (n - 1) as f32;
    match kind {
        WindowKind::Rectangular => 1.0,
        WindowKind::Hann => 0.5 - 0.5 * phase.cos(),
        WindowKind::Hamming => 0.54 - 0.46 * phase.cos(),
        WindowKind::Blackman => 0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos(),
        WindowKind::FlatTop => {
            const A0: f32 = 0.215_578_95;
            const A1: f32 = 0.416_631_58;
            const A2: f32 = 0.277_263_16;
            const A3: f32 = 0.083_578_95;
            const A4: f32 = 0.006_947_368;
            A0 - A1 * phase.cos() + A2 * (2.0 * phase).cos() - A3 * (3.0 * phase).cos()
                + A4 * (4.0 * phase).cos()
        }
    }
}
