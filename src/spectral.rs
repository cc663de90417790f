//! Spectral processing utilities (centered STFT, framing)

use ndarray::Array2;
use rustfft::{num_complex::Complex32, FftPlanner};

/// STFT data structure
#[derive(Debug, Clone)]
pub struct StftData {
    /// Complex spectrogram, (n_fft / 2 + 1) bins by n_frames columns
    pub s: Array2<Complex32>,
    /// Center frequency of each bin in Hz
    pub freqs: Vec<f32>,
}

/// Fold an index into [0, n) by reflecting at the boundaries, without
/// repeating the edge samples.
fn reflect_index(i: isize, n: isize) -> usize {
    if n == 1 {
        return 0;
    }
    let period = 2 * (n - 1);
    let mut j = i.rem_euclid(period);
    if j >= n {
        j = period - j;
    }
    j as usize
}

/// Reflect-pad a signal by `pad` samples on each side
fn reflect_pad(y: &[f32], pad: usize) -> Vec<f32> {
    if y.is_empty() {
        return Vec::new();
    }
    let n = y.len() as isize;
    (0..y.len() + 2 * pad)
        .map(|p| y[reflect_index(p as isize - pad as isize, n)])
        .collect()
}

/// Number of centered analysis frames for a signal of `len` samples.
/// Any non-empty signal yields at least one frame; empty input yields none.
pub fn n_frames(len: usize, frame_length: usize, hop_length: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let padded = len + 2 * (frame_length / 2);
    if padded < frame_length {
        0
    } else {
        (padded - frame_length) / hop_length + 1
    }
}

/// Split a signal into centered time-domain frames, reflect-padded so the
/// frame grid matches [`stft`].
pub fn frames(y: &[f32], frame_length: usize, hop_length: usize) -> Vec<Vec<f32>> {
    let count = n_frames(y.len(), frame_length, hop_length);
    if count == 0 {
        return Vec::new();
    }

    let padded = reflect_pad(y, frame_length / 2);
    (0..count)
        .map(|i| {
            let start = i * hop_length;
            padded[start..start + frame_length].to_vec()
        })
        .collect()
}

/// Compute the centered STFT of an audio signal (Hann window, reflect
/// padding). Short non-empty signals still produce one frame.
pub fn stft(y: &[f32], n_fft: usize, hop_length: usize, sample_rate: u32) -> StftData {
    let n_bins = n_fft / 2 + 1;
    let count = n_frames(y.len(), n_fft, hop_length);

    let freqs: Vec<f32> = (0..n_bins)
        .map(|i| i as f32 * sample_rate as f32 / n_fft as f32)
        .collect();

    let mut s = Array2::<Complex32>::zeros((n_bins, count));
    if count == 0 {
        return StftData { s, freqs };
    }

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n_fft);
    let window_fn = hann_window(n_fft);
    let padded = reflect_pad(y, n_fft / 2);

    for frame_idx in 0..count {
        let start = frame_idx * hop_length;

        // Apply window
        let mut frame: Vec<Complex32> = padded[start..start + n_fft]
            .iter()
            .zip(&window_fn)
            .map(|(&sample, &win)| Complex32::new(sample * win, 0.0))
            .collect();

        // FFT
        fft.process(&mut frame);

        // Store positive frequencies
        for (i, &val) in frame[..n_bins].iter().enumerate() {
            s[[i, frame_idx]] = val;
        }
    }

    StftData { s, freqs }
}

/// Generate a Hann window
fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos()))
        .collect()
}

/// Compute magnitude spectrogram
pub fn magnitude_spectrogram(stft_data: &StftData) -> Array2<f32> {
    stft_data.s.map(|c| c.norm())
}
