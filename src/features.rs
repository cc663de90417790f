//! Fixed-layout acoustic feature extraction

use crate::config::{AnalysisConfig, PitchConfig};
use crate::pitch;
use crate::spectral::{self, StftData};
use ndarray::{Array2, ArrayView1};

/// Length of the feature vector for a given analysis configuration:
/// MFCC and chroma mean/std blocks, five spectral descriptor pairs, and
/// the f0 pair. 62 with the default configuration.
pub fn feature_len(analysis: &AnalysisConfig) -> usize {
    2 * analysis.n_mfcc + 2 * analysis.n_chroma + 10 + 2
}

/// Mean of the fundamental-frequency slot in an extracted vector
pub fn f0_mean(features: &[f32]) -> f32 {
    if features.len() >= 2 {
        features[features.len() - 2]
    } else {
        0.0
    }
}

/// Extract the fixed-layout feature vector from a mono analysis signal.
///
/// Layout, in order: MFCC means, MFCC standard deviations, chroma means,
/// chroma standard deviations, then mean/std pairs for spectral centroid,
/// rolloff, bandwidth, zero-crossing rate and RMS energy, and finally the
/// f0 mean/std pair. Empty input yields an all-zero vector of the same
/// length, so downstream consumers always see the same dimensionality.
pub fn extract(
    y: &[f32],
    sample_rate: u32,
    analysis: &AnalysisConfig,
    pitch_cfg: &PitchConfig,
) -> Vec<f32> {
    let len = feature_len(analysis);
    if y.is_empty() {
        return vec![0.0; len];
    }

    let mut features = Vec::with_capacity(len);

    let stft_data = spectral::stft(y, analysis.n_fft, analysis.hop_length, sample_rate);
    let mag = spectral::magnitude_spectrogram(&stft_data);

    let mfcc = compute_mfcc(&mag, &stft_data, sample_rate, analysis);
    push_row_stats(&mut features, &mfcc);

    let chroma = compute_chroma(&mag, &stft_data.freqs, analysis.n_chroma);
    push_row_stats(&mut features, &chroma);

    // Per-frame spectral descriptors
    let n_cols = mag.shape()[1];
    let mut centroid = Vec::with_capacity(n_cols);
    let mut rolloff = Vec::with_capacity(n_cols);
    let mut bandwidth = Vec::with_capacity(n_cols);
    for t in 0..n_cols {
        let column = mag.column(t);
        let c = spectral_centroid(&column, &stft_data.freqs);
        centroid.push(c);
        rolloff.push(spectral_rolloff(
            &column,
            &stft_data.freqs,
            analysis.rolloff_percent,
        ));
        bandwidth.push(spectral_bandwidth(&column, &stft_data.freqs, c));
    }

    // Time-domain descriptors on the same frame grid
    let framed = spectral::frames(y, analysis.n_fft, analysis.hop_length);
    let zcr: Vec<f32> = framed.iter().map(|f| zero_crossing_rate(f)).collect();
    let rms: Vec<f32> = framed.iter().map(|f| rms_energy(f)).collect();

    for series in [&centroid, &rolloff, &bandwidth, &zcr, &rms] {
        features.push(mean(series));
        features.push(std_dev(series));
    }

    // Fundamental frequency over voiced frames only
    let f0 = pitch::track_f0(y, sample_rate, pitch_cfg);
    let voiced: Vec<f32> = f0.into_iter().filter(|&v| v > 0.0).collect();
    features.push(mean(&voiced));
    features.push(std_dev(&voiced));

    features
}

/// Append the per-row means of a matrix, then the per-row standard
/// deviations, preserving row order within each block.
fn push_row_stats(out: &mut Vec<f32>, rows: &Array2<f32>) {
    let mut stds = Vec::with_capacity(rows.shape()[0]);
    for r in 0..rows.shape()[0] {
        let row: Vec<f32> = rows.row(r).iter().copied().collect();
        out.push(mean(&row));
        stds.push(std_dev(&row));
    }
    out.extend_from_slice(&stds);
}

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

/// Population standard deviation
fn std_dev(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|&x| (x - m) * (x - m)).sum::<f32>() / values.len() as f32;
    var.sqrt()
}

fn hz_to_mel(f: f32) -> f32 {
    2595.0 * (1.0 + f / 700.0).log10()
}

fn mel_to_hz(m: f32) -> f32 {
    700.0 * (10.0f32.powf(m / 2595.0) - 1.0)
}

/// Triangular mel filterbank over the STFT bins, rows area-normalized
fn mel_filterbank(n_mels: usize, freqs: &[f32], fmax: f32) -> Array2<f32> {
    let n_bins = freqs.len();
    let mel_max = hz_to_mel(fmax);

    // n_mels bands need n_mels + 2 edge points on the mel axis
    let edges: Vec<f32> = (0..n_mels + 2)
        .map(|i| mel_to_hz(mel_max * i as f32 / (n_mels + 1) as f32))
        .collect();

    let mut fbank = Array2::<f32>::zeros((n_mels, n_bins));
    for m in 0..n_mels {
        let (lo, center, hi) = (edges[m], edges[m + 1], edges[m + 2]);
        let norm = 2.0 / (hi - lo);
        for (b, &f) in freqs.iter().enumerate() {
            let weight = if f <= lo || f >= hi {
                0.0
            } else if f <= center {
                (f - lo) / (center - lo)
            } else {
                (hi - f) / (hi - center)
            };
            fbank[[m, b]] = weight * norm;
        }
    }

    fbank
}

/// Mel-frequency cepstral coefficients: power spectrogram through the mel
/// filterbank, log-compressed with a 1e-10 floor, then an orthonormal
/// DCT-II keeping the first n_mfcc coefficients.
fn compute_mfcc(
    mag: &Array2<f32>,
    stft_data: &StftData,
    sample_rate: u32,
    analysis: &AnalysisConfig,
) -> Array2<f32> {
    let n_cols = mag.shape()[1];
    let power = mag.map(|&x| x * x);
    let fbank = mel_filterbank(analysis.n_mels, &stft_data.freqs, sample_rate as f32 / 2.0);
    let mel = fbank.dot(&power);

    let log_mel = mel.map(|&x| 10.0 * x.max(1e-10).log10());

    let n = analysis.n_mels as f32;
    let mut mfcc = Array2::<f32>::zeros((analysis.n_mfcc, n_cols));
    for t in 0..n_cols {
        for k in 0..analysis.n_mfcc {
            let mut acc = 0.0f32;
            for m in 0..analysis.n_mels {
                acc += log_mel[[m, t]]
                    * (std::f32::consts::PI * k as f32 * (2.0 * m as f32 + 1.0) / (2.0 * n)).cos();
            }
            let scale = if k == 0 {
                (1.0 / n).sqrt()
            } else {
                (2.0 / n).sqrt()
            };
            mfcc[[k, t]] = acc * scale;
        }
    }

    mfcc
}

/// Fold bin energy onto pitch classes (A4 = 440 Hz reference) and
/// normalize each frame by its maximum. Silent frames stay all-zero.
fn compute_chroma(mag: &Array2<f32>, freqs: &[f32], n_chroma: usize) -> Array2<f32> {
    let n_cols = mag.shape()[1];
    let mut chroma = Array2::<f32>::zeros((n_chroma, n_cols));

    for t in 0..n_cols {
        for (b, &f) in freqs.iter().enumerate() {
            if f <= 0.0 {
                continue;
            }
            let midi = 69.0 + 12.0 * (f / 440.0).log2();
            let pc = ((midi.round() as i32) % n_chroma as i32).rem_euclid(n_chroma as i32) as usize;
            chroma[[pc, t]] += mag[[b, t]] * mag[[b, t]];
        }

        let mut max = 0.0f32;
        for p in 0..n_chroma {
            max = max.max(chroma[[p, t]]);
        }
        if max > 0.0 {
            for p in 0..n_chroma {
                chroma[[p, t]] /= max;
            }
        }
    }

    chroma
}

fn spectral_centroid(mag_frame: &ArrayView1<f32>, freqs: &[f32]) -> f32 {
    let mut weighted_sum = 0.0;
    let mut total = 0.0;
    for i in 0..mag_frame.len().min(freqs.len()) {
        weighted_sum += freqs[i] * mag_frame[i];
        total += mag_frame[i];
    }
    if total > 0.0 {
        weighted_sum / total
    } else {
        0.0
    }
}

/// Frequency below which `percent` of the spectral energy sits
fn spectral_rolloff(mag_frame: &ArrayView1<f32>, freqs: &[f32], percent: f32) -> f32 {
    let total_energy: f32 = mag_frame.iter().map(|&m| m * m).sum();
    if total_energy <= 0.0 {
        return 0.0;
    }

    let target = percent * total_energy;
    let mut cumulative = 0.0;
    for i in 0..mag_frame.len().min(freqs.len()) {
        cumulative += mag_frame[i] * mag_frame[i];
        if cumulative >= target {
            return freqs[i];
        }
    }
    freqs.last().copied().unwrap_or(0.0)
}

/// Magnitude-weighted deviation around the centroid
fn spectral_bandwidth(mag_frame: &ArrayView1<f32>, freqs: &[f32], centroid: f32) -> f32 {
    let mut weighted_sum = 0.0;
    let mut total = 0.0;
    for i in 0..mag_frame.len().min(freqs.len()) {
        let dev = freqs[i] - centroid;
        weighted_sum += mag_frame[i] * dev * dev;
        total += mag_frame[i];
    }
    if total > 0.0 {
        (weighted_sum / total).sqrt()
    } else {
        0.0
    }
}

fn zero_crossing_rate(frame: &[f32]) -> f32 {
    if frame.len() < 2 {
        return 0.0;
    }
    let crossings = frame
        .windows(2)
        .filter(|w| w[0].signum() != w[1].signum())
        .count();
    crossings as f32 / frame.len() as f32
}

fn rms_energy(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    (frame.iter().map(|&x| x * x).sum::<f32>() / frame.len() as f32).sqrt()
}
