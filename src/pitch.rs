//! Fundamental-frequency tracking and note naming

use crate::config::PitchConfig;
use crate::spectral;

/// Pitch-class names in chromatic order starting at C
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Track the fundamental frequency per centered frame. Unvoiced frames
/// (silence, no periodicity inside the configured range) yield 0.0.
pub fn track_f0(y: &[f32], sample_rate: u32, pitch: &PitchConfig) -> Vec<f32> {
    spectral::frames(y, pitch.frame_length, pitch.hop_length)
        .iter()
        .map(|frame| estimate_frame_f0(frame, sample_rate, pitch))
        .collect()
}

/// Single-frame YIN estimate: difference function, cumulative mean
/// normalization, absolute-threshold trough pick, parabolic refinement.
fn estimate_frame_f0(frame: &[f32], sample_rate: u32, pitch: &PitchConfig) -> f32 {
    let sr = sample_rate as f32;
    let window = frame.len() / 2;
    if window < 2 {
        return 0.0;
    }

    let min_tau = (sr / pitch.fmax_hz).floor().max(1.0) as usize;
    let max_tau = ((sr / pitch.fmin_hz).ceil() as usize).min(window - 1);
    if min_tau >= max_tau {
        return 0.0;
    }

    // Difference function over the first half-window
    let mut diff = vec![0.0f32; max_tau + 1];
    for (tau, slot) in diff.iter_mut().enumerate().skip(1) {
        let mut sum = 0.0;
        for j in 0..window {
            let d = frame[j] - frame[j + tau];
            sum += d * d;
        }
        *slot = sum;
    }

    // Cumulative mean normalized difference
    let mut cmndf = vec![1.0f32; max_tau + 1];
    let mut running_sum = 0.0;
    for tau in 1..=max_tau {
        running_sum += diff[tau];
        cmndf[tau] = if running_sum > 0.0 {
            diff[tau] * tau as f32 / running_sum
        } else {
            1.0
        };
    }

    // First trough under the threshold, walked to its local minimum
    let mut tau_est = 0usize;
    for tau in min_tau..=max_tau {
        if cmndf[tau] < pitch.trough_threshold {
            let mut t = tau;
            while t + 1 <= max_tau && cmndf[t + 1] < cmndf[t] {
                t += 1;
            }
            tau_est = t;
            break;
        }
    }

    if tau_est == 0 {
        let mut best = min_tau;
        for tau in min_tau..=max_tau {
            if cmndf[tau] < cmndf[best] {
                best = tau;
            }
        }
        // A flat normalized difference means no periodicity at all
        if cmndf[best] >= 1.0 {
            return 0.0;
        }
        tau_est = best;
    }

    // Parabolic interpolation around the trough
    let tau_refined = if tau_est > min_tau && tau_est < max_tau {
        let d0 = cmndf[tau_est - 1];
        let d1 = cmndf[tau_est];
        let d2 = cmndf[tau_est + 1];
        let denom = d0 + d2 - 2.0 * d1;
        if denom.abs() > 1e-12 {
            tau_est as f32 + 0.5 * (d0 - d2) / denom
        } else {
            tau_est as f32
        }
    } else {
        tau_est as f32
    };

    if tau_refined <= 0.0 {
        0.0
    } else {
        sr / tau_refined
    }
}

/// Name the nearest equal-temperament note for a frequency (A4 = 440 Hz).
/// Non-positive or non-finite input maps to "Unknown".
pub fn hz_to_note_name(freq: f32) -> String {
    if freq <= 0.0 || !freq.is_finite() {
        return "Unknown".to_string();
    }

    let midi = 69.0 + 12.0 * (freq / 440.0).log2();
    let midi_note = midi.round() as i32;
    let pitch_class = (midi_note % 12).rem_euclid(12) as usize;
    let octave = midi_note.div_euclid(12) - 1;

    format!("{}{}", NOTE_NAMES[pitch_class], octave)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, n_samples: usize) -> Vec<f32> {
        (0..n_samples)
            .map(|i| {
                (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin() * 0.5
            })
            .collect()
    }

    fn default_pitch() -> PitchConfig {
        PitchConfig::default()
    }

    #[test]
    fn test_tracks_a440() {
        let y = sine(440.0, 16000, 16000);
        let f0 = track_f0(&y, 16000, &default_pitch());
        assert!(!f0.is_empty());
        // Interior frames see a full period and must land on the tone
        let mid = f0[f0.len() / 2];
        assert!((mid - 440.0).abs() < 5.0, "estimated {} Hz", mid);
    }

    #[test]
    fn test_silence_is_unvoiced() {
        let y = vec![0.0; 8000];
        let f0 = track_f0(&y, 16000, &default_pitch());
        assert!(f0.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_low_tone_within_range() {
        let y = sine(110.0, 16000, 16000);
        let f0 = track_f0(&y, 16000, &default_pitch());
        let mid = f0[f0.len() / 2];
        assert!((mid - 110.0).abs() < 3.0, "estimated {} Hz", mid);
    }

    #[test]
    fn test_note_names() {
        assert_eq!(hz_to_note_name(440.0), "A4");
        assert_eq!(hz_to_note_name(261.63), "C4");
        assert_eq!(hz_to_note_name(65.41), "C2");
        assert_eq!(hz_to_note_name(2093.0), "C7");
        assert_eq!(hz_to_note_name(446.0), "A4");
    }

    #[test]
    fn test_note_name_rejects_non_positive() {
        assert_eq!(hz_to_note_name(0.0), "Unknown");
        assert_eq!(hz_to_note_name(-120.0), "Unknown");
        assert_eq!(hz_to_note_name(f32::NAN), "Unknown");
    }
}
