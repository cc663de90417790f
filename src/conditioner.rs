//! Band-pass signal conditioning ahead of feature extraction

use crate::config::FilterConfig;
use crate::error::{PipelineError, Result};
use crate::waveform::{self, Waveform};

/// One second-order direct-form filter section
struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

impl Biquad {
    /// Butterworth low-pass section (bilinear transform, Q = 1/sqrt(2))
    fn low_pass(cutoff_hz: f32, sample_rate: f32) -> Self {
        let k = (std::f32::consts::PI * cutoff_hz / sample_rate).tan();
        let q = std::f32::consts::FRAC_1_SQRT_2;
        let norm = 1.0 / (1.0 + k / q + k * k);

        Self {
            b0: k * k * norm,
            b1: 2.0 * k * k * norm,
            b2: k * k * norm,
            a1: 2.0 * (k * k - 1.0) * norm,
            a2: (1.0 - k / q + k * k) * norm,
        }
    }

    /// Butterworth high-pass section (bilinear transform, Q = 1/sqrt(2))
    fn high_pass(cutoff_hz: f32, sample_rate: f32) -> Self {
        let k = (std::f32::consts::PI * cutoff_hz / sample_rate).tan();
        let q = std::f32::consts::FRAC_1_SQRT_2;
        let norm = 1.0 / (1.0 + k / q + k * k);

        Self {
            b0: norm,
            b1: -2.0 * norm,
            b2: norm,
            a1: 2.0 * (k * k - 1.0) * norm,
            a2: (1.0 - k / q + k * k) * norm,
        }
    }

    fn apply(&self, samples: &[f32]) -> Vec<f32> {
        let mut filtered = vec![0.0; samples.len()];
        let mut x1 = 0.0;
        let mut x2 = 0.0;
        let mut y1 = 0.0;
        let mut y2 = 0.0;

        for (i, &sample) in samples.iter().enumerate() {
            let x0 = sample;
            let y0 = self.b0 * x0 + self.b1 * x1 + self.b2 * x2 - self.a1 * y1 - self.a2 * y2;

            filtered[i] = y0;

            x2 = x1;
            x1 = x0;
            y2 = y1;
            y1 = y0;
        }

        filtered
    }
}

/// 4th-order Butterworth band-pass realized as cascaded high-pass and
/// low-pass sections. Corner frequencies must satisfy
/// 0 < low < high < nyquist for the given rate.
pub fn band_pass(samples: &[f32], sample_rate: u32, filter: &FilterConfig) -> Result<Vec<f32>> {
    let nyquist = sample_rate as f32 / 2.0;
    if filter.low_hz <= 0.0 || filter.low_hz >= filter.high_hz || filter.high_hz >= nyquist {
        return Err(PipelineError::Filter(format!(
            "corner frequencies {}-{} Hz invalid at {} Hz sample rate",
            filter.low_hz, filter.high_hz, sample_rate
        )));
    }

    let high_pass = Biquad::high_pass(filter.low_hz, sample_rate as f32);
    let low_pass = Biquad::low_pass(filter.high_hz, sample_rate as f32);
    let filtered = low_pass.apply(&high_pass.apply(samples));

    if filtered.iter().any(|x| !x.is_finite()) {
        return Err(PipelineError::Filter(
            "filter produced non-finite output".to_string(),
        ));
    }

    Ok(filtered)
}

/// Condition a waveform for analysis. Buffers shorter than the configured
/// minimum pass through untouched, and any filtering failure falls back to
/// the unfiltered audio.
pub fn condition(waveform: &Waveform, filter: &FilterConfig) -> Waveform {
    let samples = waveform::decode_samples(&waveform.payload);
    if samples.len() < filter.min_samples {
        log::debug!(
            "conditioning skipped: {} samples is below the {}-sample minimum",
            samples.len(),
            filter.min_samples
        );
        return waveform.clone();
    }

    match band_pass(&samples, waveform.sample_rate, filter) {
        Ok(filtered) => Waveform {
            sample_rate: waveform.sample_rate,
            channels: waveform.channels,
            sample_width: waveform.sample_width,
            payload: waveform::requantize(&filtered),
        },
        Err(err) => {
            log::warn!("conditioning failed, keeping unfiltered audio: {}", err);
            waveform.clone()
        }
    }
}
