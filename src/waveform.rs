//! Waveform assembly and PCM sample conversions

use crate::config::AudioConfig;
use crate::error::{PipelineError, Result};
use std::io::Cursor;
use std::path::Path;

/// Full-scale factor for 16-bit PCM
const I16_SCALE: f32 = (1i64 << 15) as f32;

/// An assembled recording: raw little-endian PCM plus the format
/// parameters it was captured with.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub sample_rate: u32,
    pub channels: u16,
    /// Bytes per sample
    pub sample_width: u16,
    pub payload: Vec<u8>,
}

/// Wrap a drained byte payload in a [`Waveform`], rejecting format
/// parameters the pipeline cannot process.
pub fn assemble(payload: Vec<u8>, audio: &AudioConfig) -> Result<Waveform> {
    if audio.sample_width != 2 {
        return Err(PipelineError::Configuration(format!(
            "sample_width {} is unsupported: expected 16-bit PCM",
            audio.sample_width
        )));
    }
    if audio.channels != 1 {
        return Err(PipelineError::Configuration(format!(
            "channels {} is unsupported: expected mono capture",
            audio.channels
        )));
    }
    Ok(Waveform {
        sample_rate: audio.sample_rate,
        channels: audio.channels,
        sample_width: audio.sample_width,
        payload,
    })
}

/// Encode a waveform as a WAV container. The header encodes exactly the
/// waveform's parameters and the data section is byte-identical to the
/// payload (a trailing odd byte, which cannot form a sample, is dropped).
pub fn encode_wav(waveform: &Waveform) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: waveform.channels,
        sample_rate: waveform.sample_rate,
        bits_per_sample: waveform.sample_width * 8,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for bytes in waveform.payload.chunks_exact(2) {
            writer.write_sample(i16::from_le_bytes([bytes[0], bytes[1]]))?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Decode a little-endian 16-bit payload into normalized f32 samples
pub fn decode_samples(payload: &[u8]) -> Vec<f32> {
    payload
        .chunks_exact(2)
        .map(|bytes| i16::from_le_bytes([bytes[0], bytes[1]]) as f32 / I16_SCALE)
        .collect()
}

/// Quantize f32 samples back to little-endian 16-bit PCM, clamping to the
/// representable range instead of wrapping around.
pub fn requantize(samples: &[f32]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let value = (sample * I16_SCALE)
            .round()
            .clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        payload.extend_from_slice(&value.to_le_bytes());
    }
    payload
}

/// Mix interleaved multi-channel samples down to mono by averaging
pub fn mixdown(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => samples
            .chunks_exact(n as usize)
            .map(|frame| frame.iter().sum::<f32>() / n as f32)
            .collect(),
    }
}

/// Linear-interpolation resample between arbitrary rates. Equal rates are
/// a no-op copy; empty input stays empty.
pub fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Vec<f32> {
    if source_rate == target_rate {
        return samples.to_vec();
    }
    if samples.is_empty() {
        return Vec::new();
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = (samples.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 / ratio;
        let idx = src_pos as usize;
        let frac = src_pos - idx as f64;

        let sample = if idx + 1 < samples.len() {
            samples[idx] as f64 * (1.0 - frac) + samples[idx + 1] as f64 * frac
        } else {
            samples[samples.len() - 1] as f64
        };
        output.push(sample as f32);
    }

    output
}

/// Decode a waveform into the mono analysis signal at `target_rate`
pub fn to_analysis_signal(waveform: &Waveform, target_rate: u32) -> Vec<f32> {
    let samples = decode_samples(&waveform.payload);
    let mono = mixdown(&samples, waveform.channels);
    resample(&mono, waveform.sample_rate, target_rate)
}

/// Load a WAV file as mono normalized samples plus its sample rate.
/// Integer formats are scaled by their bit depth; float formats pass through.
pub fn load_wav_file<P: AsRef<Path>>(path: P) -> Result<(Vec<f32>, u32)> {
    let mut reader = hound::WavReader::open(path.as_ref())?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, hound::Error>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<Vec<f32>, hound::Error>>()?
        }
    };

    Ok((mixdown(&interleaved, spec.channels), spec.sample_rate))
}
