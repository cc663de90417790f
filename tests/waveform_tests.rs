//! Validation tests for waveform assembly and the WAV container

use notesense::config::AudioConfig;
use notesense::error::PipelineError;
use notesense::waveform::{self, Waveform};
use std::io::Cursor;

fn pcm_payload(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

fn sine_payload(freq: f32, sample_rate: u32, n_samples: usize) -> Vec<u8> {
    let samples: Vec<i16> = (0..n_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            ((2.0 * std::f32::consts::PI * freq * t).sin() * 0.5 * 32767.0) as i16
        })
        .collect();
    pcm_payload(&samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assembled_payload_equals_sum_of_chunks() {
        let audio = AudioConfig::default();
        let chunks: [&[u8]; 4] = [&[1, 2], &[3, 4, 5, 6], &[], &[7, 8]];

        let mut payload = Vec::new();
        for chunk in &chunks {
            payload.extend_from_slice(chunk);
        }
        let expected_len: usize = chunks.iter().map(|c| c.len()).sum();

        let wf = waveform::assemble(payload.clone(), &audio).unwrap();
        assert_eq!(wf.payload.len(), expected_len);
        assert_eq!(wf.payload, payload);
        assert_eq!(wf.sample_rate, audio.sample_rate);
        assert_eq!(wf.channels, audio.channels);
        assert_eq!(wf.sample_width, audio.sample_width);
    }

    #[test]
    fn test_container_header_encodes_configured_format() {
        let audio = AudioConfig::default();
        let payload = sine_payload(440.0, audio.sample_rate, 800);
        let wf = waveform::assemble(payload.clone(), &audio).unwrap();
        let bytes = waveform::encode_wav(&wf).unwrap();

        let reader = hound::WavReader::new(Cursor::new(&bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.sample_rate, audio.sample_rate);
        assert_eq!(spec.channels, audio.channels);
        assert_eq!(spec.bits_per_sample, audio.sample_width * 8);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);

        // Data section is byte-identical to the payload
        let decoded: Vec<i16> = hound::WavReader::new(Cursor::new(&bytes))
            .unwrap()
            .samples::<i16>()
            .map(|s| s.unwrap())
            .collect();
        assert_eq!(pcm_payload(&decoded), payload);
    }

    #[test]
    fn test_header_independent_of_chunk_distribution() {
        let audio = AudioConfig::default();
        let payload = sine_payload(440.0, audio.sample_rate, 333);

        // Assembly does not inspect chunk boundaries, so equal totals give
        // equal containers regardless of how the bytes arrived.
        let a = waveform::encode_wav(&waveform::assemble(payload.clone(), &audio).unwrap());
        let b = waveform::encode_wav(&waveform::assemble(payload, &audio).unwrap());
        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[test]
    fn test_assemble_rejects_unsupported_width() {
        let audio = AudioConfig {
            sample_width: 3,
            ..AudioConfig::default()
        };
        match waveform::assemble(vec![0; 6], &audio) {
            Err(PipelineError::Configuration(_)) => {}
            other => panic!("expected Configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_assemble_rejects_unsupported_channels() {
        let audio = AudioConfig {
            channels: 2,
            ..AudioConfig::default()
        };
        match waveform::assemble(vec![0; 8], &audio) {
            Err(PipelineError::Configuration(_)) => {}
            other => panic!("expected Configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_encode_is_deterministic() {
        let audio = AudioConfig::default();
        let payload = sine_payload(250.0, audio.sample_rate, 1600);
        let wf = waveform::assemble(payload, &audio).unwrap();

        let first = waveform::encode_wav(&wf).unwrap();
        let second = waveform::encode_wav(&wf).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_odd_trailing_byte_is_dropped_from_container() {
        let audio = AudioConfig::default();
        let mut payload = pcm_payload(&[100, -200, 300]);
        payload.push(0xAB); // cannot form a 16-bit sample

        let wf = waveform::assemble(payload, &audio).unwrap();
        let bytes = waveform::encode_wav(&wf).unwrap();

        let reader = hound::WavReader::new(Cursor::new(&bytes)).unwrap();
        assert_eq!(reader.len(), 3);
    }

    #[test]
    fn test_analysis_signal_matches_decoded_payload() {
        let audio = AudioConfig::default();
        let payload = pcm_payload(&[0, 16384, -16384, 32767]);
        let wf = waveform::assemble(payload, &audio).unwrap();

        // Capture and analysis rates are equal in the default deployment,
        // so the analysis signal is just the decoded payload.
        let signal = waveform::to_analysis_signal(&wf, audio.sample_rate);
        assert_eq!(signal.len(), 4);
        assert!((signal[0]).abs() < 1e-6);
        assert!((signal[1] - 0.5).abs() < 1e-4);
        assert!((signal[2] + 0.5).abs() < 1e-4);
        assert!(signal[3] > 0.99);
    }

    #[test]
    fn test_wav_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let audio = AudioConfig::default();
        let payload = sine_payload(440.0, audio.sample_rate, 1600);
        let wf = waveform::assemble(payload, &audio).unwrap();
        std::fs::write(&path, waveform::encode_wav(&wf).unwrap()).unwrap();

        let (samples, rate) = waveform::load_wav_file(&path).unwrap();
        assert_eq!(rate, audio.sample_rate);
        assert_eq!(samples.len(), 1600);

        let original = waveform::decode_samples(&wf.payload);
        for (a, b) in samples.iter().zip(&original) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_requantize_saturates_at_i16_bounds() {
        let payload = waveform::requantize(&[1.5, -1.5]);
        let values: Vec<i16> = payload
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        assert_eq!(values, vec![i16::MAX, i16::MIN]);
    }

    #[test]
    fn test_waveform_equality_is_structural() {
        let audio = AudioConfig::default();
        let a = waveform::assemble(vec![1, 2, 3, 4], &audio).unwrap();
        let b = Waveform {
            sample_rate: audio.sample_rate,
            channels: 1,
            sample_width: 2,
            payload: vec![1, 2, 3, 4],
        };
        assert_eq!(a, b);
    }
}
