//! Live Instrument and Note Detection
//!
//! Assembles streamed PCM chunks into a recording, conditions the signal
//! with a band-pass filter, extracts a fixed-layout acoustic feature
//! vector, and classifies the recording into an instrument and a note.

pub mod classifier;
pub mod conditioner;
pub mod config;
pub mod error;
pub mod features;
pub mod pitch;
pub mod sensors;
pub mod service;
pub mod session;
pub mod spectral;
pub mod storage;
pub mod waveform;

pub use classifier::{ClassificationResult, Classifier};
pub use config::Config;
pub use error::{PipelineError, Result};
pub use sensors::{SensorReading, SensorStats};
pub use service::CaptureService;
pub use session::{IngestAck, RecordingSession};

use serde::Serialize;

/// Result of one finalized recording
#[derive(Debug, Clone, Serialize)]
pub struct FinalizeReport {
    pub status: String,
    /// Raw payload size in bytes, before conditioning
    pub audio_size: usize,
    pub sensor_stats: SensorStats,
    pub prediction: ClassificationResult,
}

/// One pipeline run: the report plus the encoded WAV container for
/// downstream persistence
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub report: FinalizeReport,
    pub wav: Vec<u8>,
}

/// Processing pipeline invoked at finalize time
pub struct Pipeline {
    config: Config,
    classifier: Classifier,
}

impl Pipeline {
    /// Validate the configuration and load model artifacts once.
    /// Configuration problems are the only fatal setup failures; missing
    /// models are not.
    pub fn new(config: Config) -> Result<Self> {
        config::validate_config(&config)
            .map_err(|e| PipelineError::Configuration(e.to_string()))?;
        let classifier = Classifier::load(&config.models);
        Ok(Self { config, classifier })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run assemble, condition, extract and classify over a drained
    /// payload, and aggregate its sensor readings.
    pub fn process(&self, payload: Vec<u8>, readings: &[SensorReading]) -> Result<PipelineOutput> {
        let audio_size = payload.len();

        let raw = waveform::assemble(payload, &self.config.audio)?;
        let conditioned = conditioner::condition(&raw, &self.config.filter);
        let wav = waveform::encode_wav(&conditioned)?;

        let signal = waveform::to_analysis_signal(&conditioned, self.config.analysis.sample_rate);
        let features = features::extract(
            &signal,
            self.config.analysis.sample_rate,
            &self.config.analysis,
            &self.config.pitch,
        );
        let prediction = self.classifier.predict(&features);
        let sensor_stats = sensors::aggregate(readings);

        log::info!(
            "processed {} bytes: instrument={} note={}",
            audio_size,
            prediction.instrument,
            prediction.note
        );

        Ok(PipelineOutput {
            report: FinalizeReport {
                status: "ok".to_string(),
                audio_size,
                sensor_stats,
                prediction,
            },
            wav,
        })
    }
}
