//! Error types for the capture and detection pipeline

use std::fmt;

/// Custom error type for recording and classification
#[derive(Debug, Clone)]
pub enum PipelineError {
    /// E001: Configuration or format parameters rejected at setup
    Configuration(String),
    /// E002: Finalize called on a session that never received audio
    EmptySession,
    /// E003: Accumulated audio payload is empty
    EmptyBuffer,
    /// E004: Signal conditioning failed (recoverable, falls back to unfiltered audio)
    Filter(String),
    /// E005: Classifier artifacts missing or unreadable
    ClassifierUnavailable(String),
    /// E006: Model inference failed
    Inference(String),
    /// E007: Audio file or container I/O error
    AudioFile(String),
    /// E008: Feature extraction error
    FeatureExtraction(String),
    /// E009: Background worker failed
    Worker(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Configuration(msg) => {
                write!(f, "E001: Configuration rejected - {}", msg)
            }
            PipelineError::EmptySession => {
                write!(f, "E002: No active recording - no audio data received")
            }
            PipelineError::EmptyBuffer => {
                write!(f, "E003: Recording buffer is empty")
            }
            PipelineError::Filter(msg) => {
                write!(f, "E004: Signal conditioning failed - {}", msg)
            }
            PipelineError::ClassifierUnavailable(msg) => {
                write!(f, "E005: Classifier unavailable - {}", msg)
            }
            PipelineError::Inference(msg) => {
                write!(f, "E006: Inference failed - {}", msg)
            }
            PipelineError::AudioFile(msg) => {
                write!(f, "E007: Audio file I/O error - {}", msg)
            }
            PipelineError::FeatureExtraction(msg) => {
                write!(f, "E008: Feature extraction failed - {}", msg)
            }
            PipelineError::Worker(msg) => {
                write!(f, "E009: Background worker failed - {}", msg)
            }
        }
    }
}

impl std::error::Error for PipelineError {}

// From implementations for common error types
impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::AudioFile(format!("File I/O error: {}", err))
    }
}

impl From<hound::Error> for PipelineError {
    fn from(err: hound::Error) -> Self {
        PipelineError::AudioFile(format!("WAV container error: {}", err))
    }
}

impl From<anyhow::Error> for PipelineError {
    fn from(err: anyhow::Error) -> Self {
        PipelineError::Configuration(format!("{}", err))
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
