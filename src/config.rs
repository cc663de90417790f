//! Configuration system for the capture and detection pipeline

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: String,
    pub audio: AudioConfig,
    pub analysis: AnalysisConfig,
    pub filter: FilterConfig,
    pub pitch: PitchConfig,
    pub models: ModelConfig,
    pub storage: StorageConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            audio: AudioConfig::default(),
            analysis: AnalysisConfig::default(),
            filter: FilterConfig::default(),
            pitch: PitchConfig::default(),
            models: ModelConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

/// Capture format configuration
///
/// Mirrors the deployment's audio interface: mono 16-bit PCM at 16 kHz.
/// The ingestion path rejects payloads described by anything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    /// Bytes per sample (2 = 16-bit PCM)
    pub sample_width: u16,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            channels: 1,
            sample_width: 2,
        }
    }
}

/// Spectral analysis configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Rate the analysis signal is resampled to before feature extraction
    pub sample_rate: u32,
    pub n_fft: usize,
    pub hop_length: usize,
    pub n_mfcc: usize,
    pub n_mels: usize,
    pub n_chroma: usize,
    /// Cumulative-energy fraction for the spectral rolloff descriptor
    pub rolloff_percent: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            n_fft: 2048,
            hop_length: 512,
            n_mfcc: 13,
            n_mels: 128,
            n_chroma: 12,
            rolloff_percent: 0.85,
        }
    }
}

/// Band-pass conditioning configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub low_hz: f32,
    pub high_hz: f32,
    /// Buffers shorter than this skip conditioning entirely
    pub min_samples: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            low_hz: 300.0,
            high_hz: 3400.0,
            min_samples: 50,
        }
    }
}

/// Fundamental-frequency tracking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchConfig {
    /// Lowest trackable pitch (C2)
    pub fmin_hz: f32,
    /// Highest trackable pitch (C7)
    pub fmax_hz: f32,
    pub frame_length: usize,
    pub hop_length: usize,
    /// Normalized-difference trough threshold for voicing decisions
    pub trough_threshold: f32,
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            fmin_hz: 65.41,
            fmax_hz: 2093.0,
            frame_length: 2048,
            hop_length: 512,
            trough_threshold: 0.1,
        }
    }
}

/// Classifier artifact locations
///
/// Artifacts are optional; a deployment without them still runs with
/// the deterministic pitch fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub dir: PathBuf,
    pub instrument_model: String,
    pub instrument_labels: String,
    pub note_model: String,
    pub note_labels: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./model_artifacts"),
            instrument_model: "instrument_model.json".to_string(),
            instrument_labels: "instrument_labels.json".to_string(),
            note_model: "note_model.json".to_string(),
            note_labels: "note_labels.json".to_string(),
        }
    }
}

/// Downstream persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory for stored artifacts; `None` disables persistence
    pub root: Option<PathBuf>,
    pub recordings_prefix: String,
    pub detections_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: None,
            recordings_prefix: "recordings".to_string(),
            detections_file: "detections.jsonl".to_string(),
        }
    }
}

/// Validate configuration parameters
pub fn validate_config(config: &Config) -> anyhow::Result<()> {
    if config.audio.sample_width != 2 {
        anyhow::bail!(
            "sample_width {} is unsupported: capture format is 16-bit PCM",
            config.audio.sample_width
        );
    }
    if config.audio.channels != 1 {
        anyhow::bail!(
            "channels {} is unsupported: capture format is mono",
            config.audio.channels
        );
    }
    if config.audio.sample_rate < 8000 || config.audio.sample_rate > 192000 {
        anyhow::bail!("sample_rate {} Hz is outside 8000-192000", config.audio.sample_rate);
    }
    if config.analysis.sample_rate != config.audio.sample_rate {
        anyhow::bail!(
            "analysis sample_rate {} must match capture sample_rate {}",
            config.analysis.sample_rate,
            config.audio.sample_rate
        );
    }

    if config.analysis.n_fft < 16 {
        anyhow::bail!("n_fft must be at least 16");
    }
    if config.analysis.hop_length == 0 || config.analysis.hop_length > config.analysis.n_fft {
        anyhow::bail!("hop_length must be in 1..=n_fft");
    }
    if config.analysis.n_mfcc == 0 || config.analysis.n_mfcc > config.analysis.n_mels {
        anyhow::bail!("n_mfcc must be in 1..=n_mels");
    }
    if config.analysis.n_chroma != 12 {
        anyhow::bail!("n_chroma {} is unsupported: the chroma layout is 12 pitch classes", config.analysis.n_chroma);
    }
    if config.analysis.rolloff_percent <= 0.0 || config.analysis.rolloff_percent > 1.0 {
        anyhow::bail!("rolloff_percent must be in (0, 1]");
    }

    // Out-of-range corners relative to the deployment's nyquist are handled by
    // the conditioner's fallback, not rejected here.
    if config.filter.low_hz <= 0.0 || config.filter.low_hz >= config.filter.high_hz {
        anyhow::bail!("filter corners must satisfy 0 < low_hz < high_hz");
    }

    if config.pitch.fmin_hz <= 0.0 || config.pitch.fmin_hz >= config.pitch.fmax_hz {
        anyhow::bail!("pitch range must satisfy 0 < fmin_hz < fmax_hz");
    }
    if config.pitch.frame_length < 4 || config.pitch.hop_length == 0 {
        anyhow::bail!("pitch frame_length must be >= 4 and hop_length nonzero");
    }

    Ok(())
}

/// Load configuration from JSON file
pub fn load_config<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Config> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Save configuration to JSON file
pub fn save_config<P: AsRef<std::path::Path>>(config: &Config, path: P) -> anyhow::Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
