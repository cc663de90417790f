//! Persistence seams for finished recordings

use crate::config::StorageConfig;
use crate::sensors::SensorReading;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Object store for finished artifacts (WAV container, sensor documents)
pub trait ArtifactStore: Send + Sync {
    fn put(&self, name: &str, bytes: &[u8]) -> anyhow::Result<()>;
}

/// Append-only history of classification outcomes
pub trait DetectionStore: Send + Sync {
    fn record(&self, row: &DetectionRow) -> anyhow::Result<()>;
}

/// One persisted row per finalized recording.
///
/// `humidity_avg` is the single canonical name for the persisted humidity
/// mean; no alias field is written.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionRow {
    pub instrument: String,
    pub note: String,
    pub humidity_avg: f64,
    pub detected_at: DateTime<Utc>,
}

/// Directory-backed object store
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        fs::create_dir_all(root.as_ref())?;
        Ok(Self {
            root: root.as_ref().to_path_buf(),
        })
    }
}

impl ArtifactStore for FsArtifactStore {
    fn put(&self, name: &str, bytes: &[u8]) -> anyhow::Result<()> {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
        Ok(())
    }
}

/// JSON-lines detection history
pub struct JsonlDetectionStore {
    path: PathBuf,
}

impl JsonlDetectionStore {
    pub fn new<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path: path.as_ref().to_path_buf(),
        })
    }
}

impl DetectionStore for JsonlDetectionStore {
    fn record(&self, row: &DetectionRow) -> anyhow::Result<()> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(row)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

/// Storage collaborators resolved once at startup. Whatever fails to
/// resolve stays absent for the lifetime of the process; persistence is
/// best-effort and never affects the recording result.
pub struct StorageCapabilities {
    artifacts: Option<Box<dyn ArtifactStore>>,
    detections: Option<Box<dyn DetectionStore>>,
    recordings_prefix: String,
}

impl StorageCapabilities {
    /// Resolve collaborators from configuration. An unset storage root
    /// resolves both to absent; resolution failures are logged.
    pub fn resolve(storage: &StorageConfig) -> Self {
        let Some(root) = &storage.root else {
            log::debug!("no storage root configured: recordings stay local-only");
            return Self::none();
        };

        let artifacts = match FsArtifactStore::new(root) {
            Ok(store) => Some(Box::new(store) as Box<dyn ArtifactStore>),
            Err(err) => {
                log::warn!("artifact store unavailable: {}", err);
                None
            }
        };

        let detections = match JsonlDetectionStore::new(root.join(&storage.detections_file)) {
            Ok(store) => Some(Box::new(store) as Box<dyn DetectionStore>),
            Err(err) => {
                log::warn!("detection store unavailable: {}", err);
                None
            }
        };

        Self {
            artifacts,
            detections,
            recordings_prefix: storage.recordings_prefix.clone(),
        }
    }

    /// Both collaborators absent
    pub fn none() -> Self {
        Self {
            artifacts: None,
            detections: None,
            recordings_prefix: StorageConfig::default().recordings_prefix,
        }
    }

    /// Build from explicit implementations (tests, alternative backends)
    pub fn new(
        artifacts: Option<Box<dyn ArtifactStore>>,
        detections: Option<Box<dyn DetectionStore>>,
        recordings_prefix: String,
    ) -> Self {
        Self {
            artifacts,
            detections,
            recordings_prefix,
        }
    }

    /// Persist the encoded container, the sensor document and the
    /// detection row. Every failure is logged and swallowed.
    pub fn persist(&self, wav: &[u8], readings: &[SensorReading], row: &DetectionRow) {
        if let Some(store) = &self.artifacts {
            let stamp = Utc::now().format("%Y%m%d_%H%M%S");

            let wav_name = format!("{}/recording_{}.wav", self.recordings_prefix, stamp);
            if let Err(err) = store.put(&wav_name, wav) {
                log::error!("artifact upload failed for {}: {}", wav_name, err);
            }

            match serde_json::to_vec_pretty(readings) {
                Ok(document) => {
                    let doc_name = format!("{}/readings_{}.json", self.recordings_prefix, stamp);
                    if let Err(err) = store.put(&doc_name, &document) {
                        log::error!("sensor document upload failed for {}: {}", doc_name, err);
                    }
                }
                Err(err) => log::error!("sensor document serialization failed: {}", err),
            }
        }

        if let Some(store) = &self.detections {
            if let Err(err) = store.record(row) {
                log::error!("detection row append failed: {}", err);
            }
        }
    }
}
