//! Capture service: shared recording session plus the finalize worker

use crate::error::{PipelineError, Result};
use crate::sensors::{ChunkAnnotation, SensorReading};
use crate::session::{DrainedRecording, IngestAck, RecordingSession};
use crate::storage::{DetectionRow, StorageCapabilities};
use crate::{Config, FinalizeReport, Pipeline};
use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard};

/// Ingestion front end for one capture device.
///
/// Holds the process-wide [`RecordingSession`] behind a mutex, the
/// processing [`Pipeline`] and the optional storage collaborators.
/// `accept` appends under a short-lived lock; `finalize` drains under the
/// same lock and hands the CPU-bound work to the blocking pool, so chunks
/// arriving mid-finalize land in the next recording rather than being
/// dropped or double-counted.
pub struct CaptureService {
    session: Arc<Mutex<RecordingSession>>,
    pipeline: Arc<Pipeline>,
    storage: Arc<StorageCapabilities>,
}

impl CaptureService {
    /// Build the service around an already-validated pipeline, resolving
    /// storage collaborators from its configuration.
    pub fn new(pipeline: Pipeline) -> Self {
        let storage = StorageCapabilities::resolve(&pipeline.config().storage);
        Self::with_storage(pipeline, storage)
    }

    /// Build the service with explicit storage collaborators
    pub fn with_storage(pipeline: Pipeline, storage: StorageCapabilities) -> Self {
        Self {
            session: Arc::new(Mutex::new(RecordingSession::new())),
            pipeline: Arc::new(pipeline),
            storage: Arc::new(storage),
        }
    }

    pub fn config(&self) -> &Config {
        self.pipeline.config()
    }

    /// Accept one chunk with its optional annotations. Missing annotation
    /// fields resolve to their defaults (humidity 0.0, timestamp now).
    pub fn accept(&self, chunk: &[u8], annotation: ChunkAnnotation) -> IngestAck {
        let reading = annotation.into_reading(chunk.len());
        let ack = self.lock_session().accept(chunk, reading);
        log::debug!(
            "accepted chunk {} ({} bytes, {} total)",
            ack.chunk_count,
            chunk.len(),
            ack.total_bytes
        );
        ack
    }

    /// Drain the session and run assemble, condition, extract, classify
    /// and persist over the recording. The drain-and-clear happens
    /// atomically under the session lock; the rest runs on the blocking
    /// pool so ingestion is never stalled by analysis. Once the drain has
    /// happened the work runs to completion.
    pub async fn finalize(&self) -> Result<FinalizeReport> {
        let drained = self.lock_session().finalize()?;

        let pipeline = Arc::clone(&self.pipeline);
        let storage = Arc::clone(&self.storage);

        let output = tokio::task::spawn_blocking(move || {
            let DrainedRecording { payload, readings } = drained;
            let output = pipeline.process(payload, &readings)?;

            // Best-effort persistence; failures are logged inside and
            // never surface into the report.
            let row = DetectionRow {
                instrument: output.report.prediction.instrument.clone(),
                note: output.report.prediction.note.clone(),
                humidity_avg: output.report.sensor_stats.humidity_avg,
                detected_at: Utc::now(),
            };
            storage.persist(&output.wav, &readings, &row);

            Ok::<_, PipelineError>(output)
        })
        .await
        .map_err(|e| PipelineError::Worker(e.to_string()))??;

        Ok(output.report)
    }

    /// Readings accumulated since the last finalize
    pub fn sensor_history(&self) -> Vec<SensorReading> {
        self.lock_session().readings().to_vec()
    }

    /// A poisoned lock means a panic while holding the session; the
    /// session itself is plain bytes and readings, so recover the inner
    /// value rather than propagating the poison.
    fn lock_session(&self) -> MutexGuard<'_, RecordingSession> {
        self.session.lock().unwrap_or_else(|poisoned| {
            log::error!("session lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
