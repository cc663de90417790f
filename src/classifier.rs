//! Instrument and note classification with a deterministic pitch fallback

use crate::config::ModelConfig;
use crate::error::{PipelineError, Result};
use crate::features;
use crate::pitch;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Label reported when no model and no fallback can produce a better one
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Classification outcome. Failures degrade into the label fields rather
/// than failing the recording; `error` carries the last inference failure
/// for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub instrument: String,
    pub note: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Nearest-centroid model artifact: one centroid per class, all the same
/// width as the extracted feature vector.
#[derive(Debug, Clone, Deserialize)]
pub struct CentroidModel {
    pub centroids: Vec<Vec<f32>>,
}

/// Class-index to label mapping produced by the offline training step
#[derive(Debug, Clone, Deserialize)]
pub struct LabelDecoder {
    pub labels: Vec<String>,
}

#[derive(Debug, Clone)]
struct ModelBundle {
    model: CentroidModel,
    decoder: LabelDecoder,
}

/// Loaded classifier capabilities. Either bundle may be absent; that is an
/// expected deployment state, not an error.
pub struct Classifier {
    instrument: Option<ModelBundle>,
    note: Option<ModelBundle>,
}

impl Classifier {
    /// Load whatever artifacts exist under the configured directory.
    /// Missing or unreadable artifacts degrade to an absent bundle.
    pub fn load(models: &ModelConfig) -> Self {
        let instrument = load_bundle(
            &models.dir.join(&models.instrument_model),
            &models.dir.join(&models.instrument_labels),
            "instrument",
        );
        let note = load_bundle(
            &models.dir.join(&models.note_model),
            &models.dir.join(&models.note_labels),
            "note",
        );

        if instrument.is_none() && note.is_none() {
            log::warn!(
                "no model artifacts under {}: predictions fall back to {} and pitch naming",
                models.dir.display(),
                UNKNOWN_LABEL
            );
        }

        Self { instrument, note }
    }

    /// True when at least one model bundle loaded
    pub fn has_models(&self) -> bool {
        self.instrument.is_some() || self.note.is_some()
    }

    /// Classify a feature vector. Each label degrades independently: an
    /// instrument failure never blocks the note prediction, and a note
    /// failure falls back to naming the tracked fundamental.
    pub fn predict(&self, features: &[f32]) -> ClassificationResult {
        let mut result = ClassificationResult {
            instrument: UNKNOWN_LABEL.to_string(),
            note: UNKNOWN_LABEL.to_string(),
            error: None,
        };

        match &self.instrument {
            Some(bundle) => match infer(bundle, features) {
                Ok(label) => result.instrument = label,
                Err(err) => {
                    log::warn!("instrument inference failed: {}", err);
                    result.error = Some(err.to_string());
                }
            },
            None => log::debug!("instrument model not loaded"),
        }

        if let Some(bundle) = &self.note {
            match infer(bundle, features) {
                Ok(label) => {
                    result.note = label;
                    return result;
                }
                Err(err) => {
                    log::warn!("note inference failed, falling back to pitch naming: {}", err);
                    result.error = Some(err.to_string());
                }
            }
        }

        result.note = pitch::hz_to_note_name(features::f0_mean(features));
        result
    }
}

fn load_bundle(model_path: &Path, labels_path: &Path, kind: &str) -> Option<ModelBundle> {
    if !model_path.exists() || !labels_path.exists() {
        log::debug!("{} model artifacts not present", kind);
        return None;
    }

    match read_bundle(model_path, labels_path) {
        Ok(bundle) => {
            log::info!(
                "loaded {} model with {} classes",
                kind,
                bundle.decoder.labels.len()
            );
            Some(bundle)
        }
        Err(err) => {
            log::error!("failed to load {} model artifacts: {}", kind, err);
            None
        }
    }
}

fn read_bundle(model_path: &Path, labels_path: &Path) -> Result<ModelBundle> {
    let model_text = std::fs::read_to_string(model_path).map_err(|e| {
        PipelineError::ClassifierUnavailable(format!("read {}: {}", model_path.display(), e))
    })?;
    let model: CentroidModel = serde_json::from_str(&model_text).map_err(|e| {
        PipelineError::ClassifierUnavailable(format!("parse {}: {}", model_path.display(), e))
    })?;

    let labels_text = std::fs::read_to_string(labels_path).map_err(|e| {
        PipelineError::ClassifierUnavailable(format!("read {}: {}", labels_path.display(), e))
    })?;
    let decoder: LabelDecoder = serde_json::from_str(&labels_text).map_err(|e| {
        PipelineError::ClassifierUnavailable(format!("parse {}: {}", labels_path.display(), e))
    })?;

    if model.centroids.is_empty() {
        return Err(PipelineError::ClassifierUnavailable(format!(
            "{} defines no classes",
            model_path.display()
        )));
    }
    if model.centroids.len() != decoder.labels.len() {
        return Err(PipelineError::ClassifierUnavailable(format!(
            "model and decoder class counts disagree ({} vs {})",
            model.centroids.len(),
            decoder.labels.len()
        )));
    }

    Ok(ModelBundle { model, decoder })
}

/// Nearest centroid by squared Euclidean distance
fn infer(bundle: &ModelBundle, features: &[f32]) -> Result<String> {
    let mut best: Option<(usize, f32)> = None;

    for (idx, centroid) in bundle.model.centroids.iter().enumerate() {
        if centroid.len() != features.len() {
            return Err(PipelineError::Inference(format!(
                "feature length {} does not match model width {}",
                features.len(),
                centroid.len()
            )));
        }
        let dist: f32 = centroid
            .iter()
            .zip(features)
            .map(|(&c, &x)| (c - x) * (c - x))
            .sum();
        if best.map_or(true, |(_, d)| dist < d) {
            best = Some((idx, dist));
        }
    }

    let (idx, _) = best.ok_or_else(|| PipelineError::Inference("model has no classes".to_string()))?;
    bundle
        .decoder
        .labels
        .get(idx)
        .cloned()
        .ok_or_else(|| PipelineError::Inference(format!("class index {} has no label", idx)))
}
