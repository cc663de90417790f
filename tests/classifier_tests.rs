//! Classifier loading and per-label degradation tests

use notesense::classifier::{Classifier, UNKNOWN_LABEL};
use notesense::config::{AnalysisConfig, ModelConfig};
use notesense::features;
use std::path::Path;
use tempfile::TempDir;

fn feature_width() -> usize {
    features::feature_len(&AnalysisConfig::default())
}

/// Zero feature vector with only the fundamental-frequency mean set
fn feature_vec(f0: f32) -> Vec<f32> {
    let mut v = vec![0.0f32; feature_width()];
    let len = v.len();
    v[len - 2] = f0;
    v
}

fn models_in(dir: &Path) -> ModelConfig {
    ModelConfig {
        dir: dir.to_path_buf(),
        ..ModelConfig::default()
    }
}

fn write_json(path: &Path, value: &serde_json::Value) {
    std::fs::write(path, serde_json::to_string(value).unwrap()).unwrap();
}

fn write_model(dir: &Path, name: &str, centroids: &[Vec<f32>]) {
    write_json(&dir.join(name), &serde_json::json!({ "centroids": centroids }));
}

fn write_labels(dir: &Path, name: &str, labels: &[&str]) {
    write_json(&dir.join(name), &serde_json::json!({ "labels": labels }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_artifacts_degrades_to_unknown() {
        let dir = TempDir::new().unwrap();
        let classifier = Classifier::load(&models_in(dir.path()));

        assert!(!classifier.has_models());
        let result = classifier.predict(&feature_vec(0.0));
        assert_eq!(result.instrument, UNKNOWN_LABEL);
        assert_eq!(result.note, UNKNOWN_LABEL);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_pitch_fallback_names_the_fundamental() {
        let dir = TempDir::new().unwrap();
        let classifier = Classifier::load(&models_in(dir.path()));

        assert_eq!(classifier.predict(&feature_vec(440.0)).note, "A4");
        assert_eq!(classifier.predict(&feature_vec(261.63)).note, "C4");
        assert_eq!(classifier.predict(&feature_vec(65.41)).note, "C2");
    }

    #[test]
    fn test_nearest_centroid_decodes_instrument() {
        let dir = TempDir::new().unwrap();
        let width = feature_width();
        write_model(
            dir.path(),
            "instrument_model.json",
            &[vec![0.0; width], vec![1.0; width]],
        );
        write_labels(dir.path(), "instrument_labels.json", &["Guitar", "Piano"]);

        let classifier = Classifier::load(&models_in(dir.path()));
        assert!(classifier.has_models());

        let mut near_ones = vec![0.9f32; width];
        let len = near_ones.len();
        near_ones[len - 2] = 0.0;

        assert_eq!(classifier.predict(&vec![0.1; width]).instrument, "Guitar");
        assert_eq!(classifier.predict(&near_ones).instrument, "Piano");
    }

    #[test]
    fn test_note_model_takes_precedence_over_fallback() {
        let dir = TempDir::new().unwrap();
        let width = feature_width();
        write_model(dir.path(), "note_model.json", &[vec![0.0; width]]);
        write_labels(dir.path(), "note_labels.json", &["C3"]);

        let classifier = Classifier::load(&models_in(dir.path()));
        // The fallback would say A4; the loaded model wins
        let result = classifier.predict(&feature_vec(440.0));
        assert_eq!(result.note, "C3");
        assert!(result.error.is_none());
    }

    #[test]
    fn test_width_mismatch_degrades_per_label() {
        let dir = TempDir::new().unwrap();
        let width = feature_width();
        write_model(
            dir.path(),
            "instrument_model.json",
            &[vec![0.0; width], vec![1.0; width]],
        );
        write_labels(dir.path(), "instrument_labels.json", &["Guitar", "Piano"]);
        // Trained against a different layout: every inference fails
        write_model(dir.path(), "note_model.json", &[vec![0.0; 10]]);
        write_labels(dir.path(), "note_labels.json", &["C3"]);

        let classifier = Classifier::load(&models_in(dir.path()));
        let result = classifier.predict(&feature_vec(440.0));

        assert_eq!(result.instrument, "Guitar");
        assert_eq!(result.note, "A4");
        assert!(result.error.is_some());
    }

    #[test]
    fn test_malformed_artifact_is_absent_not_fatal() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("instrument_model.json"), "not json").unwrap();
        write_labels(dir.path(), "instrument_labels.json", &["Guitar"]);

        let classifier = Classifier::load(&models_in(dir.path()));
        assert!(!classifier.has_models());
        assert_eq!(classifier.predict(&feature_vec(0.0)).instrument, UNKNOWN_LABEL);
    }

    #[test]
    fn test_class_count_mismatch_is_absent() {
        let dir = TempDir::new().unwrap();
        let width = feature_width();
        write_model(
            dir.path(),
            "instrument_model.json",
            &[vec![0.0; width], vec![1.0; width]],
        );
        write_labels(dir.path(), "instrument_labels.json", &["OnlyOne"]);

        let classifier = Classifier::load(&models_in(dir.path()));
        assert!(!classifier.has_models());
    }

    #[test]
    fn test_model_without_labels_is_absent() {
        let dir = TempDir::new().unwrap();
        write_model(dir.path(), "note_model.json", &[vec![0.0; feature_width()]]);

        let classifier = Classifier::load(&models_in(dir.path()));
        assert!(!classifier.has_models());
        // Fallback still names the pitch
        assert_eq!(classifier.predict(&feature_vec(440.0)).note, "A4");
    }

    #[test]
    fn test_equidistant_centroids_pick_the_first_class() {
        let dir = TempDir::new().unwrap();
        let width = feature_width();
        write_model(
            dir.path(),
            "instrument_model.json",
            &[vec![0.5; width], vec![0.5; width]],
        );
        write_labels(dir.path(), "instrument_labels.json", &["First", "Second"]);

        let classifier = Classifier::load(&models_in(dir.path()));
        assert_eq!(classifier.predict(&vec![0.5; width]).instrument, "First");
    }
}
