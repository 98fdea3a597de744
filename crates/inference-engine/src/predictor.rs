//! Prediction Adapter

use crate::model::Regressor;
use crate::InferenceError;
use dataset::{ObservabilitySink, Record, Value};
use feature_engine::FittedTransformState;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use storage::{artifact_key, load_artifact, save_artifact, ArtifactKind, ArtifactStore};
use tracing::{debug, error, info, warn};

/// Stored model plus the fingerprint of the preprocessor it was trained on
#[derive(Serialize, Deserialize)]
struct StoredModel<M> {
    preprocessor_fingerprint: String,
    model: M,
}

/// Result of a single prediction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InferenceResult {
    /// Raw model output, not clamped
    pub score: f64,
    /// Transform plus scoring latency in microseconds
    pub latency_us: u64,
}

/// Where a saved model/preprocessor pair landed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleLocations {
    pub model: String,
    pub preprocessor: String,
}

/// Score one record against a fitted state and model
///
/// Column presence is checked against the columns recorded in `state`, not
/// against the record's own ordering. Extra record fields are ignored.
pub fn predict<M: Regressor + ?Sized>(
    record: &Record,
    state: &FittedTransformState,
    model: &M,
) -> Result<f64, InferenceError> {
    if let Some(column) = state.first_missing_column(|name| record.contains(name)) {
        warn!("Record lacks column '{}'", column);
        return Err(InferenceError::MissingColumn(column.to_string()));
    }
    if model.n_features() != state.n_features() {
        return Err(InferenceError::InvalidInputShape {
            expected: model.n_features(),
            actual: state.n_features(),
        });
    }
    for (column, level) in unseen_levels(record, state) {
        warn!(
            "Level '{}' of '{}' unseen during fit, encoded as all zeros",
            level, column
        );
    }

    let features = state.transform_record(record)?;
    Ok(model.predict_row(features.view()))
}

/// Categorical `(column, level)` pairs in `record` that the fitted encoders never saw
pub fn unseen_levels<'a>(
    record: &'a Record,
    state: &'a FittedTransformState,
) -> Vec<(&'a str, &'a str)> {
    state
        .categorical_transforms()
        .iter()
        .filter_map(|t| {
            let level = record.get(t.column()).and_then(Value::as_text)?;
            (!t.knows(level)).then_some((t.column(), level))
        })
        .collect()
}

/// Persist a model together with the state it was trained against
///
/// If the model write fails, the preprocessor under the same version is put
/// back the way it was, so the pair on disk always matches.
pub fn save_bundle<M: Serialize>(
    store: &dyn ArtifactStore,
    prefix: &str,
    version: &str,
    state: &FittedTransformState,
    model: &M,
) -> Result<BundleLocations, InferenceError> {
    let fingerprint = state
        .fingerprint()
        .map_err(InferenceError::IncompatibleRecord)?;

    let preprocessor_key = artifact_key(prefix, ArtifactKind::Preprocessor, version);
    let previous = if store.contains(&preprocessor_key) {
        Some(store.load(&preprocessor_key)?)
    } else {
        None
    };
    let preprocessor = save_artifact(store, &preprocessor_key, state)?;

    let model_key = artifact_key(prefix, ArtifactKind::Model, version);
    let stored = StoredModel {
        preprocessor_fingerprint: fingerprint,
        model,
    };
    let model_location = match save_artifact(store, &model_key, &stored) {
        Ok(location) => location,
        Err(e) => {
            warn!("Saving {} failed, rolling back {}", model_key, preprocessor_key);
            let restored = match &previous {
                Some(bytes) => store.save(&preprocessor_key, bytes).map(|_| ()),
                None => store.remove(&preprocessor_key).map(|_| ()),
            };
            if let Err(rollback) = restored {
                error!("Rollback of {} failed: {}", preprocessor_key, rollback);
            }
            return Err(e.into());
        }
    };

    info!("Saved model to {}", model_location);
    info!("Saved preprocessor to {}", preprocessor);
    Ok(BundleLocations {
        model: model_location,
        preprocessor,
    })
}

/// Loaded state and model, shared read-only across callers
pub struct Predictor<M> {
    state: FittedTransformState,
    model: M,
    sink: ObservabilitySink,
}

impl<M: Regressor> Predictor<M> {
    /// Pair a state with a model of matching width
    pub fn new(state: FittedTransformState, model: M) -> Result<Self, InferenceError> {
        if model.n_features() != state.n_features() {
            return Err(InferenceError::InvalidInputShape {
                expected: model.n_features(),
                actual: state.n_features(),
            });
        }
        Ok(Self {
            state,
            model,
            sink: ObservabilitySink::ambient(),
        })
    }

    /// Route this predictor's logs to `sink`
    pub fn with_sink(mut self, sink: ObservabilitySink) -> Self {
        self.sink = sink;
        self
    }

    pub fn state(&self) -> &FittedTransformState {
        &self.state
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Transform and score one record
    pub fn predict(&self, record: &Record) -> Result<InferenceResult, InferenceError> {
        self.sink.in_scope(|| {
            let start = Instant::now();
            let score = predict(record, &self.state, &self.model)?;
            let latency_us = start.elapsed().as_micros() as u64;
            debug!("Inference completed in {}us", latency_us);
            Ok(InferenceResult { score, latency_us })
        })
    }
}

impl<M: Regressor + DeserializeOwned> Predictor<M> {
    /// Load the `<prefix>-model_<version>` / `<prefix>-preprocessor_<version>` pair
    pub fn load(
        store: &dyn ArtifactStore,
        prefix: &str,
        version: &str,
    ) -> Result<Self, InferenceError> {
        let model_key = artifact_key(prefix, ArtifactKind::Model, version);
        let preprocessor_key = artifact_key(prefix, ArtifactKind::Preprocessor, version);
        info!("Loading model {} and preprocessor {}", model_key, preprocessor_key);

        let stored: StoredModel<M> = load_artifact(store, &model_key)?;
        let state: FittedTransformState = load_artifact(store, &preprocessor_key)?;

        let actual = state
            .fingerprint()
            .map_err(InferenceError::IncompatibleRecord)?;
        if actual != stored.preprocessor_fingerprint {
            warn!(
                "Preprocessor {} does not match model {}",
                preprocessor_key, model_key
            );
            return Err(InferenceError::ArtifactMismatch {
                expected: stored.preprocessor_fingerprint,
                actual,
            });
        }

        Self::new(state, stored.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LinearModel, TrainingConfig};
    use dataset::{ColumnKind, Dataset, Schema, Value};
    use feature_engine::{FeaturePipeline, PipelineConfig, Preprocessor};
    use storage::{FileArtifactStore, MemoryArtifactStore, StorageError};

    /// Memory store whose model writes always fail
    struct FailingModelStore {
        inner: MemoryArtifactStore,
    }

    impl ArtifactStore for FailingModelStore {
        fn save(&self, key: &str, bytes: &[u8]) -> Result<String, StorageError> {
            if key.contains("-model_") {
                return Err(StorageError::Io {
                    path: key.to_string(),
                    message: "disk full".to_string(),
                });
            }
            self.inner.save(key, bytes)
        }

        fn load(&self, key: &str) -> Result<Vec<u8>, StorageError> {
            self.inner.load(key)
        }

        fn contains(&self, key: &str) -> bool {
            self.inner.contains(key)
        }

        fn remove(&self, key: &str) -> Result<bool, StorageError> {
            self.inner.remove(key)
        }
    }

    fn clean_tracks() -> Dataset {
        let schema = Schema::from_pairs(&[
            ("popularity", ColumnKind::Numeric),
            ("danceability", ColumnKind::Numeric),
            ("energy", ColumnKind::Numeric),
            ("explicit", ColumnKind::Numeric),
            ("track_genre", ColumnKind::Categorical),
        ]);
        let rows = [
            (73, 0.676, 0.461, 0, "acoustic"),
            (55, 0.420, 0.166, 0, "acoustic"),
            (57, 0.438, 0.359, 0, "pop"),
            (71, 0.266, 0.059, 1, "rock"),
            (82, 0.618, 0.443, 0, "pop"),
            (60, 0.688, 0.481, 1, "rock"),
            (48, 0.407, 0.147, 0, "acoustic"),
            (66, 0.703, 0.444, 0, "pop"),
        ];
        Dataset::from_rows(
            schema,
            rows.iter()
                .map(|&(p, d, e, x, g)| {
                    vec![Value::Int(p), d.into(), e.into(), Value::Int(x), g.into()]
                })
                .collect(),
        )
        .unwrap()
    }

    fn trained() -> (FittedTransformState, LinearModel) {
        let mut pipeline = FeaturePipeline::new(PipelineConfig {
            test_fraction: 0.25,
            ..PipelineConfig::default()
        })
        .with_sink(ObservabilitySink::silent());
        let split = pipeline.fit_transform(&clean_tracks()).unwrap();
        let model = LinearModel::fit(&split.x_train, &split.y_train, &TrainingConfig::default())
            .unwrap();
        (pipeline.into_state().unwrap(), model)
    }

    fn query() -> Record {
        Record::new()
            .with("danceability", 0.5)
            .with("energy", 0.3)
            .with("explicit", 0i64)
            .with("track_genre", "pop")
    }

    #[test]
    fn test_predict_matches_batch_path() {
        let (state, model) = trained();
        let data = clean_tracks();
        let batch = model.predict(&state.transform(&data).unwrap());

        for i in 0..data.n_rows() {
            let record = data.record(i).unwrap();
            let single = predict(&record, &state, &model).unwrap();
            assert_eq!(single.to_bits(), batch[i].to_bits());
        }
    }

    #[test]
    fn test_missing_column() {
        let (state, model) = trained();
        let record = Record::new().with("danceability", 0.5).with("track_genre", "pop");
        assert_eq!(
            predict(&record, &state, &model),
            Err(InferenceError::MissingColumn("energy".to_string()))
        );
    }

    #[test]
    fn test_wrong_kind_is_incompatible_record() {
        let (state, model) = trained();
        let mut record = query();
        record.insert("energy", "loud");
        assert!(matches!(
            predict(&record, &state, &model),
            Err(InferenceError::IncompatibleRecord(_))
        ));
    }

    #[test]
    fn test_unknown_genre_scores() {
        let (state, model) = trained();
        let mut record = query();
        record.insert("track_genre", "k-pop");
        assert!(predict(&record, &state, &model).unwrap().is_finite());
        assert_eq!(unseen_levels(&record, &state), vec![("track_genre", "k-pop")]);
        assert!(unseen_levels(&query(), &state).is_empty());
    }

    #[test]
    fn test_width_mismatch() {
        let (state, _) = trained();
        let narrow = LinearModel::new(vec![1.0], 0.0);
        assert!(matches!(
            Predictor::new(state.clone(), narrow.clone()),
            Err(InferenceError::InvalidInputShape { expected: 1, .. })
        ));
        assert!(matches!(
            predict(&query(), &state, &narrow),
            Err(InferenceError::InvalidInputShape { .. })
        ));
    }

    #[test]
    fn test_shared_across_threads() {
        let (state, model) = trained();
        let predictor = Predictor::new(state, model)
            .unwrap()
            .with_sink(ObservabilitySink::silent());
        let record = query();
        let expected = predictor.predict(&record).unwrap().score;

        let scores: Vec<f64> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| predictor.predict(&record).unwrap().score))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(scores.iter().all(|s| s.to_bits() == expected.to_bits()));
    }

    #[test]
    fn test_bundle_round_trip() {
        let (state, model) = trained();
        let dir = tempfile::tempdir().unwrap();
        let store = FileArtifactStore::new(dir.path()).unwrap();

        let locations = save_bundle(&store, "spotify", "v1", &state, &model).unwrap();
        assert!(locations.model.ends_with("spotify-model_v1.bin"));
        assert!(locations.preprocessor.ends_with("spotify-preprocessor_v1.bin"));

        let loaded: Predictor<LinearModel> = Predictor::load(&store, "spotify", "v1").unwrap();
        assert_eq!(loaded.state(), &state);
        assert_eq!(
            loaded.predict(&query()).unwrap().score.to_bits(),
            predict(&query(), &state, &model).unwrap().to_bits()
        );
    }

    #[test]
    fn test_missing_artifacts() {
        let store = MemoryArtifactStore::new();
        let result = Predictor::<LinearModel>::load(&store, "spotify", "v404");
        assert!(matches!(result, Err(InferenceError::ArtifactNotFound(k)) if k == "spotify-model_v404"));
    }

    #[test]
    fn test_mismatched_pair_rejected() {
        let (state, model) = trained();
        let store = MemoryArtifactStore::new();
        save_bundle(&store, "spotify", "v1", &state, &model).unwrap();

        // Overwrite the preprocessor with one from a different fit run
        let mut other = FeaturePipeline::new(PipelineConfig {
            test_fraction: 0.5,
            seed: 7,
            ..PipelineConfig::default()
        })
        .with_sink(ObservabilitySink::silent());
        other.fit_transform(&clean_tracks()).unwrap();
        let other_state = other.into_state().unwrap();
        assert_ne!(other_state.fingerprint().unwrap(), state.fingerprint().unwrap());
        save_artifact(&store, "spotify-preprocessor_v1", &other_state).unwrap();

        assert!(matches!(
            Predictor::<LinearModel>::load(&store, "spotify", "v1"),
            Err(InferenceError::ArtifactMismatch { .. })
        ));
    }

    #[test]
    fn test_failed_model_write_leaves_no_orphan() {
        let (state, model) = trained();
        let store = FailingModelStore {
            inner: MemoryArtifactStore::new(),
        };
        let result = save_bundle(&store, "spotify", "v1", &state, &model);
        assert!(matches!(result, Err(InferenceError::Storage(_))));
        assert!(!store.contains("spotify-preprocessor_v1"));
        assert!(store.inner.is_empty());
    }

    #[test]
    fn test_failed_model_write_restores_previous_pair() {
        let (state, model) = trained();
        let inner = MemoryArtifactStore::new();
        save_bundle(&inner, "spotify", "v1", &state, &model).unwrap();

        let mut other = FeaturePipeline::new(PipelineConfig {
            test_fraction: 0.5,
            seed: 7,
            ..PipelineConfig::default()
        })
        .with_sink(ObservabilitySink::silent());
        other.fit_transform(&clean_tracks()).unwrap();
        let other_state = other.into_state().unwrap();

        let store = FailingModelStore { inner };
        assert!(save_bundle(&store, "spotify", "v1", &other_state, &model).is_err());

        let loaded: Predictor<LinearModel> =
            Predictor::load(&store.inner, "spotify", "v1").unwrap();
        assert_eq!(loaded.state(), &state);
    }
}
