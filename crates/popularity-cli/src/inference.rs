//! Single-Track Inference

use crate::settings::Settings;
use crate::PipelineError;
use dataset::{ColumnKind, Record, Schema, Value, DENYLISTED_COLUMNS, TARGET_COLUMN};
use inference_engine::{LinearModel, Predictor};
use storage::ArtifactStore;
use tracing::{info, warn};

/// Lowest score printed
const MIN_SCORE: f64 = 0.0;
/// Highest score printed
const MAX_SCORE: f64 = 100.0;

/// Outcome of scoring one track
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionReport {
    pub version: String,
    pub genre: Option<String>,
    /// Score clamped to [0, 100]
    pub score: f64,
    /// Unclamped model output
    pub raw_score: f64,
}

/// Split `name=value` arguments
pub fn parse_overrides(args: &[String]) -> Result<Vec<(String, String)>, PipelineError> {
    args.iter()
        .map(|arg| match arg.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok((name.trim().to_string(), value.trim().to_string()))
            }
            _ => Err(PipelineError::InvalidOverride {
                argument: arg.clone(),
                reason: "expected <name>=<value>".to_string(),
            }),
        })
        .collect()
}

/// Replace record attributes, typing each value by its declared column kind
///
/// Only model inputs can be overridden: identifier, technical and target
/// columns are refused, as are columns unknown to `schema`.
pub fn apply_overrides(
    record: &mut Record,
    overrides: &[(String, String)],
    schema: &Schema,
) -> Result<(), PipelineError> {
    for (name, raw) in overrides {
        let argument = format!("{}={}", name, raw);
        let not_input = name == TARGET_COLUMN || DENYLISTED_COLUMNS.contains(&name.as_str());
        let kind = match schema.kind_of(name) {
            Some(ColumnKind::Identifier) => {
                return Err(PipelineError::InvalidOverride {
                    argument,
                    reason: format!("'{}' is not a model input", name),
                })
            }
            Some(_) if not_input => {
                return Err(PipelineError::InvalidOverride {
                    argument,
                    reason: format!("'{}' is not a model input", name),
                })
            }
            Some(kind) => kind,
            None => {
                return Err(PipelineError::InvalidOverride {
                    argument,
                    reason: format!("unknown attribute '{}'", name),
                })
            }
        };
        let value = Value::parse(raw, name, kind).map_err(|e| PipelineError::InvalidOverride {
            argument: argument.clone(),
            reason: e.to_string(),
        })?;
        record.insert(name.as_str(), value);
    }
    Ok(())
}

/// Clamp a raw score into the printable range, warning when it had to
pub fn clamp_score(raw: f64) -> f64 {
    let clamped = raw.clamp(MIN_SCORE, MAX_SCORE);
    if clamped != raw {
        warn!(
            "Model output {:.2} outside [{}, {}], clamped to {:.2}",
            raw, MIN_SCORE, MAX_SCORE, clamped
        );
    }
    clamped
}

/// Load the configured model version and score `record`
pub fn run_inference(
    settings: &Settings,
    store: &dyn ArtifactStore,
    record: &Record,
) -> Result<PredictionReport, PipelineError> {
    let genre = record
        .get("track_genre")
        .and_then(Value::as_text)
        .map(str::to_string);
    info!(
        "Scoring track (genre {:?}) with model version {}",
        genre, settings.version
    );

    let predictor: Predictor<LinearModel> =
        Predictor::load(store, &settings.artifact_prefix, &settings.version)?;
    let result = predictor.predict(record)?;
    info!("Raw score {:.4} in {}us", result.score, result.latency_us);

    Ok(PredictionReport {
        version: settings.version.clone(),
        genre,
        score: clamp_score(result.score),
        raw_score: result.score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::run_training;
    use dataset::{fixtures, track_schema};
    use inference_engine::InferenceError;
    use storage::MemoryArtifactStore;

    fn trained_store(settings: &Settings) -> MemoryArtifactStore {
        let store = MemoryArtifactStore::new();
        run_training(settings, &fixtures::sample_raw_tracks(), &store).unwrap();
        store
    }

    fn settings() -> Settings {
        let mut settings = Settings::default();
        settings.pipeline.test_fraction = 0.5;
        settings
    }

    #[test]
    fn test_parse_overrides() {
        let args = vec!["energy=0.3".to_string(), "explicit = true".to_string()];
        assert_eq!(
            parse_overrides(&args).unwrap(),
            vec![
                ("energy".to_string(), "0.3".to_string()),
                ("explicit".to_string(), "true".to_string())
            ]
        );
        assert!(parse_overrides(&["energy".to_string()]).is_err());
        assert!(parse_overrides(&["=1".to_string()]).is_err());
    }

    #[test]
    fn test_apply_overrides_types_by_schema() {
        let mut record = fixtures::sample_track();
        let overrides = parse_overrides(&[
            "explicit=yes".to_string(),
            "key=7".to_string(),
            "tempo=98.5".to_string(),
            "track_genre=rock".to_string(),
        ])
        .unwrap();
        apply_overrides(&mut record, &overrides, &track_schema()).unwrap();

        assert_eq!(record.get("explicit"), Some(&Value::Bool(true)));
        assert_eq!(record.get("key"), Some(&Value::Int(7)));
        assert_eq!(record.get("tempo"), Some(&Value::Float(98.5)));
        assert_eq!(record.get("track_genre"), Some(&Value::Text("rock".to_string())));
    }

    #[test]
    fn test_apply_overrides_rejects_bad_input() {
        let schema = track_schema();
        let mut record = fixtures::sample_track();
        for (name, value) in [
            ("track_id", "x"),
            ("popularity", "99"),
            ("colour", "red"),
            ("energy", "loud"),
        ] {
            let result = apply_overrides(
                &mut record,
                &[(name.to_string(), value.to_string())],
                &schema,
            );
            assert!(matches!(result, Err(PipelineError::InvalidOverride { .. })));
        }
    }

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(42.5), 42.5);
        assert_eq!(clamp_score(-3.0), 0.0);
        assert_eq!(clamp_score(130.0), 100.0);
    }

    #[test]
    fn test_train_then_predict_sample_track() {
        let settings = settings();
        let store = trained_store(&settings);

        let report = run_inference(&settings, &store, &fixtures::sample_track()).unwrap();
        assert_eq!(report.version, "v1");
        assert_eq!(report.genre.as_deref(), Some("pop"));
        assert!((MIN_SCORE..=MAX_SCORE).contains(&report.score));
        assert_eq!(report.score, clamp_score(report.raw_score));
    }

    #[test]
    fn test_unseen_genre_still_scores() {
        let settings = settings();
        let store = trained_store(&settings);
        let mut record = fixtures::sample_track();
        record.insert("track_genre", "k-pop");

        assert!(run_inference(&settings, &store, &record).unwrap().raw_score.is_finite());
    }

    #[test]
    fn test_unknown_version() {
        let settings = settings();
        let store = trained_store(&settings);
        let other = Settings {
            version: "v9".to_string(),
            ..settings
        };

        assert!(matches!(
            run_inference(&other, &store, &fixtures::sample_track()),
            Err(PipelineError::Inference(InferenceError::ArtifactNotFound(_)))
        ));
    }

    #[test]
    fn test_record_missing_feature() {
        let settings = settings();
        let store = trained_store(&settings);
        let record = Record::new().with("track_genre", "pop").with("energy", 0.5);

        assert!(matches!(
            run_inference(&settings, &store, &record),
            Err(PipelineError::Inference(InferenceError::MissingColumn(_)))
        ));
    }
}
