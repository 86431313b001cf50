//! Loading and validation of the fitted transformer set and classifier.

use crate::assets::classifier::{Classifier, OnnxClassifier};
use crate::assets::transformers::{
    KnnImputer, OneHotEncoder, OrdinalEncoder, PcaReducer, StandardScaler,
};
use crate::error::AssetLoadError;
use crate::features::RiskFlag;
use crate::schema;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::info;

/// Artifact filenames, fixed per deployment.
const KNN_IMPUTER_FILE: &str = "knn_imputer.json";
const STANDARD_SCALER_FILE: &str = "standard_scaler.json";
const ORDINAL_ENCODER_FILE: &str = "ordinal_encoder.json";
const ONE_HOT_ENCODER_FILE: &str = "one_hot_encoder.json";
const PCA_FILE: &str = "pca_90_variance.json";
const CLASSIFIER_FILE: &str = "disease_lgbm.onnx";
/// Optional sidecar: exact final feature-name order used before reduction.
const FINAL_FEATURES_FILE: &str = "final_features.json";

/// All six fitted artifacts plus the optional final-feature sidecar.
///
/// Constructed once at startup and shared read-only across requests;
/// construction fails rather than producing a partially-loaded store.
pub struct AssetStore {
    pub imputer: KnnImputer,
    pub scaler: StandardScaler,
    pub ordinal: OrdinalEncoder,
    pub one_hot: OneHotEncoder,
    pub reducer: PcaReducer,
    pub classifier: Box<dyn Classifier>,
    pub final_features: Option<Vec<String>>,
}

impl std::fmt::Debug for AssetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetStore").finish_non_exhaustive()
    }
}

impl AssetStore {
    /// Load every artifact from `dir` by fixed filename and validate the
    /// recorded fit-time column orders against the schema.
    pub fn load<P: AsRef<Path>>(dir: P, onnx_threads: usize) -> Result<Self, AssetLoadError> {
        let dir = dir.as_ref();
        info!(dir = %dir.display(), "Loading model and preprocessor assets");

        let imputer: KnnImputer = load_json(&dir.join(KNN_IMPUTER_FILE))?;
        let scaler: StandardScaler = load_json(&dir.join(STANDARD_SCALER_FILE))?;
        let ordinal: OrdinalEncoder = load_json(&dir.join(ORDINAL_ENCODER_FILE))?;
        let one_hot: OneHotEncoder = load_json(&dir.join(ONE_HOT_ENCODER_FILE))?;
        let reducer: PcaReducer = load_json(&dir.join(PCA_FILE))?;

        let classifier_path = dir.join(CLASSIFIER_FILE);
        let classifier = OnnxClassifier::load(&classifier_path, onnx_threads).map_err(|e| {
            AssetLoadError::Classifier {
                path: classifier_path,
                message: format!("{e:#}"),
            }
        })?;

        // The sidecar is optional; a present-but-corrupt file is still fatal.
        let sidecar_path = dir.join(FINAL_FEATURES_FILE);
        let final_features: Option<Vec<String>> = if sidecar_path.exists() {
            Some(load_json(&sidecar_path)?)
        } else {
            None
        };

        let store = Self::from_parts(
            imputer,
            scaler,
            ordinal,
            one_hot,
            reducer,
            Box::new(classifier),
            final_features,
        )?;

        info!(
            final_features = store.final_features.as_ref().map(|f| f.len()),
            reduced_dim = store.reducer.n_components(),
            "All assets loaded successfully"
        );
        Ok(store)
    }

    /// Assemble and validate a store from already-deserialized parts.
    pub fn from_parts(
        imputer: KnnImputer,
        scaler: StandardScaler,
        ordinal: OrdinalEncoder,
        one_hot: OneHotEncoder,
        reducer: PcaReducer,
        classifier: Box<dyn Classifier>,
        final_features: Option<Vec<String>>,
    ) -> Result<Self, AssetLoadError> {
        check_columns("KNN imputer", &schema::KNN_IMPUTE_COLS, &imputer.columns)?;
        check_columns("standard scaler", &schema::NUM_COLS, &scaler.columns)?;
        check_columns("ordinal encoder", &schema::ORDINAL_COLS, &ordinal.columns)?;
        check_columns("one-hot encoder", &schema::CAT_COLS, &one_hot.columns)?;

        // A ragged encoder artifact (fewer vocabularies than fit columns)
        // would index out of bounds at encode time.
        if ordinal.categories.len() != ordinal.columns.len() {
            return Err(AssetLoadError::Dimension {
                transformer: "ordinal encoder",
                expected: ordinal.columns.len(),
                found: ordinal.categories.len(),
            });
        }
        if one_hot.categories.len() != one_hot.columns.len() {
            return Err(AssetLoadError::Dimension {
                transformer: "one-hot encoder",
                expected: one_hot.columns.len(),
                found: one_hot.categories.len(),
            });
        }

        if scaler.mean.len() != scaler.columns.len() || scaler.scale.len() != scaler.columns.len() {
            return Err(AssetLoadError::Dimension {
                transformer: "standard scaler",
                expected: scaler.columns.len(),
                found: scaler.mean.len().min(scaler.scale.len()),
            });
        }

        // The ordinal vocabularies are the rank order; they must match the
        // labels the feature engineer emits, in the same order.
        check_vocabulary("ordinal encoder (bmi_cat)", &schema::BMI_LABELS, &ordinal.categories, 0)?;
        check_vocabulary("ordinal encoder (age_group)", &schema::AGE_LABELS, &ordinal.categories, 1)?;

        // The engineered risk flag bypasses the sanitizer's vocabulary
        // remap, so both of its labels must be encodable.
        let flag_vocab = one_hot
            .vocabulary("diabetes_risk_flag")
            .unwrap_or(&[]);
        for flag in [RiskFlag::HighRisk, RiskFlag::NormalPreRisk] {
            if !flag_vocab.iter().any(|c| c == flag.as_str()) {
                return Err(AssetLoadError::MissingVocabulary {
                    column: "diabetes_risk_flag".to_string(),
                    category: flag.as_str().to_string(),
                });
            }
        }

        // Reducer input width must match the assembled row the pipeline
        // will produce (or the explicit sidecar order when present).
        let expected_width = match &final_features {
            Some(features) => features.len(),
            None => schema::assembled_width(one_hot.width()),
        };
        if reducer.input_dim() != expected_width {
            return Err(AssetLoadError::Dimension {
                transformer: "PCA reducer",
                expected: expected_width,
                found: reducer.input_dim(),
            });
        }
        // Every principal axis must span the full input width; a short row
        // would truncate the dot product instead of failing.
        if let Some(axis) = reducer
            .components
            .iter()
            .find(|axis| axis.len() != reducer.input_dim())
        {
            return Err(AssetLoadError::Dimension {
                transformer: "PCA reducer",
                expected: reducer.input_dim(),
                found: axis.len(),
            });
        }

        Ok(Self {
            imputer,
            scaler,
            ordinal,
            one_hot,
            reducer,
            classifier,
            final_features,
        })
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, AssetLoadError> {
    let bytes = std::fs::read(path).map_err(|source| AssetLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| AssetLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn check_columns(
    transformer: &'static str,
    expected: &[&str],
    found: &[String],
) -> Result<(), AssetLoadError> {
    if found.len() != expected.len() || !found.iter().zip(expected).all(|(f, e)| f == e) {
        return Err(AssetLoadError::ColumnMismatch {
            transformer,
            expected: expected.iter().map(|s| s.to_string()).collect(),
            found: found.to_vec(),
        });
    }
    Ok(())
}

fn check_vocabulary(
    transformer: &'static str,
    expected: &[&str],
    categories: &[Vec<String>],
    index: usize,
) -> Result<(), AssetLoadError> {
    let found = categories.get(index).map(|v| v.as_slice()).unwrap_or(&[]);
    if found.len() != expected.len() || !found.iter().zip(expected).all(|(f, e)| f == e) {
        return Err(AssetLoadError::ColumnMismatch {
            transformer,
            expected: expected.iter().map(|s| s.to_string()).collect(),
            found: found.to_vec(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::test_fixtures::{fixture_parts, StubClassifier};

    #[test]
    fn test_from_parts_accepts_schema_aligned_artifacts() {
        let (imputer, scaler, ordinal, one_hot, reducer) = fixture_parts();
        let store = AssetStore::from_parts(
            imputer,
            scaler,
            ordinal,
            one_hot,
            reducer,
            Box::new(StubClassifier(0.5)),
            None,
        );
        assert!(store.is_ok());
    }

    #[test]
    fn test_from_parts_rejects_reordered_scaler_columns() {
        let (imputer, mut scaler, ordinal, one_hot, reducer) = fixture_parts();
        scaler.columns.swap(0, 1);

        let err = AssetStore::from_parts(
            imputer,
            scaler,
            ordinal,
            one_hot,
            reducer,
            Box::new(StubClassifier(0.5)),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, AssetLoadError::ColumnMismatch { transformer, .. }
            if transformer == "standard scaler"));
    }

    #[test]
    fn test_from_parts_rejects_wrong_reducer_width() {
        let (imputer, scaler, ordinal, one_hot, mut reducer) = fixture_parts();
        reducer.mean.push(0.0);

        let err = AssetStore::from_parts(
            imputer,
            scaler,
            ordinal,
            one_hot,
            reducer,
            Box::new(StubClassifier(0.5)),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, AssetLoadError::Dimension { transformer, .. }
            if transformer == "PCA reducer"));
    }

    #[test]
    fn test_from_parts_rejects_ragged_ordinal_categories() {
        let (imputer, scaler, mut ordinal, one_hot, reducer) = fixture_parts();
        ordinal.categories.pop();

        let err = AssetStore::from_parts(
            imputer,
            scaler,
            ordinal,
            one_hot,
            reducer,
            Box::new(StubClassifier(0.5)),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, AssetLoadError::Dimension { transformer, .. }
            if transformer == "ordinal encoder"));
    }

    #[test]
    fn test_from_parts_rejects_ragged_one_hot_categories() {
        let (imputer, scaler, ordinal, mut one_hot, reducer) = fixture_parts();
        one_hot.categories.pop();

        let err = AssetStore::from_parts(
            imputer,
            scaler,
            ordinal,
            one_hot,
            reducer,
            Box::new(StubClassifier(0.5)),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, AssetLoadError::Dimension { transformer, .. }
            if transformer == "one-hot encoder"));
    }

    #[test]
    fn test_from_parts_rejects_short_pca_component_row() {
        let (imputer, scaler, ordinal, one_hot, mut reducer) = fixture_parts();
        reducer.components[0].pop();

        let err = AssetStore::from_parts(
            imputer,
            scaler,
            ordinal,
            one_hot,
            reducer,
            Box::new(StubClassifier(0.5)),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, AssetLoadError::Dimension { transformer, .. }
            if transformer == "PCA reducer"));
    }

    #[test]
    fn test_sidecar_length_overrides_computed_width() {
        let (imputer, scaler, ordinal, one_hot, reducer) = fixture_parts();
        let width = reducer.input_dim();
        // A sidecar of the same width as the fitted reducer is accepted
        // even if its names differ from the computed layout.
        let sidecar: Vec<String> = (0..width).map(|i| format!("f{i}")).collect();

        let store = AssetStore::from_parts(
            imputer,
            scaler,
            ordinal,
            one_hot,
            reducer,
            Box::new(StubClassifier(0.5)),
            Some(sidecar),
        );
        assert!(store.is_ok());
    }

    #[test]
    fn test_missing_risk_flag_vocabulary_is_fatal() {
        let (imputer, scaler, ordinal, mut one_hot, reducer) = fixture_parts();
        let flag_index = one_hot
            .columns
            .iter()
            .position(|c| c == "diabetes_risk_flag")
            .unwrap();
        one_hot.categories[flag_index] = vec!["High Risk".to_string()];

        let err = AssetStore::from_parts(
            imputer,
            scaler,
            ordinal,
            one_hot,
            reducer,
            Box::new(StubClassifier(0.5)),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, AssetLoadError::MissingVocabulary { .. }));
    }
}
