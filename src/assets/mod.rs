//! Fitted model and preprocessor assets

pub mod classifier;
pub mod store;
pub mod transformers;

pub use classifier::{Classifier, OnnxClassifier};
pub use store::AssetStore;
pub use transformers::{KnnImputer, OneHotEncoder, OrdinalEncoder, PcaReducer, StandardScaler};

/// Schema-aligned fitted artifacts for tests, shared by the store and
/// pipeline test modules.
#[cfg(test)]
pub mod test_fixtures {
    use super::*;
    use crate::schema;

    /// Fixed-probability classifier standing in for the ONNX session.
    pub struct StubClassifier(pub f64);

    impl Classifier for StubClassifier {
        fn predict_proba(&self, _features: &[f32]) -> anyhow::Result<f64> {
            Ok(self.0)
        }
    }

    fn owned(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    /// A full transformer set fit against the declared schema: identity
    /// scaler, identity-prefix reducer, and small one-hot vocabularies.
    pub fn fixture_parts() -> (KnnImputer, StandardScaler, OrdinalEncoder, OneHotEncoder, PcaReducer)
    {
        let imputer = KnnImputer {
            columns: owned(&schema::KNN_IMPUTE_COLS),
            n_neighbors: 2,
            fit_samples: vec![
                vec![Some(120.0), Some(70.0), Some(10.0), Some(50_000.0)],
                vec![Some(130.0), Some(75.0), Some(12.0), Some(60_000.0)],
                vec![Some(140.0), Some(80.0), Some(14.0), Some(70_000.0)],
                vec![Some(150.0), Some(85.0), Some(16.0), Some(80_000.0)],
            ],
        };

        let scaler = StandardScaler {
            columns: owned(&schema::NUM_COLS),
            mean: vec![0.0; schema::NUM_COLS.len()],
            scale: vec![1.0; schema::NUM_COLS.len()],
        };

        let ordinal = OrdinalEncoder {
            columns: owned(&schema::ORDINAL_COLS),
            categories: vec![owned(&schema::BMI_LABELS), owned(&schema::AGE_LABELS)],
        };

        let one_hot = OneHotEncoder {
            columns: owned(&schema::CAT_COLS),
            categories: vec![
                owned(&["Female", "Male"]),
                owned(&["Former Smoker", "Never", "Unknown"]),
                owned(&["Moderate", "None"]),
                owned(&["Married", "Single"]),
                owned(&["Cardio", "Undefined"]),
                owned(&["Balanced", "Vegan"]),
                owned(&["2 cups daily", "Unknown"]),
                owned(&["High Risk", "Normal/Pre-Risk"]),
            ],
        };

        let width = schema::assembled_width(one_hot.width());
        let components = (0..5)
            .map(|k| {
                let mut axis = vec![0.0; width];
                axis[k] = 1.0;
                axis
            })
            .collect();
        let reducer = PcaReducer {
            mean: vec![0.0; width],
            components,
        };

        (imputer, scaler, ordinal, one_hot, reducer)
    }

    /// A ready-to-use store with a stub classifier.
    pub fn fixture_store(probability: f64) -> AssetStore {
        let (imputer, scaler, ordinal, one_hot, reducer) = fixture_parts();
        AssetStore::from_parts(
            imputer,
            scaler,
            ordinal,
            one_hot,
            reducer,
            Box::new(StubClassifier(probability)),
            None,
        )
        .expect("fixture artifacts must match the schema")
    }
}
