//! The fixed-order feature reconstruction pipeline.
//!
//! Imputation, feature engineering, scaling, ordinal encoding, one-hot
//! encoding, final reindexing, and dimensionality reduction, applied in
//! exactly the order the transformers were fit in. Every stage failure is
//! wrapped with its stage name and aborts the run; a corrupted intermediate
//! row must never advance.

use crate::assets::AssetStore;
use crate::error::{PredictionError, Stage};
use crate::features::{self, EngineeredRecord};
use crate::predictor;
use crate::sanitizer::{self, SanitizedRecord};
use crate::schema;
use crate::types::{Prediction, RawRecord};
use std::collections::HashMap;

/// Run one raw record through the full pipeline and classifier.
pub fn run(assets: &AssetStore, record: &RawRecord) -> Result<Prediction, PredictionError> {
    let mut sanitized = sanitizer::sanitize(record, &assets.one_hot)?;

    impute(assets, &mut sanitized)?;
    let engineered = features::engineer(&sanitized)?;

    let mut numeric = engineered.numeric.clone();
    assets
        .scaler
        .transform(&mut numeric)
        .map_err(|e| PredictionError::stage(Stage::Scaling, e))?;

    let ordinal = encode_ordinal(assets, &engineered)?;

    let categorical: Vec<&str> = engineered.categorical.iter().map(String::as_str).collect();
    let indicators = assets
        .one_hot
        .encode_row(&categorical)
        .map_err(|e| PredictionError::stage(Stage::OneHotEncoding, e))?;

    let assembled = assemble(assets, &numeric, &ordinal, &indicators)?;

    let reduced = assets
        .reducer
        .transform(&assembled)
        .map_err(|e| PredictionError::stage(Stage::Reduction, e))?;

    predictor::predict(assets, &reduced)
}

/// Apply the fitted KNN imputer to exactly its column subset, writing the
/// filled values back into the record.
fn impute(assets: &AssetStore, record: &mut SanitizedRecord) -> Result<(), PredictionError> {
    // Row order must match the imputer's fit order (KNN_IMPUTE_COLS).
    let mut row = [
        record.blood_pressure,
        record.heart_rate,
        record.insulin,
        record.income,
    ];
    assets
        .imputer
        .transform(&mut row)
        .map_err(|e| PredictionError::stage(Stage::Imputation, e))?;

    record.blood_pressure = row[0];
    record.heart_rate = row[1];
    record.insulin = row[2];
    record.income = row[3];
    Ok(())
}

fn encode_ordinal(
    assets: &AssetStore,
    engineered: &EngineeredRecord,
) -> Result<[f64; 2], PredictionError> {
    let bmi = assets
        .ordinal
        .encode(0, engineered.bmi_cat.as_str())
        .map_err(|e| PredictionError::stage(Stage::OrdinalEncoding, e))?;
    let age = assets
        .ordinal
        .encode(1, engineered.age_group.as_str())
        .map_err(|e| PredictionError::stage(Stage::OrdinalEncoding, e))?;
    Ok([bmi, age])
}

/// Concatenate numeric, ordinal and indicator columns into the final row.
///
/// With a final-feature sidecar, the row is reindexed by name: columns the
/// request did not produce are filled with 0 and ordering drift is
/// corrected. Without it, the deterministic numeric ++ ordinal ++ indicator
/// order stands, matching how the reducer was fit.
fn assemble(
    assets: &AssetStore,
    numeric: &[f64],
    ordinal: &[f64; 2],
    indicators: &[f64],
) -> Result<Vec<f64>, PredictionError> {
    let assembled: Vec<f64> = match &assets.final_features {
        Some(final_features) => {
            let mut by_name: HashMap<&str, f64> = HashMap::new();
            for (name, value) in schema::NUM_COLS.iter().zip(numeric) {
                by_name.insert(name, *value);
            }
            for (name, value) in schema::ORDINAL_COLS.iter().zip(ordinal) {
                by_name.insert(name, *value);
            }
            let indicator_names = assets.one_hot.feature_names();
            for (name, value) in indicator_names.iter().zip(indicators) {
                by_name.insert(name.as_str(), *value);
            }

            final_features
                .iter()
                .map(|name| by_name.get(name.as_str()).copied().unwrap_or(0.0))
                .collect()
        }
        None => numeric
            .iter()
            .chain(ordinal.iter())
            .chain(indicators.iter())
            .copied()
            .collect(),
    };

    if assembled.len() != assets.reducer.input_dim() {
        return Err(PredictionError::stage(
            Stage::Reindex,
            format!(
                "assembled {} features, reducer was fit on {}",
                assembled.len(),
                assets.reducer.input_dim()
            ),
        ));
    }
    Ok(assembled)
}
