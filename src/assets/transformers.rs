//! Fitted preprocessing transformers.
//!
//! Each struct deserializes a JSON sidecar exported at training time and
//! applies the recorded statistics at inference; nothing here refits. The
//! artifact's `columns` field is the fit-time column order and is checked
//! against the schema when the asset store loads.

use serde::Deserialize;
use thiserror::Error;

/// Failure while applying a fitted transformer to one row.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("row has {found} values, transformer was fit on {expected} columns")]
    LengthMismatch { expected: usize, found: usize },

    #[error("value {value:?} for column {column} is not in the fitted vocabulary")]
    UnknownCategory { column: String, value: String },

    #[error("column {column} has no fitted values to impute from")]
    EmptyFitColumn { column: String },
}

/// K-nearest-neighbor imputer over a fixed numeric column subset.
///
/// `fit_samples` is the fit-time sample matrix over `columns`; a JSON null
/// marks a missing cell. Distances are nan-Euclidean: squared differences
/// over coordinates present in both rows, scaled up by the fraction of
/// absent coordinates.
#[derive(Debug, Clone, Deserialize)]
pub struct KnnImputer {
    pub columns: Vec<String>,
    pub n_neighbors: usize,
    pub fit_samples: Vec<Vec<Option<f64>>>,
}

impl KnnImputer {
    /// Fill missing values in `row` (ordered as `columns`) in place.
    /// Present values pass through untouched.
    pub fn transform(&self, row: &mut [Option<f64>]) -> Result<(), TransformError> {
        if row.len() != self.columns.len() {
            return Err(TransformError::LengthMismatch {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        if row.iter().all(|v| v.is_some()) {
            return Ok(());
        }

        // Distances are computed against the original (pre-fill) row so the
        // fill order of missing columns cannot change the result.
        let query: Vec<Option<f64>> = row.to_vec();
        for target in 0..row.len() {
            if row[target].is_none() {
                row[target] = Some(self.impute_one(&query, target)?);
            }
        }
        Ok(())
    }

    fn impute_one(&self, query: &[Option<f64>], target: usize) -> Result<f64, TransformError> {
        // Donor rows need a defined distance and a present target value.
        let mut donors: Vec<(f64, f64)> = self
            .fit_samples
            .iter()
            .filter_map(|sample| {
                let value = sample.get(target).copied().flatten()?;
                let distance = nan_euclidean(query, sample)?;
                Some((distance, value))
            })
            .collect();

        if donors.is_empty() {
            return self.column_mean(target);
        }

        // Stable sort keeps ties in fit order, so imputation is deterministic.
        donors.sort_by(|a, b| a.0.total_cmp(&b.0));
        donors.truncate(self.n_neighbors.max(1));

        let sum: f64 = donors.iter().map(|(_, v)| v).sum();
        Ok(sum / donors.len() as f64)
    }

    /// Mean of the fit column, used when no donor has a defined distance.
    fn column_mean(&self, target: usize) -> Result<f64, TransformError> {
        let values: Vec<f64> = self
            .fit_samples
            .iter()
            .filter_map(|sample| sample.get(target).copied().flatten())
            .collect();
        if values.is_empty() {
            return Err(TransformError::EmptyFitColumn {
                column: self.columns[target].clone(),
            });
        }
        Ok(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Distance over coordinates present in both rows, scaled by
/// total/present; `None` when the rows share no present coordinate.
fn nan_euclidean(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let mut present = 0usize;
    let mut sum_sq = 0.0;
    for (x, y) in a.iter().zip(b.iter()) {
        if let (Some(x), Some(y)) = (x, y) {
            present += 1;
            sum_sq += (x - y) * (x - y);
        }
    }
    if present == 0 {
        return None;
    }
    Some((a.len() as f64 / present as f64 * sum_sq).sqrt())
}

/// Column-wise standardization: (x - mean) / scale, in fit column order.
#[derive(Debug, Clone, Deserialize)]
pub struct StandardScaler {
    pub columns: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn transform(&self, row: &mut [f64]) -> Result<(), TransformError> {
        if row.len() != self.columns.len() {
            return Err(TransformError::LengthMismatch {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        for (i, value) in row.iter_mut().enumerate() {
            *value = (*value - self.mean[i]) / self.scale[i];
        }
        Ok(())
    }
}

/// Ordered-category encoder: category string to its fit-order rank.
#[derive(Debug, Clone, Deserialize)]
pub struct OrdinalEncoder {
    pub columns: Vec<String>,
    /// One vocabulary per column; index within the vocabulary is the rank.
    pub categories: Vec<Vec<String>>,
}

impl OrdinalEncoder {
    pub fn encode(&self, column_index: usize, value: &str) -> Result<f64, TransformError> {
        let vocabulary = &self.categories[column_index];
        vocabulary
            .iter()
            .position(|c| c == value)
            .map(|rank| rank as f64)
            .ok_or_else(|| TransformError::UnknownCategory {
                column: self.columns[column_index].clone(),
                value: value.to_string(),
            })
    }
}

/// One-hot encoder with a fixed per-column vocabulary in fit order.
#[derive(Debug, Clone, Deserialize)]
pub struct OneHotEncoder {
    pub columns: Vec<String>,
    pub categories: Vec<Vec<String>>,
}

impl OneHotEncoder {
    /// Fitted vocabulary for a column, if the column was fit.
    pub fn vocabulary(&self, column: &str) -> Option<&[String]> {
        let index = self.columns.iter().position(|c| c == column)?;
        Some(&self.categories[index])
    }

    /// Total indicator width across all columns.
    pub fn width(&self) -> usize {
        self.categories.iter().map(|v| v.len()).sum()
    }

    /// Indicator column names, `{column}_{category}` in fit order.
    pub fn feature_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .zip(&self.categories)
            .flat_map(|(column, vocabulary)| {
                vocabulary.iter().map(move |category| format!("{column}_{category}"))
            })
            .collect()
    }

    /// Encode one value per fit column into the full indicator row.
    ///
    /// Values are expected to be vocabulary-constrained already (the
    /// sanitizer remaps unseen values); an unknown category here means the
    /// sanitize contract was violated and is an error, not a fallback.
    pub fn encode_row(&self, values: &[&str]) -> Result<Vec<f64>, TransformError> {
        if values.len() != self.columns.len() {
            return Err(TransformError::LengthMismatch {
                expected: self.columns.len(),
                found: values.len(),
            });
        }

        let mut indicators = Vec::with_capacity(self.width());
        for (index, value) in values.iter().enumerate() {
            let vocabulary = &self.categories[index];
            let position = vocabulary.iter().position(|c| c == value).ok_or_else(|| {
                TransformError::UnknownCategory {
                    column: self.columns[index].clone(),
                    value: value.to_string(),
                }
            })?;
            for i in 0..vocabulary.len() {
                indicators.push(if i == position { 1.0 } else { 0.0 });
            }
        }
        Ok(indicators)
    }
}

/// Variance-preserving projection: (x - mean) . components^T.
#[derive(Debug, Clone, Deserialize)]
pub struct PcaReducer {
    pub mean: Vec<f64>,
    /// `components[k]` is the k-th principal axis over the input features.
    pub components: Vec<Vec<f64>>,
}

impl PcaReducer {
    pub fn input_dim(&self) -> usize {
        self.mean.len()
    }

    pub fn n_components(&self) -> usize {
        self.components.len()
    }

    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>, TransformError> {
        if row.len() != self.mean.len() {
            return Err(TransformError::LengthMismatch {
                expected: self.mean.len(),
                found: row.len(),
            });
        }

        let centered: Vec<f64> = row.iter().zip(&self.mean).map(|(x, m)| x - m).collect();
        let projected = self
            .components
            .iter()
            .map(|axis| axis.iter().zip(&centered).map(|(a, x)| a * x).sum())
            .collect();
        Ok(projected)
    }
}
