//! Error taxonomy for asset loading and the prediction pipeline.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Fatal startup error: a fitted artifact is missing, unreadable, or
/// disagrees with the declared schema. The process stays up but unready.
#[derive(Debug, Error)]
pub enum AssetLoadError {
    #[error("failed to read asset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse asset {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to load classifier {path}: {message}")]
    Classifier { path: PathBuf, message: String },

    /// The artifact's recorded fit-time column order does not match the
    /// schema's declared order.
    #[error("{transformer} column order mismatch: schema declares {expected:?}, artifact recorded {found:?}")]
    ColumnMismatch {
        transformer: &'static str,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("{transformer} dimension mismatch: expected {expected}, artifact has {found}")]
    Dimension {
        transformer: &'static str,
        expected: usize,
        found: usize,
    },

    /// The one-hot vocabulary cannot represent an engineered category the
    /// pipeline will always produce.
    #[error("one-hot vocabulary for {column} is missing category {category:?}")]
    MissingVocabulary { column: String, category: String },
}

/// Pipeline stage names, used to label stage failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Imputation,
    Engineering,
    Scaling,
    OrdinalEncoding,
    OneHotEncoding,
    Reindex,
    Reduction,
    Prediction,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Imputation => "imputation",
            Stage::Engineering => "feature engineering",
            Stage::Scaling => "scaling",
            Stage::OrdinalEncoding => "ordinal encoding",
            Stage::OneHotEncoding => "one-hot encoding",
            Stage::Reindex => "final feature reindexing",
            Stage::Reduction => "dimensionality reduction",
            Stage::Prediction => "model prediction",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request error surfaced by the prediction flow.
#[derive(Debug, Error)]
pub enum PredictionError {
    /// Assets were never loaded; the service must not transform anything.
    #[error("model assets not loaded")]
    NotInitialized,

    /// Required raw fields are absent from the request.
    #[error("missing required features in input data: {}", missing.join(", "))]
    MissingFields { missing: Vec<String> },

    /// The request body cannot be coerced into a raw record at all.
    #[error("invalid request: {0}")]
    Validation(String),

    /// A pipeline stage failed; indicates artifact or schema drift, not a
    /// client fault, and is never retried.
    #[error("{stage} failed: {message}")]
    Stage { stage: Stage, message: String },

    #[error("unexpected error: {0}")]
    Unknown(#[from] anyhow::Error),
}

impl PredictionError {
    pub fn stage(stage: Stage, cause: impl fmt::Display) -> Self {
        PredictionError::Stage {
            stage,
            message: cause.to_string(),
        }
    }

    /// True when the fault lies with the request, not the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PredictionError::MissingFields { .. } | PredictionError::Validation(_)
        )
    }
}
