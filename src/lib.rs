//! Disease Prediction Service Library
//!
//! Serves disease-risk predictions from a fitted tabular model pipeline:
//! raw health-survey attributes are sanitized, imputed, engineered, scaled,
//! encoded, and reduced into the exact feature vector the classifier was
//! trained on.

pub mod assets;
pub mod config;
pub mod error;
pub mod features;
pub mod metrics;
pub mod pipeline;
pub mod predictor;
pub mod sanitizer;
pub mod schema;
pub mod server;
pub mod types;

pub use assets::AssetStore;
pub use config::AppConfig;
pub use error::{AssetLoadError, PredictionError};
pub use server::AppState;
pub use types::{Prediction, RawRecord};
