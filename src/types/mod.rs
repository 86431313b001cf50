//! Type definitions for the disease prediction service

pub mod prediction;
pub mod record;

pub use prediction::{Prediction, PredictionLabel, PredictionResponse};
pub use record::RawRecord;
