//! Prediction output types and the `/predict` wire shape.

use serde::{Deserialize, Serialize};

/// Hard class decision mapped to its display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredictionLabel {
    #[serde(rename = "Disease")]
    Disease,
    #[serde(rename = "No Disease")]
    NoDisease,
}

impl PredictionLabel {
    /// Class 1 is the disease class.
    pub fn from_class(class: i64) -> Self {
        if class == 1 {
            PredictionLabel::Disease
        } else {
            PredictionLabel::NoDisease
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionLabel::Disease => "Disease",
            PredictionLabel::NoDisease => "No Disease",
        }
    }
}

/// One prediction result. `probability` is the class-1 probability already
/// rounded to 4 digits; the unrounded value is never exposed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: PredictionLabel,
    pub probability: f64,
}

/// Success body returned by `POST /predict`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub status: String,
    pub prediction_label: String,
    pub probability_of_disease: f64,
}

impl From<Prediction> for PredictionResponse {
    fn from(prediction: Prediction) -> Self {
        Self {
            status: "success".to_string(),
            prediction_label: prediction.label.as_str().to_string(),
            probability_of_disease: prediction.probability,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_from_class() {
        assert_eq!(PredictionLabel::from_class(1), PredictionLabel::Disease);
        assert_eq!(PredictionLabel::from_class(0), PredictionLabel::NoDisease);
    }

    #[test]
    fn test_response_shape() {
        let response = PredictionResponse::from(Prediction {
            label: PredictionLabel::NoDisease,
            probability: 0.1234,
        });

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["prediction_label"], "No Disease");
        assert_eq!(json["probability_of_disease"], 0.1234);
    }
}
