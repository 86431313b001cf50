//! Final classification over the reduced feature vector.

use crate::assets::AssetStore;
use crate::error::{PredictionError, Stage};
use crate::types::{Prediction, PredictionLabel};

/// Round to 4 digits for display. Applied only here, after reduction and
/// inference, so no intermediate value loses precision.
fn round_probability(probability: f64) -> f64 {
    (probability * 10_000.0).round() / 10_000.0
}

/// Compute the class-1 probability and hard label for one feature vector.
pub fn predict(assets: &AssetStore, features: &[f64]) -> Result<Prediction, PredictionError> {
    let input: Vec<f32> = features.iter().map(|&v| v as f32).collect();

    let probability = assets
        .classifier
        .predict_proba(&input)
        .map_err(|e| PredictionError::stage(Stage::Prediction, e))?;

    let class = i64::from(probability > 0.5);
    Ok(Prediction {
        label: PredictionLabel::from_class(class),
        probability: round_probability(probability),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::test_fixtures::fixture_store;

    #[test]
    fn test_probability_rounded_to_four_digits() {
        let store = fixture_store(0.123456);
        let prediction = predict(&store, &[0.0; 5]).unwrap();
        assert_eq!(prediction.probability, 0.1235);
        assert_eq!(prediction.label, PredictionLabel::NoDisease);
    }

    #[test]
    fn test_class_decision_boundary() {
        let store = fixture_store(0.5);
        // Exactly 0.5 is not class 1.
        assert_eq!(
            predict(&store, &[0.0; 5]).unwrap().label,
            PredictionLabel::NoDisease
        );

        let store = fixture_store(0.5001);
        assert_eq!(
            predict(&store, &[0.0; 5]).unwrap().label,
            PredictionLabel::Disease
        );
    }
}
