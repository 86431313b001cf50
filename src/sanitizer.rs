//! Coercion of raw request values into a well-typed, vocabulary-constrained
//! record.
//!
//! Unseen categorical values are never rejected: they are remapped to a
//! sentinel the fitted one-hot encoder knows (Unknown, Other, Undefined or
//! missing, in that priority, else the first fit-order category). This is a
//! deliberate data-quality policy and a known source of silent accuracy
//! loss, not an error path.

use crate::assets::transformers::OneHotEncoder;
use crate::error::{PredictionError, Stage};
use crate::schema;
use crate::types::RawRecord;
use tracing::debug;

/// Sentinel categories tried, in order, when remapping an unseen value.
const FALLBACK_SENTINELS: [&str; 4] = ["Unknown", "Other", "Undefined", "missing"];

/// A record with every numeric column typed (missing stays explicit for the
/// imputer) and every categorical value inside the fitted vocabulary.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedRecord {
    pub age: Option<f64>,
    pub blood_pressure: Option<f64>,
    pub heart_rate: Option<f64>,
    pub glucose: Option<f64>,
    pub insulin: Option<f64>,
    pub cholesterol: Option<f64>,
    pub bmi: Option<f64>,
    pub physical_activity: Option<f64>,
    pub waist_size: Option<f64>,
    pub calorie_intake: Option<f64>,
    pub mental_health_score: Option<f64>,
    pub sugar_intake: Option<f64>,
    pub income: Option<f64>,
    /// Always resolved: Low/Medium/High map to 1/2/3, numerics pass
    /// through, anything else defaults to 2.
    pub stress_level: f64,

    pub gender: String,
    pub smoking_status: String,
    pub alcohol_consumption: String,
    pub marital_status: String,
    pub exercise_type: String,
    pub dietary_habits: String,
    pub caffeine_intake: String,

    /// Whether `caffeine_intake` was absent/null in the raw record,
    /// captured before the sentinel fill so the flag survives it.
    pub caffeine_missing: bool,
}

/// Constrain one categorical value to a fitted vocabulary.
pub fn constrain_to_vocabulary(column: &str, value: Option<&str>, vocabulary: &[String]) -> String {
    if let Some(v) = value {
        if vocabulary.iter().any(|c| c == v) {
            return v.to_string();
        }
    }

    let fallback = FALLBACK_SENTINELS
        .iter()
        .find(|s| vocabulary.iter().any(|c| c == **s))
        .copied()
        .map(str::to_string)
        .or_else(|| vocabulary.first().cloned())
        .unwrap_or_default();

    debug!(
        column = column,
        value = ?value,
        fallback = %fallback,
        "value outside fitted vocabulary, remapped"
    );
    fallback
}

fn map_stress_level(raw: Option<&str>) -> f64 {
    match raw.map(str::trim) {
        Some("Low") => 1.0,
        Some("Medium") => 2.0,
        Some("High") => 3.0,
        Some(other) => other.parse::<f64>().unwrap_or(schema::STRESS_LEVEL_DEFAULT),
        None => schema::STRESS_LEVEL_DEFAULT,
    }
}

/// Build a [`SanitizedRecord`] from one raw record and the fitted one-hot
/// vocabularies.
pub fn sanitize(record: &RawRecord, one_hot: &OneHotEncoder) -> Result<SanitizedRecord, PredictionError> {
    let vocab = |column: &str| -> Result<&[String], PredictionError> {
        one_hot.vocabulary(column).ok_or_else(|| {
            PredictionError::stage(
                Stage::OneHotEncoding,
                format!("no fitted vocabulary for column {column}"),
            )
        })
    };

    let caffeine_missing = record.caffeine_intake.as_deref().is_none();

    // exercise_type has a literal default; the other categoricals fall
    // straight to the vocabulary sentinel when absent.
    let exercise_raw = record
        .exercise_type
        .as_deref()
        .unwrap_or(schema::EXERCISE_TYPE_DEFAULT);

    Ok(SanitizedRecord {
        age: record.age.0,
        blood_pressure: record.blood_pressure.0,
        heart_rate: record.heart_rate.0,
        glucose: record.glucose.0,
        insulin: record.insulin.0,
        cholesterol: record.cholesterol.0,
        bmi: record.bmi.0,
        physical_activity: record.physical_activity.0,
        waist_size: record.waist_size.0,
        calorie_intake: record.calorie_intake.0,
        mental_health_score: record.mental_health_score.0,
        sugar_intake: record.sugar_intake.0,
        income: record.income.0,
        stress_level: map_stress_level(record.stress_level.as_deref()),

        gender: constrain_to_vocabulary("gender", record.gender.as_deref(), vocab("gender")?),
        smoking_status: constrain_to_vocabulary(
            "smoking_status",
            record.smoking_status.as_deref(),
            vocab("smoking_status")?,
        ),
        alcohol_consumption: constrain_to_vocabulary(
            "alcohol_consumption",
            record.alcohol_consumption.as_deref(),
            vocab("alcohol_consumption")?,
        ),
        marital_status: constrain_to_vocabulary(
            "marital_status",
            record.marital_status.as_deref(),
            vocab("marital_status")?,
        ),
        exercise_type: constrain_to_vocabulary(
            "exercise_type",
            Some(exercise_raw),
            vocab("exercise_type")?,
        ),
        dietary_habits: constrain_to_vocabulary(
            "dietary_habits",
            record.dietary_habits.as_deref(),
            vocab("dietary_habits")?,
        ),
        caffeine_intake: constrain_to_vocabulary(
            "caffeine_intake",
            record.caffeine_intake.as_deref(),
            vocab("caffeine_intake")?,
        ),
        caffeine_missing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::test_fixtures::fixture_parts;
    use crate::types::record::{RawNumber, RawText};

    fn one_hot() -> OneHotEncoder {
        fixture_parts().3
    }

    fn text(s: &str) -> RawText {
        RawText(Some(s.to_string()))
    }

    #[test]
    fn test_unseen_value_remaps_to_sentinel() {
        // The smoking vocabulary carries "Unknown"; the gender vocabulary
        // carries no sentinel, so fit-order-first applies.
        let vocab_with_sentinel = vec!["Never".to_string(), "Unknown".to_string()];
        assert_eq!(
            constrain_to_vocabulary("smoking_status", Some("Vaping"), &vocab_with_sentinel),
            "Unknown"
        );

        let vocab_without = vec!["Female".to_string(), "Male".to_string()];
        assert_eq!(
            constrain_to_vocabulary("gender", Some("Nonbinary"), &vocab_without),
            "Female"
        );
    }

    #[test]
    fn test_in_vocabulary_value_passes_through() {
        let vocab = vec!["Married".to_string(), "Single".to_string()];
        assert_eq!(
            constrain_to_vocabulary("marital_status", Some("Single"), &vocab),
            "Single"
        );
    }

    #[test]
    fn test_stress_level_mapping() {
        assert_eq!(map_stress_level(Some("Low")), 1.0);
        assert_eq!(map_stress_level(Some("Medium")), 2.0);
        assert_eq!(map_stress_level(Some("High")), 3.0);
        assert_eq!(map_stress_level(Some("3")), 3.0);
        assert_eq!(map_stress_level(Some("extreme")), 2.0);
        assert_eq!(map_stress_level(None), 2.0);
    }

    #[test]
    fn test_caffeine_missing_flag_captured_before_fill() {
        let record = RawRecord {
            caffeine_intake: RawText(None),
            ..RawRecord::default()
        };
        let sanitized = sanitize(&record, &one_hot()).unwrap();

        assert!(sanitized.caffeine_missing);
        // Filled with the vocabulary sentinel, not left empty.
        assert_eq!(sanitized.caffeine_intake, "Unknown");
    }

    #[test]
    fn test_absent_exercise_type_gets_literal_default() {
        let record = RawRecord::default();
        let sanitized = sanitize(&record, &one_hot()).unwrap();
        // "Undefined" is in the fitted vocabulary, so the default survives.
        assert_eq!(sanitized.exercise_type, "Undefined");
    }

    #[test]
    fn test_numeric_fields_keep_missing_markers() {
        let record = RawRecord {
            glucose: RawNumber(Some(110.0)),
            insulin: RawNumber(None),
            ..RawRecord::default()
        };
        let sanitized = sanitize(&record, &one_hot()).unwrap();
        assert_eq!(sanitized.glucose, Some(110.0));
        assert_eq!(sanitized.insulin, None);
    }
}
