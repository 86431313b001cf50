//! Raw request record for disease risk prediction.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A numeric field as it arrives on the wire: a number, a numeric string,
/// or null. Anything unparseable becomes an explicit missing marker rather
/// than a zero, so downstream imputation can see it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RawNumber(pub Option<f64>);

impl<'de> Deserialize<'de> for RawNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(RawNumber(coerce_numeric(value.as_ref())))
    }
}

fn coerce_numeric(value: Option<&Value>) -> Option<f64> {
    match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// A free-text field: string, stringified number, or null.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RawText(pub Option<String>);

impl RawText {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<'de> Deserialize<'de> for RawText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        let text = match value {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        Ok(RawText(text))
    }
}

/// One subject's raw health-survey attributes, as submitted to `/predict`.
///
/// Field presence is validated at the HTTP boundary against the declared
/// input column list before deserialization, so `#[serde(default)]` here
/// only covers nulls and fields the boundary already reported missing.
/// Unknown extra fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    pub gender: RawText,
    pub age: RawNumber,
    pub blood_pressure: RawNumber,
    pub heart_rate: RawNumber,
    pub glucose: RawNumber,
    pub insulin: RawNumber,
    pub cholesterol: RawNumber,
    pub bmi: RawNumber,
    pub physical_activity: RawNumber,
    pub waist_size: RawNumber,
    pub calorie_intake: RawNumber,
    pub mental_health_score: RawNumber,
    pub sugar_intake: RawNumber,
    pub smoking_status: RawText,
    pub alcohol_consumption: RawText,
    /// "Low" / "Medium" / "High", or a numeric rank.
    pub stress_level: RawText,
    pub income: RawNumber,
    pub marital_status: RawText,
    pub exercise_type: RawText,
    pub dietary_habits: RawText,
    pub caffeine_intake: RawText,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_coercion() {
        let record: RawRecord = serde_json::from_str(
            r#"{"glucose": 110, "insulin": "12.5", "bmi": "not a number", "age": null}"#,
        )
        .unwrap();

        assert_eq!(record.glucose, RawNumber(Some(110.0)));
        assert_eq!(record.insulin, RawNumber(Some(12.5)));
        assert_eq!(record.bmi, RawNumber(None));
        assert_eq!(record.age, RawNumber(None));
    }

    #[test]
    fn test_text_coercion() {
        let record: RawRecord =
            serde_json::from_str(r#"{"gender": "Male", "smoking_status": 2, "exercise_type": null}"#)
                .unwrap();

        assert_eq!(record.gender.as_deref(), Some("Male"));
        assert_eq!(record.smoking_status.as_deref(), Some("2"));
        assert_eq!(record.exercise_type.as_deref(), None);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let record: RawRecord =
            serde_json::from_str(r#"{"glucose": 95, "water_intake": 2.5, "work_hours": 45}"#)
                .unwrap();
        assert_eq!(record.glucose, RawNumber(Some(95.0)));
    }
}
