//! Feature engineering over the sanitized record.
//!
//! Pure derivations: binned categories, the HOMA-IR composite score, the
//! diabetes risk flag, and the caffeine missing-flag. A null numeric input
//! at this point means an upstream contract violation (the imputer should
//! have filled it, or the client should have sent it), so it is fatal
//! rather than recoverable.

use crate::error::{PredictionError, Stage};
use crate::sanitizer::SanitizedRecord;
use crate::schema;

/// BMI bucket, ordered; rank order matches the fitted ordinal encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
        }
    }
}

/// Age bucket, ordered; rank order matches the fitted ordinal encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeGroup {
    Young,
    Adult,
    MiddleAged,
    Senior,
}

impl AgeGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeGroup::Young => "Young",
            AgeGroup::Adult => "Adult",
            AgeGroup::MiddleAged => "Middle-aged",
            AgeGroup::Senior => "Senior",
        }
    }
}

/// Glucose-derived risk flag, one-hot encoded with the raw categoricals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskFlag {
    HighRisk,
    NormalPreRisk,
}

impl RiskFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskFlag::HighRisk => "High Risk",
            RiskFlag::NormalPreRisk => "Normal/Pre-Risk",
        }
    }
}

/// Left-inclusive, right-exclusive bucket index; values below the first
/// edge clamp into the lowest bin, values past the last edge into the
/// highest (open upper bin).
fn bucket(value: f64, edges: &[f64]) -> usize {
    let mut index = 0;
    for (i, edge) in edges.iter().enumerate() {
        if value >= *edge {
            index = i;
        }
    }
    index
}

pub fn bmi_category(bmi: f64) -> BmiCategory {
    match bucket(bmi, &schema::BMI_BINS) {
        0 => BmiCategory::Underweight,
        1 => BmiCategory::Normal,
        2 => BmiCategory::Overweight,
        _ => BmiCategory::Obese,
    }
}

pub fn age_group(age: f64) -> AgeGroup {
    match bucket(age, &schema::AGE_BINS) {
        0 => AgeGroup::Young,
        1 => AgeGroup::Adult,
        2 => AgeGroup::MiddleAged,
        _ => AgeGroup::Senior,
    }
}

pub fn homa_ir(glucose: f64, insulin: f64) -> f64 {
    glucose * insulin / schema::HOMA_IR_DIVISOR
}

pub fn risk_flag(glucose: f64) -> RiskFlag {
    if glucose > schema::GLUCOSE_RISK_THRESHOLD {
        RiskFlag::HighRisk
    } else {
        RiskFlag::NormalPreRisk
    }
}

/// The fully derived record: numeric row in scaler order, ordinal
/// categories, and the categorical row in one-hot order.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineeredRecord {
    /// Values ordered exactly as [`schema::NUM_COLS`].
    pub numeric: Vec<f64>,
    pub bmi_cat: BmiCategory,
    pub age_group: AgeGroup,
    /// Values ordered exactly as [`schema::CAT_COLS`].
    pub categorical: Vec<String>,
}

fn require(column: &'static str, value: Option<f64>) -> Result<f64, PredictionError> {
    value.ok_or_else(|| {
        PredictionError::stage(
            Stage::Engineering,
            format!("column {column} is null after imputation"),
        )
    })
}

/// Derive every engineered column from the sanitized (and imputed) record.
pub fn engineer(record: &SanitizedRecord) -> Result<EngineeredRecord, PredictionError> {
    let age = require("age", record.age)?;
    let glucose = require("glucose", record.glucose)?;
    let insulin = require("insulin", record.insulin)?;
    let bmi = require("bmi", record.bmi)?;

    let caffeine_missing_flag = if record.caffeine_missing { 1.0 } else { 0.0 };
    let homa = homa_ir(glucose, insulin);

    // Order is load-bearing: must match schema::NUM_COLS.
    let numeric = vec![
        age,
        require("blood_pressure", record.blood_pressure)?,
        require("heart_rate", record.heart_rate)?,
        glucose,
        insulin,
        require("cholesterol", record.cholesterol)?,
        bmi,
        require("physical_activity", record.physical_activity)?,
        record.stress_level,
        require("income", record.income)?,
        require("waist_size", record.waist_size)?,
        require("calorie_intake", record.calorie_intake)?,
        require("mental_health_score", record.mental_health_score)?,
        require("sugar_intake", record.sugar_intake)?,
        caffeine_missing_flag,
        homa,
    ];

    // Order is load-bearing: must match schema::CAT_COLS.
    let categorical = vec![
        record.gender.clone(),
        record.smoking_status.clone(),
        record.alcohol_consumption.clone(),
        record.marital_status.clone(),
        record.exercise_type.clone(),
        record.dietary_habits.clone(),
        record.caffeine_intake.clone(),
        risk_flag(glucose).as_str().to_string(),
    ];

    Ok(EngineeredRecord {
        numeric,
        bmi_cat: bmi_category(bmi),
        age_group: age_group(age),
        categorical,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sanitized() -> SanitizedRecord {
        SanitizedRecord {
            age: Some(45.0),
            blood_pressure: Some(135.0),
            heart_rate: Some(82.0),
            glucose: Some(110.0),
            insulin: Some(12.5),
            cholesterol: Some(210.5),
            bmi: Some(28.5),
            physical_activity: Some(5.0),
            waist_size: Some(95.0),
            calorie_intake: Some(2200.0),
            mental_health_score: Some(78.0),
            sugar_intake: Some(55.0),
            income: Some(65_000.0),
            stress_level: 2.0,
            gender: "Male".to_string(),
            smoking_status: "Former Smoker".to_string(),
            alcohol_consumption: "Moderate".to_string(),
            marital_status: "Married".to_string(),
            exercise_type: "Cardio".to_string(),
            dietary_habits: "Balanced".to_string(),
            caffeine_intake: "2 cups daily".to_string(),
            caffeine_missing: false,
        }
    }

    #[test]
    fn test_bmi_bins_left_inclusive() {
        assert_eq!(bmi_category(18.5), BmiCategory::Normal);
        assert_eq!(bmi_category(18.499), BmiCategory::Underweight);
        assert_eq!(bmi_category(30.0), BmiCategory::Obese);
        assert_eq!(bmi_category(29.999), BmiCategory::Overweight);
    }

    #[test]
    fn test_bmi_below_range_clamps_to_lowest_bin() {
        assert_eq!(bmi_category(-1.0), BmiCategory::Underweight);
        assert_eq!(bmi_category(0.0), BmiCategory::Underweight);
    }

    #[test]
    fn test_age_bins() {
        assert_eq!(age_group(61.0), AgeGroup::Senior);
        assert_eq!(age_group(60.999), AgeGroup::MiddleAged);
        assert_eq!(age_group(18.0), AgeGroup::Young);
        assert_eq!(age_group(17.0), AgeGroup::Young);
        assert_eq!(age_group(26.0), AgeGroup::Adult);
    }

    #[test]
    fn test_risk_flag_strict_threshold() {
        assert_eq!(risk_flag(125.0), RiskFlag::NormalPreRisk);
        assert_eq!(risk_flag(126.0), RiskFlag::HighRisk);
    }

    #[test]
    fn test_homa_ir_not_rounded() {
        let value = homa_ir(100.0, 10.0);
        assert!((value - 1000.0 / 405.0).abs() < 1e-12);
        // Full precision is preserved; rounding happens at display only.
        assert_ne!(value, 2.4691);
    }

    #[test]
    fn test_numeric_row_matches_schema_order() {
        let engineered = engineer(&sanitized()).unwrap();
        assert_eq!(engineered.numeric.len(), crate::schema::NUM_COLS.len());
        assert_eq!(engineered.categorical.len(), crate::schema::CAT_COLS.len());

        // Spot-check a few positions against NUM_COLS.
        assert_eq!(engineered.numeric[0], 45.0); // age
        assert_eq!(engineered.numeric[3], 110.0); // glucose
        assert_eq!(engineered.numeric[14], 0.0); // caffeine_missing_flag
        assert!((engineered.numeric[15] - homa_ir(110.0, 12.5)).abs() < 1e-12);
        assert_eq!(engineered.categorical[7], "Normal/Pre-Risk");
    }

    #[test]
    fn test_missing_flag_propagates() {
        let mut record = sanitized();
        record.caffeine_missing = true;
        let engineered = engineer(&record).unwrap();
        assert_eq!(engineered.numeric[14], 1.0);
    }

    #[test]
    fn test_null_after_imputation_is_fatal() {
        let mut record = sanitized();
        record.insulin = None;
        let err = engineer(&record).unwrap_err();
        assert!(err.to_string().contains("feature engineering failed"));
        assert!(err.to_string().contains("insulin"));
    }
}
