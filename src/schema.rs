//! Static schema for the fitted model pipeline.
//!
//! Column order is load-bearing: every fitted transformer was fit against
//! these lists in exactly this order, and the asset store rejects artifacts
//! whose recorded fit-time order disagrees. Reordering anything here without
//! re-exporting the artifacts will corrupt predictions.

/// The 21 raw fields required in every prediction request.
pub const USER_INPUT_COLUMNS: [&str; 21] = [
    "gender",
    "age",
    "blood_pressure",
    "heart_rate",
    "glucose",
    "insulin",
    "cholesterol",
    "bmi",
    "physical_activity",
    "waist_size",
    "calorie_intake",
    "mental_health_score",
    "sugar_intake",
    "smoking_status",
    "alcohol_consumption",
    "stress_level",
    "income",
    "marital_status",
    "exercise_type",
    "dietary_habits",
    "caffeine_intake",
];

/// Numeric subset handled by the fitted KNN imputer, in fit order.
pub const KNN_IMPUTE_COLS: [&str; 4] = ["blood_pressure", "heart_rate", "insulin", "income"];

/// Full numeric column list (raw + engineered), in standard-scaler fit order.
pub const NUM_COLS: [&str; 16] = [
    "age",
    "blood_pressure",
    "heart_rate",
    "glucose",
    "insulin",
    "cholesterol",
    "bmi",
    "physical_activity",
    "stress_level",
    "income",
    "waist_size",
    "calorie_intake",
    "mental_health_score",
    "sugar_intake",
    "caffeine_missing_flag",
    "HOMA_IR",
];

/// Categorical columns (raw + the engineered risk flag), in one-hot fit order.
pub const CAT_COLS: [&str; 8] = [
    "gender",
    "smoking_status",
    "alcohol_consumption",
    "marital_status",
    "exercise_type",
    "dietary_habits",
    "caffeine_intake",
    "diabetes_risk_flag",
];

/// Engineered ordinal columns, in ordinal-encoder fit order.
pub const ORDINAL_COLS: [&str; 2] = ["bmi_cat", "age_group"];

/// BMI bin edges, left-inclusive / right-exclusive; the last bin is open.
pub const BMI_BINS: [f64; 4] = [0.0, 18.5, 25.0, 30.0];
pub const BMI_LABELS: [&str; 4] = ["Underweight", "Normal", "Overweight", "Obese"];

/// Age bin edges, same convention as [`BMI_BINS`].
pub const AGE_BINS: [f64; 4] = [18.0, 26.0, 41.0, 61.0];
pub const AGE_LABELS: [&str; 4] = ["Young", "Adult", "Middle-aged", "Senior"];

/// Divisor in the HOMA-IR composite score: glucose * insulin / 405.
pub const HOMA_IR_DIVISOR: f64 = 405.0;

/// Glucose threshold for the diabetes risk flag (strict greater-than).
pub const GLUCOSE_RISK_THRESHOLD: f64 = 125.0;

/// Default substituted when `exercise_type` is absent from the request.
pub const EXERCISE_TYPE_DEFAULT: &str = "Undefined";

/// Default stress rank when the request carries no recognizable stress level.
pub const STRESS_LEVEL_DEFAULT: f64 = 2.0;

/// Width of the assembled row fed to the reducer when no explicit final
/// feature list is available: numeric ++ ordinal ++ one-hot indicators.
pub fn assembled_width(one_hot_width: usize) -> usize {
    NUM_COLS.len() + ORDINAL_COLS.len() + one_hot_width
}
