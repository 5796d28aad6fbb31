//! Column names of the student performance dataset.

pub const GENDER: &str = "gender";
pub const RACE_ETHNICITY: &str = "race_ethnicity";
pub const PARENTAL_LEVEL_OF_EDUCATION: &str = "parental_level_of_education";
pub const LUNCH: &str = "lunch";
pub const TEST_PREPARATION_COURSE: &str = "test_preparation_course";
pub const MATH_SCORE: &str = "math_score";
pub const READING_SCORE: &str = "reading_score";
pub const WRITING_SCORE: &str = "writing_score";

/// Derived regression target: mean of the three scores.
pub const TARGET: &str = "avg_score";

/// Scores averaged into [`TARGET`].
pub const SCORE_COLUMNS: [&str; 3] = [MATH_SCORE, READING_SCORE, WRITING_SCORE];

/// Numeric inputs, in output column order.
pub const NUMERIC_FEATURES: [&str; 2] = [MATH_SCORE, READING_SCORE];

/// Categorical inputs, in output column order.
pub const CATEGORICAL_FEATURES: [&str; 5] = [
    GENDER,
    RACE_ETHNICITY,
    PARENTAL_LEVEL_OF_EDUCATION,
    TEST_PREPARATION_COURSE,
    LUNCH,
];
