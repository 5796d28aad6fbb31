//! Statistical imputation: median for numeric columns, most frequent value
//! for categorical ones.

use crate::error::{ProcessingError, Result};
use crate::utils::{fill_numeric_nulls, fill_string_nulls, numeric_median, string_mode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fills missing numeric values with the training median.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedianImputer {
    column: String,
    median: f64,
}

impl MedianImputer {
    /// Learn the median of the non-missing values.
    pub fn fit(column: &str, values: &[Option<f64>]) -> Result<Self> {
        let median =
            numeric_median(values).ok_or_else(|| ProcessingError::NoValidValues(column.to_string()))?;
        debug!(column, median, "Fitted median imputer");
        Ok(Self {
            column: column.to_string(),
            median,
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn fill_value(&self) -> f64 {
        self.median
    }

    pub fn transform(&self, values: &[Option<f64>]) -> Vec<f64> {
        fill_numeric_nulls(values, self.median)
    }
}

/// Fills missing categorical values with the training mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MostFrequentImputer {
    column: String,
    most_frequent: String,
}

impl MostFrequentImputer {
    /// Learn the most frequent non-missing value (ties go to the smallest).
    pub fn fit(column: &str, values: &[Option<String>]) -> Result<Self> {
        let most_frequent =
            string_mode(values).ok_or_else(|| ProcessingError::NoValidValues(column.to_string()))?;
        debug!(column, most_frequent = %most_frequent, "Fitted most-frequent imputer");
        Ok(Self {
            column: column.to_string(),
            most_frequent,
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn fill_value(&self) -> &str {
        &self.most_frequent
    }

    pub fn transform(&self, values: Vec<Option<String>>) -> Vec<String> {
        fill_string_nulls(values, &self.most_frequent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    // ========================================================================
    // MedianImputer tests
    // ========================================================================

    #[test]
    fn test_median_imputer_basic() {
        let values = [Some(1.0), None, Some(3.0), None, Some(5.0)];
        let imputer = MedianImputer::fit("values", &values).unwrap();

        assert_eq!(imputer.fill_value(), 3.0);
        assert_eq!(imputer.transform(&values), vec![1.0, 3.0, 3.0, 3.0, 5.0]);
    }

    #[test]
    fn test_median_imputer_reuses_training_median() {
        let imputer = MedianImputer::fit("math_score", &[Some(60.0), Some(80.0)]).unwrap();
        // A different column distribution at transform time does not move the fill value.
        assert_eq!(imputer.transform(&[None, Some(10.0)]), vec![70.0, 10.0]);
    }

    #[test]
    fn test_median_imputer_all_missing() {
        let result = MedianImputer::fit("math_score", &[None, None]);
        assert!(matches!(result, Err(ProcessingError::NoValidValues(c)) if c == "math_score"));
    }

    // ========================================================================
    // MostFrequentImputer tests
    // ========================================================================

    #[test]
    fn test_most_frequent_imputer_basic() {
        let values = strings(&[Some("standard"), None, Some("standard"), Some("free/reduced")]);
        let imputer = MostFrequentImputer::fit("lunch", &values).unwrap();

        assert_eq!(imputer.fill_value(), "standard");
        assert_eq!(
            imputer.transform(values),
            vec!["standard", "standard", "standard", "free/reduced"]
        );
    }

    #[test]
    fn test_most_frequent_imputer_all_missing() {
        let result = MostFrequentImputer::fit("lunch", &strings(&[None]));
        assert!(result.is_err());
    }

    #[test]
    fn test_imputer_serde() {
        let imputer = MostFrequentImputer::fit("gender", &strings(&[Some("female")])).unwrap();
        let json = serde_json::to_string(&imputer).unwrap();
        let restored: MostFrequentImputer = serde_json::from_str(&json).unwrap();
        assert_eq!(imputer, restored);
    }
}
