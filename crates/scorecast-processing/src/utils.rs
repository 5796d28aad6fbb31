//! Shared utilities for the processing stages.
//!
//! Column extraction, numeric coercion of user-typed values, and the
//! statistics the imputers are fitted with.

use crate::error::{ProcessingError, Result};
use polars::prelude::*;
use std::collections::BTreeMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Fail with [`ProcessingError::ColumnNotFound`] on the first missing column.
pub fn require_columns(df: &DataFrame, columns: &[&str]) -> Result<()> {
    for name in columns {
        if df.column(name).is_err() {
            return Err(ProcessingError::ColumnNotFound((*name).to_string()));
        }
    }
    Ok(())
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 6] = [',', '$', '%', '€', '£', ' '];

/// Common error/missing value markers in data.
pub const ERROR_MARKERS: [&str; 8] = [
    "error", "unknown", "n/a", "na", "null", "missing", "none", "#n/a",
];

/// Clean a string for numeric parsing by removing formatting characters.
///
/// # Example
///
/// ```rust,ignore
/// use scorecast_processing::utils::clean_numeric_string;
///
/// assert_eq!(clean_numeric_string(" 72 "), "72");
/// assert_eq!(clean_numeric_string("1,234.5"), "1234.5");
/// ```
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    result
}

/// Check if a string is an error/missing value marker.
pub fn is_error_marker(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    ERROR_MARKERS.iter().any(|&marker| lower == marker)
}

/// Try to parse a string as a finite numeric value (f64).
///
/// Handles surrounding whitespace and common formatting characters. Missing
/// markers, empty strings, `NaN` and infinities yield `None`.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    if is_error_marker(s) {
        return None;
    }
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

// =============================================================================
// Column Extraction Utilities
// =============================================================================

/// Read a column as optional floats.
///
/// Numeric columns are cast; text columns are parsed with
/// [`parse_numeric_string`], unparsable entries becoming `None`. Any other
/// type (booleans, dates, lists) is rejected.
pub fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = df
        .column(name)
        .map_err(|_| ProcessingError::ColumnNotFound(name.to_string()))?
        .as_materialized_series();

    if matches!(series.dtype(), DataType::String) {
        let values = series
            .str()?
            .into_iter()
            .map(|v| v.and_then(parse_numeric_string))
            .collect();
        return Ok(values);
    }

    // An all-null column carries no type yet
    if !is_numeric_dtype(series.dtype()) && !matches!(series.dtype(), DataType::Null) {
        return Err(ProcessingError::InvalidColumnType {
            column: name.to_string(),
            dtype: series.dtype().to_string(),
        });
    }

    let cast = series.cast(&DataType::Float64)?;
    let values = cast
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect();
    Ok(values)
}

/// Read a column as optional strings, casting non-text columns.
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = df
        .column(name)
        .map_err(|_| ProcessingError::ColumnNotFound(name.to_string()))?
        .as_materialized_series();

    let cast;
    let text = if matches!(series.dtype(), DataType::String) {
        series
    } else {
        cast = series.cast(&DataType::String)?;
        &cast
    };

    Ok(text
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

// =============================================================================
// Statistics Utilities
// =============================================================================

/// Median of the non-missing values.
pub fn numeric_median(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return None;
    }
    Series::new("median".into(), present).median()
}

/// Most frequent non-missing value; ties go to the lexicographically
/// smallest value so the result does not depend on row order.
pub fn string_mode(values: &[Option<String>]) -> Option<String> {
    let mut value_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for val in values.iter().flatten() {
        *value_counts.entry(val.as_str()).or_insert(0) += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (val, count) in value_counts {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((val, count));
        }
    }
    best.map(|(val, _)| val.to_string())
}

/// Population mean and standard deviation.
pub fn mean_and_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}

// =============================================================================
// Fill Utilities
// =============================================================================

/// Replace missing numeric entries with a fill value.
pub fn fill_numeric_nulls(values: &[Option<f64>], fill_value: f64) -> Vec<f64> {
    values.iter().map(|v| v.unwrap_or(fill_value)).collect()
}

/// Replace missing string entries with a fill value.
pub fn fill_string_nulls(values: Vec<Option<String>>, fill_value: &str) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.unwrap_or_else(|| fill_value.to_string()))
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
