//! Descriptive diagnostics logged for observability.
//!
//! Nothing here blocks the pipeline: any failure is logged at warn level and
//! swallowed.

use crate::error::Result;
use polars::prelude::*;
use tracing::{info, warn};

/// Null count per column.
pub fn missing_value_counts(df: &DataFrame) -> Vec<(String, usize)> {
    df.get_columns()
        .iter()
        .map(|s| (s.name().to_string(), s.null_count()))
        .collect()
}

/// Number of rows that are exact duplicates of an earlier row.
pub fn duplicate_row_count(df: &DataFrame) -> Result<usize> {
    let unique = df
        .clone()
        .lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?;
    Ok(df.height() - unique.height())
}

/// IQR outlier count for one numeric column: values outside
/// [Q1 - 1.5*IQR, Q3 + 1.5*IQR].
pub fn iqr_outlier_count(df: &DataFrame, column: &str) -> Result<usize> {
    let series = df.column(column)?.cast(&DataType::Float64)?;
    let ca = series.f64()?;

    let q1 = ca.quantile(0.25, QuantileInterpolOptions::Linear)?;
    let q3 = ca.quantile(0.75, QuantileInterpolOptions::Linear)?;
    let (q1, q3) = match (q1, q3) {
        (Some(a), Some(b)) => (a, b),
        _ => return Ok(0),
    };
    let iqr = q3 - q1;
    let lower = q1 - 1.5 * iqr;
    let upper = q3 + 1.5 * iqr;

    Ok(ca
        .into_iter()
        .flatten()
        .filter(|v| *v < lower || *v > upper)
        .count())
}

/// count/mean/std/min/max for one numeric column.
#[derive(Debug, Clone)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

pub fn summarize_column(df: &DataFrame, column: &str) -> Result<ColumnSummary> {
    let series = df.column(column)?.cast(&DataType::Float64)?;
    let ca = series.f64()?;

    Ok(ColumnSummary {
        column: column.to_string(),
        count: ca.len() - ca.null_count(),
        mean: ca.mean(),
        std: ca.std(1),
        min: ca.min(),
        max: ca.max(),
    })
}

/// Log the full diagnostic sweep for one dataset. Never fails.
pub fn log_diagnostics(df: &DataFrame, label: &str) {
    info!("[{}] {} rows x {} columns", label, df.height(), df.width());

    for (column, nulls) in missing_value_counts(df) {
        if nulls > 0 {
            info!("[{}] column '{}' has {} missing values", label, column, nulls);
        }
    }

    match duplicate_row_count(df) {
        Ok(count) if count > 0 => info!("[{}] {} duplicate rows", label, count),
        Ok(_) => {}
        Err(e) => warn!("[{}] duplicate check failed: {}", label, e),
    }

    let numeric: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|s| s.dtype().is_numeric())
        .map(|s| s.name().to_string())
        .collect();

    for column in &numeric {
        match iqr_outlier_count(df, column) {
            Ok(count) if count > 0 => {
                info!("[{}] column '{}' has {} IQR outliers", label, column, count)
            }
            Ok(_) => {}
            Err(e) => warn!("[{}] outlier check failed for '{}': {}", label, column, e),
        }

        match summarize_column(df, column) {
            Ok(s) => info!(
                "[{}] '{}': count={} mean={:?} std={:?} min={:?} max={:?}",
                label, s.column, s.count, s.mean, s.std, s.min, s.max
            ),
            Err(e) => warn!("[{}] summary failed for '{}': {}", label, column, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_missing_and_duplicates() {
        let df = df![
            "a" => [Some(1i64), Some(1), None],
            "b" => [Some("x"), Some("x"), Some("y")],
        ]
        .unwrap();
        let nulls = missing_value_counts(&df);
        assert_eq!(nulls[0], ("a".to_string(), 1));
        assert_eq!(duplicate_row_count(&df).unwrap(), 0);

        let dup = df![
            "a" => [1i64, 1, 2],
            "b" => ["x", "x", "y"],
        ]
        .unwrap();
        assert_eq!(duplicate_row_count(&dup).unwrap(), 1);
    }

    #[test]
    fn flags_iqr_outliers() {
        let df = df!["v" => [10.0, 11.0, 10.5, 9.5, 10.2, 500.0]].unwrap();
        assert_eq!(iqr_outlier_count(&df, "v").unwrap(), 1);
    }

    #[test]
    fn summarizes_numeric_column() {
        let df = df!["v" => [Some(1.0), Some(3.0), None]].unwrap();
        let s = summarize_column(&df, "v").unwrap();
        assert_eq!(s.count, 2);
        assert_eq!(s.mean, Some(2.0));
        assert_eq!(s.min, Some(1.0));
        assert_eq!(s.max, Some(3.0));
    }
}
