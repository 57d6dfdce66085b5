//! Row-level cleaning and column type harmonization.
//!
//! Every function takes ownership of its input frame and returns a new one;
//! callers never observe partial mutation.

use crate::error::Result;
use crate::schema::{FLOAT_COLUMNS, INTEGER_COLUMNS, STRING_COLUMNS};
use polars::prelude::*;

/// Drop rows where every cell is null. Rows with at least one non-null cell
/// always survive.
pub fn remove_empty_rows(df: DataFrame) -> Result<DataFrame> {
    if df.width() == 0 {
        return Ok(df);
    }

    let mut mask = df.get_columns()[0].is_not_null();
    for series in &df.get_columns()[1..] {
        mask = &mask | &series.is_not_null();
    }

    Ok(df.filter(&mask)?)
}

/// Drop exact duplicate rows across all columns, keeping the first occurrence.
pub fn remove_duplicates(df: DataFrame) -> Result<DataFrame> {
    Ok(df
        .lazy()
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?)
}

/// Drop a denylist of columns, silently ignoring names that are not present.
pub fn remove_unwanted_columns(df: DataFrame, columns_to_remove: &[&str]) -> Result<DataFrame> {
    let keep: Vec<String> = df
        .get_column_names()
        .iter()
        .filter(|name| !columns_to_remove.contains(name))
        .map(|name| name.to_string())
        .collect();

    Ok(df.select(keep)?)
}

/// Coerce the fixed role lists to consistent dtypes.
///
/// String columns become lowercase stripped text. Integer columns are parsed
/// numerically with invalid values nulled and nulls filled with 0, stored as
/// Int64. Float columns are parsed numerically with invalid values nulled and
/// left null. Idempotent; must run before any numeric filtering.
pub fn harmonize_column_types(df: DataFrame) -> Result<DataFrame> {
    let present: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    let has = |name: &str| present.iter().any(|p| p.as_str() == name);
    let mut exprs: Vec<Expr> = Vec::new();

    for &name in STRING_COLUMNS.iter() {
        if !has(name) {
            continue;
        }
        exprs.push(
            col(name)
                .cast(DataType::String)
                .str()
                .to_lowercase()
                .str()
                .strip_chars(lit(NULL)),
        );
    }

    for &name in INTEGER_COLUMNS.iter() {
        if !has(name) {
            continue;
        }
        exprs.push(
            col(name)
                .cast(DataType::Float64)
                .fill_null(lit(0.0))
                .cast(DataType::Int64),
        );
    }

    for &name in FLOAT_COLUMNS.iter() {
        if !has(name) {
            continue;
        }
        exprs.push(col(name).cast(DataType::Float64));
    }

    Ok(df.lazy().with_columns(exprs).collect()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{COUNTRY, FORECAST_USD, MONTH_NUMBER, YEAR};

    fn mixed_frame() -> DataFrame {
        df![
            YEAR => [Some("2025"), Some("bad"), None],
            MONTH_NUMBER => [Some(1i64), Some(2), None],
            COUNTRY => [Some("  CO "), Some("GT"), None],
            FORECAST_USD => [Some("100.5"), Some("x"), None],
        ]
        .unwrap()
    }

    #[test]
    fn empty_row_removal_keeps_partial_rows() {
        let df = df![
            "a" => [Some(1i64), None, None],
            "b" => [None::<&str>, Some("x"), None],
        ]
        .unwrap();
        let cleaned = remove_empty_rows(df).unwrap();
        assert_eq!(cleaned.height(), 2);
    }

    #[test]
    fn duplicate_rows_collapse_to_first() {
        let df = df![
            "a" => [1i64, 1, 2],
            "b" => ["x", "x", "y"],
        ]
        .unwrap();
        let cleaned = remove_duplicates(df).unwrap();
        assert_eq!(cleaned.height(), 2);
    }

    #[test]
    fn denylist_ignores_missing_columns() {
        let df = df!["a" => [1i64], "nan" => ["junk"]].unwrap();
        let cleaned = remove_unwanted_columns(df, &["nan", "unnamed:_1"]).unwrap();
        assert_eq!(cleaned.get_column_names(), vec!["a"]);
    }

    #[test]
    fn harmonization_coerces_each_role() {
        let out = harmonize_column_types(mixed_frame()).unwrap();

        let year = out.column(YEAR).unwrap();
        assert_eq!(year.dtype(), &DataType::Int64);
        assert_eq!(year.i64().unwrap().get(0), Some(2025));
        // invalid parse and null both land on 0
        assert_eq!(year.i64().unwrap().get(1), Some(0));
        assert_eq!(year.i64().unwrap().get(2), Some(0));

        let country = out.column(COUNTRY).unwrap().str().unwrap().clone();
        assert_eq!(country.get(0), Some("co"));
        assert_eq!(country.get(1), Some("gt"));

        let usd = out.column(FORECAST_USD).unwrap().f64().unwrap().clone();
        assert_eq!(usd.get(0), Some(100.5));
        assert_eq!(usd.get(1), None);
        assert_eq!(usd.get(2), None);
    }

    #[test]
    fn harmonization_is_idempotent() {
        let once = harmonize_column_types(mixed_frame()).unwrap();
        let twice = harmonize_column_types(once.clone()).unwrap();
        assert!(once.equals_missing(&twice));
    }
}
