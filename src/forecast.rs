//! Forecast dataset: cleaning and aggregation to the composite business key.

use crate::cleaning::{harmonize_column_types, remove_duplicates, remove_empty_rows, remove_unwanted_columns};
use crate::error::Result;
use crate::schema::{
    self, COMPOSITE_KEY, FORECAST_KG, FORECAST_RENAMES, FORECAST_USD, MONTH_NAME, MONTH_NUMBER,
    UNWANTED_COLUMNS, YEAR,
};
use polars::prelude::*;
use tracing::info;

/// Columns that must exist before the forecast can be aggregated.
const REQUIRED: [&str; 12] = [
    YEAR,
    MONTH_NUMBER,
    MONTH_NAME,
    schema::COUNTRY,
    schema::BUSINESS_UNIT,
    schema::CATEGORY,
    schema::BRAND,
    schema::SUB_BRAND,
    schema::MATERIAL_CODE,
    schema::MATERIAL_DESCRIPTION,
    FORECAST_USD,
    FORECAST_KG,
];

/// Basic cleaning of the freshly decoded forecast sheet: canonical column
/// names, no empty or duplicate rows, junk columns dropped, harmonized types.
pub fn clean_forecast(df: DataFrame) -> Result<DataFrame> {
    let df = schema::rename_to_canonical(df, &FORECAST_RENAMES)?;
    let df = remove_empty_rows(df)?;
    let df = remove_duplicates(df)?;
    let df = remove_unwanted_columns(df, &UNWANTED_COLUMNS)?;
    harmonize_column_types(df)
}

/// Aggregate the cleaned forecast to one row per composite key.
///
/// Derives `month_number` from the month name via the fixed lookup (unmapped
/// names become null), assigns the constant fiscal year, validates required
/// columns, filters to positive measures with a known month, and sums both
/// measures per key.
pub fn aggregate_forecast(df: DataFrame, fiscal_year: i64) -> Result<DataFrame> {
    schema::ensure_columns(&df, &[MONTH_NAME])?;
    let df = derive_month_number(df)?;
    let df = df
        .lazy()
        .with_columns([lit(fiscal_year).cast(DataType::Int64).alias(YEAR)])
        .collect()?;

    schema::ensure_columns(&df, &REQUIRED)?;

    let before = df.height();
    let keys: Vec<Expr> = COMPOSITE_KEY.iter().map(|c| col(c)).collect();
    let aggregated = df
        .lazy()
        .filter(
            col(FORECAST_USD)
                .gt(lit(0.0))
                .and(col(FORECAST_KG).gt(lit(0.0)))
                .and(col(MONTH_NUMBER).is_not_null()),
        )
        .group_by(keys)
        .agg([col(FORECAST_USD).sum(), col(FORECAST_KG).sum()])
        .collect()?;

    info!(
        "Forecast aggregated: {} raw rows -> {} keyed rows",
        before,
        aggregated.height()
    );
    Ok(aggregated)
}

/// Map the month-name column to a month number. Output column is nullable
/// Int64; rows whose month name is not one of the twelve fixed entries get
/// null and are filtered out during aggregation.
fn derive_month_number(mut df: DataFrame) -> Result<DataFrame> {
    let names = df.column(MONTH_NAME)?.str()?.clone();
    let numbers: Int64Chunked = names
        .into_iter()
        .map(|opt| opt.and_then(schema::month_number))
        .collect();
    df.with_column(numbers.into_series().with_name(MONTH_NUMBER))?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        BRAND, BUSINESS_UNIT, CATEGORY, COUNTRY, MATERIAL_CODE, MATERIAL_DESCRIPTION, SUB_BRAND,
    };

    fn raw_forecast() -> DataFrame {
        df![
            MONTH_NAME => ["enero", "enero", "sometime", "febrero"],
            COUNTRY => ["co", "co", "co", "gt"],
            BUSINESS_UNIT => ["food", "food", "food", "food"],
            CATEGORY => ["snacks", "snacks", "snacks", "snacks"],
            BRAND => ["acme", "acme", "acme", "acme"],
            SUB_BRAND => ["mini", "mini", "mini", "mini"],
            MATERIAL_CODE => ["m1", "m1", "m1", "m2"],
            MATERIAL_DESCRIPTION => ["bar", "bar", "bar", "box"],
            FORECAST_USD => [100.0, 50.0, 40.0, 0.0],
            FORECAST_KG => [10.0, 5.0, 4.0, 3.0],
        ]
        .unwrap()
    }

    #[test]
    fn sums_measures_per_key() {
        let out = aggregate_forecast(raw_forecast(), 2025).unwrap();
        // the "sometime" row has no month number, the 0-usd row fails the
        // positive filter, and the two enero/m1 rows collapse into one key
        assert_eq!(out.height(), 1);
        let usd = out.column(FORECAST_USD).unwrap().f64().unwrap().get(0);
        assert_eq!(usd, Some(150.0));
        let year = out.column(YEAR).unwrap().i64().unwrap().get(0);
        assert_eq!(year, Some(2025));
        let month = out.column(MONTH_NUMBER).unwrap().i64().unwrap().get(0);
        assert_eq!(month, Some(1));
    }

    #[test]
    fn aggregation_is_associative_across_key_partitions() {
        let df = raw_forecast();
        let whole = aggregate_forecast(df.clone(), 2025).unwrap();

        // partition by material and aggregate each part separately
        let part1 = df
            .clone()
            .lazy()
            .filter(col(MATERIAL_CODE).eq(lit("m1")))
            .collect()
            .unwrap();
        let part2 = df
            .lazy()
            .filter(col(MATERIAL_CODE).eq(lit("m2")))
            .collect()
            .unwrap();
        let agg1 = aggregate_forecast(part1, 2025).unwrap();
        let agg2 = aggregate_forecast(part2, 2025).unwrap();
        assert_eq!(whole.height(), agg1.height() + agg2.height());

        let total: f64 = whole.column(FORECAST_USD).unwrap().f64().unwrap().sum().unwrap();
        let split: f64 = agg1.column(FORECAST_USD).unwrap().f64().unwrap().sum().unwrap_or(0.0)
            + agg2.column(FORECAST_USD).unwrap().f64().unwrap().sum().unwrap_or(0.0);
        assert_eq!(total, split);
    }

    #[test]
    fn missing_columns_abort_with_names() {
        let df = df![MONTH_NAME => ["enero"]].unwrap();
        let err = aggregate_forecast(df, 2025).unwrap_err();
        assert!(err.to_string().contains(FORECAST_USD));
    }
}
