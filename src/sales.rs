//! Sales dataset: cleaning, derived percentage measures, and aggregation.

use crate::cleaning::{harmonize_column_types, remove_duplicates, remove_empty_rows, remove_unwanted_columns};
use crate::error::Result;
use crate::schema::{
    self, COMPOSITE_KEY, DISCOUNT_PCT, DISCOUNT_USD, GROSS_SALES_USD, NET_SALES_KG, NET_SALES_UNITS,
    NET_SALES_USD, RETURNS_USD, RETURN_PCT, SALES_RENAMES, UNWANTED_COLUMNS,
};
use polars::prelude::*;
use tracing::info;

const REQUIRED: [&str; 15] = [
    schema::YEAR,
    schema::MONTH_NUMBER,
    schema::MONTH_NAME,
    schema::COUNTRY,
    schema::BUSINESS_UNIT,
    schema::CATEGORY,
    schema::BRAND,
    schema::SUB_BRAND,
    schema::MATERIAL_CODE,
    schema::MATERIAL_DESCRIPTION,
    GROSS_SALES_USD,
    NET_SALES_USD,
    NET_SALES_KG,
    NET_SALES_UNITS,
    RETURNS_USD,
];

/// Basic cleaning of the freshly decoded sales sheet.
pub fn clean_sales(df: DataFrame) -> Result<DataFrame> {
    let df = schema::rename_to_canonical(df, &SALES_RENAMES)?;
    let df = remove_empty_rows(df)?;
    let df = remove_duplicates(df)?;
    let df = remove_unwanted_columns(df, &UNWANTED_COLUMNS)?;
    harmonize_column_types(df)
}

/// Aggregate cleaned sales to one row per composite key.
///
/// Keeps rows with positive gross USD and positive net kilograms, derives the
/// discount and percentage measures, then sums the additive measures and
/// averages the two percentages per key. Percentages are on a 0-100 scale
/// with 0 substituted whenever gross is not positive.
pub fn aggregate_sales(df: DataFrame) -> Result<DataFrame> {
    schema::ensure_columns(&df, &REQUIRED)?;

    let before = df.height();
    let keys: Vec<Expr> = COMPOSITE_KEY.iter().map(|c| col(c)).collect();

    let aggregated = df
        .lazy()
        .filter(
            col(GROSS_SALES_USD)
                .gt(lit(0.0))
                .and(col(NET_SALES_KG).gt(lit(0.0))),
        )
        .with_columns([(col(GROSS_SALES_USD) - col(NET_SALES_USD)).alias(DISCOUNT_USD)])
        .with_columns([
            when(col(GROSS_SALES_USD).gt(lit(0.0)))
                .then(col(DISCOUNT_USD) / col(GROSS_SALES_USD) * lit(100.0))
                .otherwise(lit(0.0))
                .alias(DISCOUNT_PCT),
            when(col(GROSS_SALES_USD).gt(lit(0.0)))
                .then(col(RETURNS_USD) / col(GROSS_SALES_USD) * lit(100.0))
                .otherwise(lit(0.0))
                .alias(RETURN_PCT),
        ])
        .group_by(keys)
        .agg([
            col(GROSS_SALES_USD).sum(),
            col(NET_SALES_USD).sum(),
            col(NET_SALES_KG).sum(),
            col(NET_SALES_UNITS).sum(),
            col(RETURNS_USD).sum(),
            col(DISCOUNT_USD).sum(),
            col(DISCOUNT_PCT).mean(),
            col(RETURN_PCT).mean(),
        ])
        .collect()?;

    info!(
        "Sales aggregated: {} raw rows -> {} keyed rows",
        before,
        aggregated.height()
    );
    Ok(aggregated)
}
