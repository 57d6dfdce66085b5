//! Reconciliation of aggregated forecast against current-year aggregated sales.

use crate::error::Result;
use crate::schema::{
    self, DISCOUNT_PCT, DISCOUNT_USD, FORECAST_KG, FORECAST_USD, GROSS_SALES_USD, JOIN_KEY,
    KG_ATTAINMENT, KG_DELTA, MONTH_NAME, NET_SALES_KG, NET_SALES_UNITS, NET_SALES_USD, RETURNS_USD,
    RETURN_PCT, USD_ATTAINMENT, USD_DELTA, YEAR,
};
use polars::prelude::*;
use tracing::{info, warn};

/// Suffix polars appends to sales-side columns that collide with forecast
/// columns in the join.
const SALES_SUFFIX: &str = "_sales";

const FORECAST_REQUIRED: [&str; 11] = [
    YEAR,
    schema::MONTH_NUMBER,
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

const SALES_REQUIRED: [&str; 11] = [
    YEAR,
    schema::MONTH_NUMBER,
    schema::COUNTRY,
    schema::BUSINESS_UNIT,
    schema::CATEGORY,
    schema::BRAND,
    schema::SUB_BRAND,
    schema::MATERIAL_CODE,
    schema::MATERIAL_DESCRIPTION,
    NET_SALES_USD,
    NET_SALES_KG,
];

/// Measures carried over from the sales side; zero-filled for forecast rows
/// with no matching sales.
const SALES_MEASURES: [&str; 8] = [
    GROSS_SALES_USD,
    NET_SALES_USD,
    NET_SALES_KG,
    NET_SALES_UNITS,
    RETURNS_USD,
    DISCOUNT_USD,
    DISCOUNT_PCT,
    RETURN_PCT,
];

/// Left-join the aggregated forecast against the fiscal-year slice of the
/// aggregated sales and compute absolute deltas and attainment ratios.
///
/// Every forecast row is preserved. Unmatched rows get zero-filled sales
/// measures, so their deltas equal the negated forecast measures and their
/// attainments are 0. Attainment is also 0 whenever the forecast measure is 0.
pub fn reconcile(forecast: DataFrame, sales: DataFrame, fiscal_year: i64) -> Result<DataFrame> {
    schema::ensure_columns(&forecast, &FORECAST_REQUIRED)?;
    schema::ensure_columns(&sales, &SALES_REQUIRED)?;

    let sales_fy = sales
        .lazy()
        .filter(col(YEAR).eq(lit(fiscal_year)))
        .collect()?;
    info!("Sales rows in fiscal year {}: {}", fiscal_year, sales_fy.height());

    let keys: Vec<Expr> = JOIN_KEY.iter().map(|c| col(c)).collect();

    let matches = forecast
        .clone()
        .lazy()
        .join(
            sales_fy.clone().lazy(),
            keys.clone(),
            keys.clone(),
            JoinArgs::new(JoinType::Inner),
        )
        .collect()?;
    info!("Matching composite keys: {}", matches.height());

    let mut joined = forecast
        .clone()
        .lazy()
        .join(
            sales_fy.lazy(),
            keys.clone(),
            keys,
            JoinArgs {
                suffix: Some(SALES_SUFFIX.to_string()),
                ..JoinArgs::new(JoinType::Left)
            },
        )
        .collect()?;

    // month_name is not part of the join key (it is functionally dependent on
    // month_number), so the sales copy comes back suffixed; the forecast copy
    // is the canonical one.
    let duplicated_month = format!("{MONTH_NAME}{SALES_SUFFIX}");
    if joined.get_column_names().contains(&duplicated_month.as_str()) {
        joined = joined.drop(&duplicated_month)?;
    }

    let unmatched = joined.column(NET_SALES_USD)?.null_count();
    if unmatched > 0 {
        warn!("Forecast rows without matching sales: {}", unmatched);
    }

    let joined_names: Vec<String> = joined
        .get_column_names()
        .iter()
        .map(|n| n.to_string())
        .collect();
    let zero_fill: Vec<Expr> = SALES_MEASURES
        .iter()
        .filter(|m| joined_names.iter().any(|n| n.as_str() == **m))
        .map(|m| col(m).fill_null(lit(0.0)))
        .collect();

    let compared = joined
        .lazy()
        .with_columns(zero_fill)
        .with_columns([
            (col(NET_SALES_USD) - col(FORECAST_USD)).alias(USD_DELTA),
            (col(NET_SALES_KG) - col(FORECAST_KG)).alias(KG_DELTA),
            when(col(FORECAST_USD).eq(lit(0.0)))
                .then(lit(0.0))
                .otherwise(col(NET_SALES_USD) / col(FORECAST_USD))
                .round(4)
                .alias(USD_ATTAINMENT),
            when(col(FORECAST_KG).eq(lit(0.0)))
                .then(lit(0.0))
                .otherwise(col(NET_SALES_KG) / col(FORECAST_KG))
                .round(4)
                .alias(KG_ATTAINMENT),
        ])
        .with_columns([
            dtype_cols(&[DataType::Float64]).fill_null(lit(0.0)),
            dtype_cols(&[DataType::Int64]).fill_null(lit(0i64)),
        ])
        .collect()?;

    Ok(compared)
}
