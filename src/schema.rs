//! Fixed column schema shared by the forecast and sales datasets.
//!
//! Raw headers arrive in Spanish from the source spreadsheets; after header
//! normalization they are renamed to the canonical names below. Everything
//! downstream (harmonization, aggregation, reconciliation) speaks canonical
//! names only.

use crate::error::{EtlError, Result};
use itertools::Itertools;
use lazy_static::lazy_static;
use polars::prelude::DataFrame;
use std::collections::HashMap;

// Composite business key
pub const YEAR: &str = "year";
pub const MONTH_NUMBER: &str = "month_number";
pub const MONTH_NAME: &str = "month_name";
pub const COUNTRY: &str = "country";
pub const BUSINESS_UNIT: &str = "business_unit";
pub const CATEGORY: &str = "category";
pub const BRAND: &str = "brand";
pub const SUB_BRAND: &str = "sub_brand";
pub const MATERIAL_CODE: &str = "material_code";
pub const MATERIAL_DESCRIPTION: &str = "material_description";

// Forecast measures
pub const FORECAST_USD: &str = "forecast_usd";
pub const FORECAST_KG: &str = "forecast_kg";

// Sales measures
pub const GROSS_SALES_USD: &str = "gross_sales_usd";
pub const NET_SALES_USD: &str = "net_sales_usd";
pub const NET_SALES_KG: &str = "net_sales_kg";
pub const NET_SALES_UNITS: &str = "net_sales_units";
pub const RETURNS_USD: &str = "returns_usd";
pub const DISCOUNT_USD: &str = "discount_usd";
pub const DISCOUNT_PCT: &str = "discount_pct";
pub const RETURN_PCT: &str = "return_pct";

// Reconciliation output
pub const USD_DELTA: &str = "usd_delta";
pub const KG_DELTA: &str = "kg_delta";
pub const USD_ATTAINMENT: &str = "usd_attainment";
pub const KG_ATTAINMENT: &str = "kg_attainment";

/// The 10-field composite business key used for aggregation.
pub const COMPOSITE_KEY: [&str; 10] = [
    YEAR,
    MONTH_NUMBER,
    MONTH_NAME,
    COUNTRY,
    BUSINESS_UNIT,
    CATEGORY,
    BRAND,
    SUB_BRAND,
    MATERIAL_CODE,
    MATERIAL_DESCRIPTION,
];

/// Join key for reconciliation: the composite key minus `month_name`, which is
/// functionally dependent on `month_number` and would otherwise collide across
/// the two sides of the join.
pub const JOIN_KEY: [&str; 9] = [
    YEAR,
    MONTH_NUMBER,
    COUNTRY,
    BUSINESS_UNIT,
    CATEGORY,
    BRAND,
    SUB_BRAND,
    MATERIAL_CODE,
    MATERIAL_DESCRIPTION,
];

/// Columns coerced to lowercase stripped text.
pub const STRING_COLUMNS: [&str; 8] = [
    MONTH_NAME,
    COUNTRY,
    BUSINESS_UNIT,
    CATEGORY,
    BRAND,
    SUB_BRAND,
    MATERIAL_CODE,
    MATERIAL_DESCRIPTION,
];

/// Columns coerced to nullable Int64 with nulls filled as 0.
pub const INTEGER_COLUMNS: [&str; 2] = [YEAR, MONTH_NUMBER];

/// Columns coerced to Float64; failed parses become null and stay null.
pub const FLOAT_COLUMNS: [&str; 10] = [
    FORECAST_USD,
    FORECAST_KG,
    GROSS_SALES_USD,
    NET_SALES_USD,
    NET_SALES_KG,
    NET_SALES_UNITS,
    RETURNS_USD,
    DISCOUNT_USD,
    DISCOUNT_PCT,
    RETURN_PCT,
];

/// Normalized raw header -> canonical name, forecast file.
pub const FORECAST_RENAMES: [(&str, &str); 10] = [
    ("mes", MONTH_NAME),
    ("pais", COUNTRY),
    ("negocio", BUSINESS_UNIT),
    ("categoria", CATEGORY),
    ("marca", BRAND),
    ("sub_marca", SUB_BRAND),
    ("codigo_material", MATERIAL_CODE),
    ("descripcion_material", MATERIAL_DESCRIPTION),
    ("ppto_usd", FORECAST_USD),
    ("ppto_kg", FORECAST_KG),
];

/// Normalized raw header -> canonical name, sales file.
pub const SALES_RENAMES: [(&str, &str); 15] = [
    ("ano", YEAR),
    ("mes_numero", MONTH_NUMBER),
    ("mes_nombre", MONTH_NAME),
    ("pais", COUNTRY),
    ("negocio", BUSINESS_UNIT),
    ("categoria", CATEGORY),
    ("marca", BRAND),
    ("sub_marca", SUB_BRAND),
    ("codigo_material", MATERIAL_CODE),
    ("descripcion_material", MATERIAL_DESCRIPTION),
    ("venta_bruta_usd", GROSS_SALES_USD),
    ("venta_neta_usd", NET_SALES_USD),
    ("venta_neta_kilos", NET_SALES_KG),
    ("venta_unidades", NET_SALES_UNITS),
    ("devoluciones_usd", RETURNS_USD),
];

/// Junk columns produced by the known export layouts (banner rows, unnamed
/// spill columns). Dropped if present, ignored if not.
pub const UNWANTED_COLUMNS: [&str; 2] = ["unnamed:_1", "nan"];

lazy_static! {
    /// Fixed 12-entry lookup from lowercase Spanish month name to month number.
    pub static ref MONTH_NUMBERS: HashMap<&'static str, i64> = {
        let mut m = HashMap::new();
        m.insert("enero", 1);
        m.insert("febrero", 2);
        m.insert("marzo", 3);
        m.insert("abril", 4);
        m.insert("mayo", 5);
        m.insert("junio", 6);
        m.insert("julio", 7);
        m.insert("agosto", 8);
        m.insert("septiembre", 9);
        m.insert("octubre", 10);
        m.insert("noviembre", 11);
        m.insert("diciembre", 12);
        m
    };
}

/// Month number for a (lowercased, stripped) month name; None when unmapped.
pub fn month_number(name: &str) -> Option<i64> {
    MONTH_NUMBERS.get(name.trim()).copied()
}

/// Rename normalized raw headers to canonical names. Raw names missing from
/// the frame are skipped; columns outside the map pass through untouched.
pub fn rename_to_canonical(mut df: DataFrame, renames: &[(&str, &str)]) -> Result<DataFrame> {
    for (raw, canonical) in renames {
        if df.get_column_names().contains(raw) {
            df.rename(raw, canonical)?;
        }
    }
    Ok(df)
}

/// Validate that every required column is present, failing with the full list
/// of missing names so a bad export surfaces all problems at once.
pub fn ensure_columns(df: &DataFrame, required: &[&str]) -> Result<()> {
    let present = df.get_column_names();
    let missing: Vec<String> = required
        .iter()
        .filter(|c| !present.contains(*c))
        .map(|c| c.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        tracing::error!("Required columns absent: {}", missing.iter().join(", "));
        Err(EtlError::Schema { missing })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;

    #[test]
    fn month_lookup_covers_all_twelve() {
        assert_eq!(month_number("enero"), Some(1));
        assert_eq!(month_number("diciembre"), Some(12));
        assert_eq!(month_number(" marzo "), Some(3));
        assert_eq!(month_number("january"), None);
    }

    #[test]
    fn rename_skips_missing_raw_columns() {
        let df = df!["pais" => ["co"], "extra" => ["x"]].unwrap();
        let renamed = rename_to_canonical(df, &FORECAST_RENAMES).unwrap();
        let names = renamed.get_column_names();
        assert!(names.contains(&COUNTRY));
        assert!(names.contains(&"extra"));
    }

    #[test]
    fn ensure_columns_reports_every_missing_name() {
        let df = df![YEAR => [2025i64]].unwrap();
        let err = ensure_columns(&df, &[YEAR, FORECAST_USD, FORECAST_KG]).unwrap_err();
        match err {
            EtlError::Schema { missing } => {
                assert_eq!(missing, vec![FORECAST_USD.to_string(), FORECAST_KG.to_string()]);
            }
            other => panic!("expected schema error, got {other}"),
        }
    }
}
