//! Run-scoped pipeline configuration.
//!
//! Built once from the environment at startup and passed explicitly into each
//! job; nothing reads the environment after construction.

use crate::error::{EtlError, Result};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory backing the object store bucket.
    pub bucket_dir: PathBuf,
    /// Directory backing the warehouse tables.
    pub warehouse_dir: PathBuf,
    /// Directory backing the mailbox (one subdirectory per message).
    pub inbox_dir: PathBuf,
    /// Scratch directory for decoded attachments.
    pub temp_dir: PathBuf,
    /// Subject substring filter for the mailbox search.
    pub subject_filter: String,
    /// Sender address filter for the mailbox search.
    pub sender_filter: String,
    /// Blob name of the forecast spreadsheet.
    pub forecast_file: String,
    /// Blob name of the sales spreadsheet.
    pub sales_file: String,
    /// The single fiscal year this pipeline is hard-wired to.
    pub fiscal_year: i64,
    /// Destination table for cleaned sales facts.
    pub sales_table: String,
    /// Destination table for the reconciliation result.
    pub comparison_table: String,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl PipelineConfig {
    /// Read the configuration from the environment, with the fixed defaults
    /// of the known deployment where a variable is unset.
    pub fn from_env() -> Result<Self> {
        let fiscal_year = var_or("FISCAL_YEAR", "2025")
            .parse::<i64>()
            .map_err(|e| EtlError::Config(format!("FISCAL_YEAR is not a number: {e}")))?;

        Ok(Self {
            bucket_dir: PathBuf::from(var_or("BUCKET_PATH", "bucket")),
            warehouse_dir: PathBuf::from(var_or("WAREHOUSE_PATH", "warehouse")),
            inbox_dir: PathBuf::from(var_or("INBOX_PATH", "inbox")),
            temp_dir: PathBuf::from(var_or("TEMP_DIR", "temp_files")),
            subject_filter: var_or("FILTER_SUBJECT", "Probando"),
            sender_filter: var_or("FILTER_SENDER", "esteban03co@gmail.com"),
            forecast_file: var_or("FORECAST_FILE", "PPTO CAM 2025.xlsx"),
            sales_file: var_or("SALES_FILE", "VENTAS CAM 2024 - 2025.xlsx"),
            fiscal_year,
            sales_table: var_or("SALES_TABLE", "sales_table"),
            comparison_table: var_or("COMPARISON_TABLE", "sales_vs_forecast_2025"),
        })
    }
}
