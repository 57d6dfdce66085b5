//! Warehouse sink port: a table sink with truncate-and-replace semantics.

use crate::error::{EtlError, Result};
use async_trait::async_trait;
use polars::prelude::*;
use std::path::PathBuf;
use tracing::info;

#[async_trait]
pub trait WarehouseSink: Send + Sync {
    /// Replace the destination table's contents with the given rows.
    async fn load(&self, table: &str, df: &DataFrame) -> Result<()>;
}

/// Parquet-file warehouse: each table is `<root>/<table>.parquet`, rewritten
/// in full on every load.
pub struct ParquetWarehouse {
    root: PathBuf,
}

impl ParquetWarehouse {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.root.join(format!("{table}.parquet"))
    }
}

#[async_trait]
impl WarehouseSink for ParquetWarehouse {
    async fn load(&self, table: &str, df: &DataFrame) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.table_path(table);

        info!("Loading {} rows into table '{}'", df.height(), table);
        let mut file = std::fs::File::create(&path)
            .map_err(|e| EtlError::Remote(format!("Cannot open table '{table}': {e}")))?;
        ParquetWriter::new(&mut file)
            .finish(&mut df.clone())
            .map_err(|e| EtlError::Remote(format!("Load into '{table}' failed: {e}")))?;

        info!("Table '{}' replaced successfully", table);
        Ok(())
    }
}
