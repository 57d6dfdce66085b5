//! Pipeline orchestration: ingestion of mailbox attachments into the object
//! store, and the ETL run from object store to warehouse.

use crate::compare::reconcile;
use crate::config::PipelineConfig;
use crate::eda;
use crate::error::Result;
use crate::forecast::{aggregate_forecast, clean_forecast};
use crate::mail::{AttachmentSource, MailFilter};
use crate::sales::{aggregate_sales, clean_sales};
use crate::schema::{NET_SALES_KG, NET_SALES_USD};
use crate::sheet::{read_sheet, FORECAST_LAYOUT, SALES_LAYOUT};
use crate::storage::ObjectStore;
use crate::warehouse::WarehouseSink;
use crate::{schema, sheet::SheetLayout};
use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Outcome of one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub messages: usize,
    pub uploaded: usize,
    pub failed: usize,
}

/// Moves spreadsheet attachments from the mailbox into the object store.
pub struct IngestJob<'a> {
    source: &'a dyn AttachmentSource,
    store: &'a dyn ObjectStore,
    config: &'a PipelineConfig,
}

impl<'a> IngestJob<'a> {
    pub fn new(
        source: &'a dyn AttachmentSource,
        store: &'a dyn ObjectStore,
        config: &'a PipelineConfig,
    ) -> Self {
        Self {
            source,
            store,
            config,
        }
    }

    /// Search the mailbox and upload every attachment, one file at a time.
    ///
    /// A failed upload is logged and skipped; the loop continues with the next
    /// attachment and nothing already uploaded is rolled back. The local copy
    /// of an attachment is removed only after its upload succeeded.
    pub async fn run(&self) -> Result<IngestReport> {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        info!("Ingest run {} starting", run_id);

        let filter = MailFilter {
            subject: self.config.subject_filter.clone(),
            sender: self.config.sender_filter.clone(),
        };
        let messages = self.source.search(&filter).await?;
        if messages.is_empty() {
            warn!("No messages matched subject '{}' from '{}'", filter.subject, filter.sender);
        }

        let mut uploaded = 0usize;
        let mut failed = 0usize;
        for message_id in &messages {
            info!("Processing message {}", message_id);
            let attachments = self.source.download_attachments(message_id).await?;
            for path in attachments {
                match self.store.write(&path).await {
                    Ok(()) => {
                        uploaded += 1;
                        if let Err(e) = tokio::fs::remove_file(&path).await {
                            error!("Could not remove local file {}: {}", path.display(), e);
                        } else {
                            info!("Uploaded and removed local file {}", path.display());
                        }
                    }
                    Err(e) => {
                        error!("Upload failed for {}: {}", path.display(), e);
                        failed += 1;
                    }
                }
            }
        }

        info!(
            "Ingest run {} finished: {} messages, {} uploaded, {} failed",
            run_id,
            messages.len(),
            uploaded,
            failed
        );
        Ok(IngestReport {
            run_id,
            started_at,
            messages: messages.len(),
            uploaded,
            failed,
        })
    }
}

/// Outcome of one ETL run.
#[derive(Debug, Clone)]
pub struct EtlReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub sales_rows_loaded: usize,
    pub comparison_rows_loaded: usize,
}

/// Runs extraction, cleaning, aggregation, reconciliation, and loading.
pub struct EtlJob<'a> {
    store: &'a dyn ObjectStore,
    sink: &'a dyn WarehouseSink,
    config: &'a PipelineConfig,
}

impl<'a> EtlJob<'a> {
    pub fn new(
        store: &'a dyn ObjectStore,
        sink: &'a dyn WarehouseSink,
        config: &'a PipelineConfig,
    ) -> Self {
        Self {
            store,
            sink,
            config,
        }
    }

    async fn extract(&self, filename: &str, layout: &SheetLayout) -> Result<DataFrame> {
        let bytes = self.store.read(filename).await?;
        read_sheet(&bytes, layout)
    }

    /// The full batch: both files are re-extracted and both destination tables
    /// rewritten on every run.
    pub async fn run(&self) -> Result<EtlReport> {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        info!("ETL run {} starting", run_id);

        info!("Extracting and cleaning source files");
        let forecast_raw = self.extract(&self.config.forecast_file, &FORECAST_LAYOUT).await?;
        let forecast = clean_forecast(forecast_raw)?;

        let sales_raw = self.extract(&self.config.sales_file, &SALES_LAYOUT).await?;
        let sales = clean_sales(sales_raw)?;

        eda::log_diagnostics(&forecast, "forecast");
        eda::log_diagnostics(&sales, "sales");

        validate_inputs(&forecast, &sales)?;

        let forecast_agg = aggregate_forecast(forecast, self.config.fiscal_year)?;
        let sales_agg = aggregate_sales(sales.clone())?;

        let compared = reconcile(forecast_agg, sales_agg, self.config.fiscal_year)?;

        info!("Loading warehouse tables");
        self.sink.load(&self.config.sales_table, &sales).await?;
        self.sink.load(&self.config.comparison_table, &compared).await?;

        info!(
            "ETL run {} finished: {} sales rows, {} comparison rows",
            run_id,
            sales.height(),
            compared.height()
        );
        Ok(EtlReport {
            run_id,
            started_at,
            sales_rows_loaded: sales.height(),
            comparison_rows_loaded: compared.height(),
        })
    }
}

/// Pipeline-level check that the cleaned inputs carry the measures the rest
/// of the run depends on. Fails before any aggregation work starts.
fn validate_inputs(forecast: &DataFrame, sales: &DataFrame) -> Result<()> {
    schema::ensure_columns(forecast, &[schema::FORECAST_USD, schema::FORECAST_KG])?;
    schema::ensure_columns(sales, &[NET_SALES_USD, NET_SALES_KG])?;
    info!("Input validation passed");
    Ok(())
}
