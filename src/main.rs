use anyhow::Result;
use clap::{Parser, Subcommand};
use sales_recon::config::PipelineConfig;
use sales_recon::mail::MaildirSource;
use sales_recon::pipeline::{EtlJob, IngestJob};
use sales_recon::storage::FsObjectStore;
use sales_recon::warehouse::ParquetWarehouse;
use tracing::info;

#[derive(Parser)]
#[command(name = "sales-recon")]
#[command(about = "Spreadsheet ingestion and forecast-vs-sales reconciliation pipeline")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Move spreadsheet attachments from the mailbox into the object store
    Ingest,
    /// Run the ETL batch: extract, clean, aggregate, reconcile, load
    Etl,
    /// Ingest followed by the ETL batch
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = PipelineConfig::from_env()?;

    let store = FsObjectStore::new(&config.bucket_dir);
    let source = MaildirSource::new(&config.inbox_dir, &config.temp_dir);
    let sink = ParquetWarehouse::new(&config.warehouse_dir);

    match args.command {
        Command::Ingest => {
            let report = IngestJob::new(&source, &store, &config).run().await?;
            info!(
                "Ingest complete: {} uploaded, {} failed",
                report.uploaded, report.failed
            );
        }
        Command::Etl => {
            let report = EtlJob::new(&store, &sink, &config).run().await?;
            info!(
                "ETL complete: {} sales rows, {} comparison rows",
                report.sales_rows_loaded, report.comparison_rows_loaded
            );
        }
        Command::Run => {
            let ingest = IngestJob::new(&source, &store, &config).run().await?;
            info!(
                "Ingest complete: {} uploaded, {} failed",
                ingest.uploaded, ingest.failed
            );
            let etl = EtlJob::new(&store, &sink, &config).run().await?;
            info!(
                "ETL complete: {} sales rows, {} comparison rows",
                etl.sales_rows_loaded, etl.comparison_rows_loaded
            );
        }
    }

    Ok(())
}
