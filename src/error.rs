use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Object not found in store: {0}")]
    NotFound(String),

    #[error("Missing required columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    #[error("Remote call failed: {0}")]
    Remote(String),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

pub type Result<T> = std::result::Result<T, EtlError>;
