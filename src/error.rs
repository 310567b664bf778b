use thiserror::Error;

/// Errors raised by the ledger library
///
/// Coercion of individual cells never fails (bad cells become empty), so
/// everything here comes from I/O, the backing worksheets, or rendering.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Worksheet not found: {name}")]
    MissingWorksheet { name: String },

    #[error("Invalid worksheet name: {name:?}")]
    InvalidWorksheetName { name: String },

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] bincode::Error),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Chart rendering failed: {0}")]
    Chart(String),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
