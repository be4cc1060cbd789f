use std::path::PathBuf;

use thiserror::Error;

use crate::contract::ContractError;

/// Failures reading or writing the dedup ledger file.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failed to read ledger {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("ledger {path} is not a JSON array of strings: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write ledger {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failures that abort a publish or refresh run.
///
/// Notification failures never appear here: they are logged and dropped.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("failed to fetch source document: {0}")]
    Fetch(#[source] ContractError),
    #[error("failed to create record for {url}: {source}")]
    Create {
        url: String,
        #[source]
        source: ContractError,
    },
    #[error("failed to query existing records: {0}")]
    Query(#[source] ContractError),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
