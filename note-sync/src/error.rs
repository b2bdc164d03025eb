//! Top level error module for the crate

use std::error::Error;

use crate::scan::error::ScanError;

/// Top level error enum encapsulating any error that may occur during sync
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The batch handed to `process` violated the input contract.
    #[error("Batch shape error. {blocks} block contexts but {logs} block log sets")]
    BatchShape {
        /// Number of block contexts supplied.
        blocks: usize,
        /// Number of encrypted log sets supplied.
        logs: usize,
    },
    /// Errors associated with scanning
    #[error("Scan error. {0}")]
    Scan(#[from] ScanError),
    /// The key source could not produce a private key for the engine's owner.
    #[error("Key source error. {0}")]
    KeySource(#[source] Box<dyn Error + Send + Sync>),
    /// A persistence operation failed; the batch was aborted and the
    /// watermark left unchanged.
    #[error("Store error. {0}")]
    Store(#[source] Box<dyn Error + Send + Sync>),
    /// The block feed could not be reached for a chain-tip query.
    #[error("Chain height unavailable. {0}")]
    ChainHeight(#[source] Box<dyn Error + Send + Sync>),
}
