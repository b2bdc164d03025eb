use std::error::Error;

use crate::primitives::{BlockHash, BlockNumber};

/// Errors that may occur while scanning a batch of blocks.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The batch is not a contiguous run of blocks.
    #[error("Continuity error. {0}")]
    Continuity(#[from] ContinuityError),
    /// The crypto adapter failed to derive a nullifier for a decrypted note.
    ///
    /// Fatal for the whole batch: silently dropping the note would leave an
    /// un-nullifiable phantom note in the store later.
    #[error("Nullifier derivation failed for note at leaf index {leaf_index}. {source}")]
    NullifierDerivation {
        /// Leaf index the failed note would have been assigned.
        leaf_index: u64,
        /// Underlying crypto adapter error.
        source: Box<dyn Error + Send + Sync>,
    },
}

/// Continuity violations within a batch of blocks.
#[derive(Debug, thiserror::Error)]
pub enum ContinuityError {
    /// Block numbers are not consecutive.
    #[error("Height discontinuity. Block with number {block_number} is not continuous with previous block number {previous_block_number}")]
    HeightDiscontinuity {
        /// Number of the offending block.
        block_number: BlockNumber,
        /// Number of the block that preceded it in the batch.
        previous_block_number: BlockNumber,
    },
    /// A block's log group count does not match its transaction count.
    #[error("Log shape mismatch. Block {block_number} ({block_hash}) has {tx_count} transactions but {log_group_count} log groups")]
    LogShapeMismatch {
        /// Number of the offending block.
        block_number: BlockNumber,
        /// Hash of the offending block.
        block_hash: BlockHash,
        /// Transactions declared by the block context.
        tx_count: usize,
        /// Per-transaction log groups supplied for the block.
        log_group_count: usize,
    },
}
