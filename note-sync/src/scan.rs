//! Trial decryption and matching of encrypted block logs.
//!
//! One call to [`scan_block`] covers a single block: every raw log buffer is
//! trial-decrypted under the engine's key, matched candidates are enriched
//! with their siloed nullifiers and assigned their commitment tree leaf
//! indices.

use std::collections::HashSet;

use rayon::prelude::*;

use crate::interface::NoteCrypto;
use crate::keys::{PrivateKey, PublicKey};
use crate::primitives::{BlockContext, EncryptedBlockLogs, NoteRecord};

use self::error::{ContinuityError, ScanError};

pub mod error;

/// The outcome of scanning one block under the engine's key.
#[derive(Debug)]
pub(crate) struct BlockScanData {
    /// Matched notes in decryption order, nullifier-enriched.
    pub(crate) notes: Vec<NoteRecord>,
    /// Deduplicated, order-preserving indices of transactions that pertain
    /// to the engine's user.
    pub(crate) pertaining_tx_indices: Vec<usize>,
}

// A raw log buffer tagged with its position within the block.
struct IndexedLog<'a> {
    leaf_index: u64,
    tx_index: usize,
    buffer: &'a [u8],
}

// Flattens the nested per-transaction, per-function log structure into
// `(leaf index, tx index, buffer)` triples.
//
// Every log counts towards the running index whether or not it later
// decrypts, as the index encodes the note's position in the commitment tree.
fn indexed_logs(logs: &EncryptedBlockLogs, start_index: u64) -> Vec<IndexedLog<'_>> {
    let mut indexed = Vec::new();
    let mut leaf_index = start_index;
    for (tx_index, tx_logs) in logs.txs().iter().enumerate() {
        for function_logs in tx_logs.function_logs() {
            for buffer in function_logs.logs() {
                indexed.push(IndexedLog {
                    leaf_index,
                    tx_index,
                    buffer,
                });
                leaf_index += 1;
            }
        }
    }

    indexed
}

/// Scans a single block: trial-decrypts every log, derives and silos the
/// nullifier of every match and assigns leaf indices.
///
/// Decryption failure is the expected outcome for logs not addressed to the
/// key and is silently skipped. A nullifier derivation failure aborts the
/// scan.
pub(crate) fn scan_block<C>(
    crypto: &C,
    curve: &C::Curve,
    private_key: &PrivateKey,
    owner: PublicKey,
    block: &BlockContext,
    logs: &EncryptedBlockLogs,
) -> Result<BlockScanData, ScanError>
where
    C: NoteCrypto + Sync,
    C::Curve: Sync,
{
    check_log_shape(block, logs)?;

    let indexed = indexed_logs(logs, block.note_data_start_index());
    let log_count = indexed.len();

    // Trial decryption of independent logs has no data dependencies, so it
    // runs on the rayon pool; collect preserves input order.
    let matched: Vec<(u64, usize, crate::primitives::NoteCandidate)> = indexed
        .par_iter()
        .filter_map(|log| {
            crypto
                .try_decrypt(log.buffer, private_key, curve)
                .map(|candidate| (log.leaf_index, log.tx_index, candidate))
        })
        .collect();

    tracing::trace!(
        "Block {}: {} of {} logs matched.",
        block.block_number(),
        matched.len(),
        log_count
    );

    let mut notes = Vec::with_capacity(matched.len());
    let mut pertaining_tx_indices = Vec::new();
    let mut seen_tx_indices = HashSet::new();
    for (leaf_index, tx_index, candidate) in matched {
        let raw_nullifier = crypto
            .compute_raw_nullifier(
                candidate.contract_address(),
                candidate.storage_slot(),
                candidate.preimage(),
            )
            .map_err(|source| ScanError::NullifierDerivation {
                leaf_index,
                source: Box::new(source),
            })?;
        let nullifier = crypto
            .silo_nullifier(candidate.contract_address(), raw_nullifier)
            .map_err(|source| ScanError::NullifierDerivation {
                leaf_index,
                source: Box::new(source),
            })?;

        notes.push(NoteRecord::from_parts(candidate, nullifier, leaf_index, owner));

        // a transaction may carry several of the user's notes but appears
        // only once in the pertaining set
        if seen_tx_indices.insert(tx_index) {
            pertaining_tx_indices.push(tx_index);
        }
    }

    Ok(BlockScanData {
        notes,
        pertaining_tx_indices,
    })
}

/// Checks block-number continuity of a batch of block contexts.
pub(crate) fn check_continuity(blocks: &[BlockContext]) -> Result<(), ContinuityError> {
    for window in blocks.windows(2) {
        if window[1].block_number() != window[0].block_number().next() {
            return Err(ContinuityError::HeightDiscontinuity {
                block_number: window[1].block_number(),
                previous_block_number: window[0].block_number(),
            });
        }
    }

    Ok(())
}

// the per-transaction log groups must be index-aligned with the block's
// transactions for tx-index attribution to be meaningful
fn check_log_shape(block: &BlockContext, logs: &EncryptedBlockLogs) -> Result<(), ContinuityError> {
    if block.tx_hashes().len() != logs.txs().len() {
        return Err(ContinuityError::LogShapeMismatch {
            block_number: block.block_number(),
            block_hash: block.block_hash(),
            tx_count: block.tx_hashes().len(),
            log_group_count: logs.txs().len(),
        });
    }

    Ok(())
}
