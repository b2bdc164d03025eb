//! Entrypoint for the sync engine
//!
//! [`NoteSyncEngine::process`] turns a contiguous batch of blocks and their
//! encrypted logs into a reconciled local note set and advances the sync
//! watermark exactly once per successful batch.

use tokio::sync::mpsc::UnboundedSender;

use crate::client::{get_chain_height, FetchRequest};
use crate::error::SyncError;
use crate::interface::{KeySource, NoteCrypto, NoteStore};
use crate::keys::PublicKey;
use crate::primitives::{
    Address, BlockContext, BlockNumber, EncryptedBlockLogs, NoteRecord, Nullifier, SyncState,
    TxRecord,
};
use crate::scan::{check_continuity, scan_block, BlockScanData};

/// The private note synchronization engine for a single user key.
///
/// One engine instance tracks the notes of one owner. A single instance must
/// not have two `process` calls in flight; `&mut self` enforces this for one
/// engine value, and the caller must not share an engine across concurrent
/// sync loops.
pub struct NoteSyncEngine<C, K>
where
    C: NoteCrypto,
    K: KeySource,
{
    crypto: C,
    curve: C::Curve,
    key_source: K,
    owner: PublicKey,
    /// Account address recorded as the origin of the owner's transactions.
    account_address: Address,
    sync_state: SyncState,
    fetch_request_sender: UnboundedSender<FetchRequest>,
}

impl<C, K> NoteSyncEngine<C, K>
where
    C: NoteCrypto + Sync,
    C::Curve: Sync,
    K: KeySource,
{
    /// Creates an engine for `owner`, with all collaborators injected.
    pub fn new(
        crypto: C,
        curve: C::Curve,
        key_source: K,
        owner: PublicKey,
        account_address: Address,
        fetch_request_sender: UnboundedSender<FetchRequest>,
    ) -> Self {
        Self {
            crypto,
            curve,
            key_source,
            owner,
            account_address,
            sync_state: SyncState::new(),
            fetch_request_sender,
        }
    }

    /// Highest block number whose effects are fully durable in the store.
    pub fn synced_to_block(&self) -> BlockNumber {
        self.sync_state.synced_to_block()
    }

    /// Processes a contiguous batch of blocks and their encrypted logs.
    ///
    /// Scans every log, persists the owner's new notes and pertaining
    /// transactions, removes notes nullified anywhere in the batch (including
    /// notes the batch itself created) and finally advances the watermark to
    /// the last block number.
    ///
    /// Any failure aborts the whole batch without advancing the watermark.
    /// Re-submitting the identical batch is safe, as all results are
    /// re-derived from block content and the store's inserts are idempotent.
    pub fn process<S>(
        &mut self,
        store: &mut S,
        blocks: &[BlockContext],
        logs: &[EncryptedBlockLogs],
    ) -> Result<(), SyncError>
    where
        S: NoteStore,
    {
        if blocks.len() != logs.len() {
            return Err(SyncError::BatchShape {
                blocks: blocks.len(),
                logs: logs.len(),
            });
        }
        let Some(last_block) = blocks.last() else {
            return Ok(());
        };

        check_continuity(blocks).map_err(crate::scan::error::ScanError::from)?;

        tracing::info!(
            "Processing batch of {} blocks ending at {}.",
            blocks.len(),
            last_block.block_number()
        );

        let private_key = self
            .key_source
            .get_private_key(&self.owner)
            .map_err(|source| SyncError::KeySource(Box::new(source)))?;

        let mut batch_notes: Vec<NoteRecord> = Vec::new();
        let mut batch_txs: Vec<TxRecord> = Vec::new();
        let mut batch_nullifiers: Vec<Nullifier> = Vec::new();
        for (block, block_logs) in blocks.iter().zip(logs.iter()) {
            let scan_data = scan_block(
                &self.crypto,
                &self.curve,
                &private_key,
                self.owner,
                block,
                block_logs,
            )?;

            tracing::debug!(
                "Block {}: {} notes, {} pertaining transactions.",
                block.block_number(),
                scan_data.notes.len(),
                scan_data.pertaining_tx_indices.len()
            );

            batch_txs.extend(self.build_tx_records(block, &scan_data));
            batch_notes.extend(scan_data.notes);
            batch_nullifiers.extend_from_slice(block.nullifiers());
        }

        // persistence order matters: notes and transactions must be durable
        // before removal, so a same-batch spend evicts the note it targets
        store
            .add_notes(batch_notes)
            .map_err(|source| SyncError::Store(Box::new(source)))?;
        store
            .add_transactions(batch_txs)
            .map_err(|source| SyncError::Store(Box::new(source)))?;
        let removed = store
            .remove_nullified(&batch_nullifiers, &self.owner)
            .map_err(|source| SyncError::Store(Box::new(source)))?;

        if !removed.is_empty() {
            tracing::debug!("Removed {} nullified notes.", removed.len());
        }

        self.sync_state.advance_to(last_block.block_number());
        tracing::info!("Synced to block {}.", self.sync_state.synced_to_block());

        Ok(())
    }

    /// Compares the watermark against a freshly queried chain tip.
    ///
    /// A point-in-time check; a new block may appear immediately after.
    /// Requires [`crate::client::fetch::fetch`] to be running concurrently,
    /// connected via the engine's fetch request channel.
    pub async fn is_synchronized(&self) -> Result<bool, SyncError> {
        let chain_height = get_chain_height(self.fetch_request_sender.clone()).await?;

        Ok(self.sync_state.synced_to_block() >= chain_height)
    }

    // builds a transaction record for every pertaining transaction of a
    // scanned block
    fn build_tx_records(&self, block: &BlockContext, scan_data: &BlockScanData) -> Vec<TxRecord> {
        scan_data
            .pertaining_tx_indices
            .iter()
            .map(|&tx_index| {
                // pertaining indices always originate from an owned note in
                // that transaction, so the deployment gate reduces to the
                // entry being present
                let deployed_contract = block
                    .deployed_contracts()
                    .get(tx_index)
                    .copied()
                    .flatten();

                TxRecord::from_parts(
                    block.tx_hashes()[tx_index],
                    block.block_hash(),
                    block.block_number(),
                    self.account_address,
                    deployed_contract,
                )
            })
            .collect()
    }
}
