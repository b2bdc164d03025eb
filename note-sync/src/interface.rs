//! Traits for interfacing the sync engine with its external collaborators.
//!
//! All collaborators are injected capabilities: the engine holds no ambient
//! or global state, so tests can supply deterministic implementations.

use std::error::Error;
use std::future::Future;

use crate::keys::{PrivateKey, PublicKey};
use crate::primitives::{Address, BlockNumber, Fr, NoteCandidate, NoteRecord, Nullifier, TxRecord};

/// Cryptographic primitives consumed by the engine.
///
/// Implementations must be pure and stateless from the engine's perspective:
/// the same inputs always yield the same outputs.
pub trait NoteCrypto {
    /// Handle to the elliptic curve used for log decryption.
    type Curve;
    /// Errors from nullifier derivation or siloing.
    type Error: Error + Send + Sync + 'static;

    /// Attempts to decrypt a raw encrypted log buffer with the given key.
    ///
    /// Returns `None` when the log is not addressed to the key. This is the
    /// expected outcome for the overwhelming majority of logs and is not an
    /// error.
    fn try_decrypt(
        &self,
        log: &[u8],
        private_key: &PrivateKey,
        curve: &Self::Curve,
    ) -> Option<NoteCandidate>;

    /// Computes the raw nullifier for a note from its owning contract,
    /// storage slot and preimage.
    fn compute_raw_nullifier(
        &self,
        contract_address: Address,
        storage_slot: Fr,
        preimage: &[Fr],
    ) -> Result<Fr, Self::Error>;

    /// Silos a raw nullifier against its owning contract address.
    fn silo_nullifier(
        &self,
        contract_address: Address,
        raw_nullifier: Fr,
    ) -> Result<Nullifier, Self::Error>;
}

/// Private key custody.
pub trait KeySource {
    /// Errors from key lookup.
    type Error: Error + Send + Sync + 'static;

    /// Returns the private key for a public key known to this source.
    ///
    /// Must return an error if the key is unknown; the engine treats this as
    /// fatal for the batch being processed.
    fn get_private_key(&self, public_key: &PublicKey) -> Result<PrivateKey, Self::Error>;
}

/// Persistent store for note and transaction records.
///
/// Each method must be atomic at the store level: a call either fully commits
/// or fully rejects. Inserting an already-present note or transaction must
/// not duplicate it; the engine relies on this for safe batch retry.
pub trait NoteStore {
    /// Errors from persistence operations.
    type Error: Error + Send + Sync + 'static;

    /// Persists a batch of note records.
    fn add_notes(&mut self, notes: Vec<NoteRecord>) -> Result<(), Self::Error>;

    /// Persists a batch of transaction records.
    fn add_transactions(&mut self, txs: Vec<TxRecord>) -> Result<(), Self::Error>;

    /// Removes every stored note owned by `owner` whose nullifier appears in
    /// `nullifiers`, returning exactly the records removed.
    fn remove_nullified(
        &mut self,
        nullifiers: &[Nullifier],
        owner: &PublicKey,
    ) -> Result<Vec<NoteRecord>, Self::Error>;
}

/// Source-of-truth block feed.
///
/// The engine is handed blocks per `process` call and never fetches them; the
/// only surface it consumes directly is the chain-tip accessor, served behind
/// the [`crate::client::fetch::fetch`] task.
pub trait BlockFeed {
    /// Errors from feed queries.
    type Error: Error + Send + Sync + 'static;

    /// Returns the number of the latest block known to the feed.
    fn latest_block_number(
        &mut self,
    ) -> impl Future<Output = Result<BlockNumber, Self::Error>> + Send;
}
