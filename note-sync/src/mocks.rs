//! Deterministic mock collaborators for engine tests.

use std::collections::HashMap;
use std::convert::Infallible;
use std::future::{ready, Future};

use crate::interface::{BlockFeed, KeySource, NoteCrypto, NoteStore};
use crate::keys::{PrivateKey, PublicKey};
use crate::primitives::{
    Address, BlockContext, BlockHash, BlockNumber, Fr, NoteCandidate, NoteRecord, Nullifier,
    TxHash, TxRecord,
};

const LOG_MAGIC: u8 = 0x4E;

/// Placeholder curve handle; the mock crypto never inspects it.
pub(crate) struct TestCurve;

#[derive(Debug, thiserror::Error)]
#[error("mock nullifier derivation failure")]
pub(crate) struct MockCryptoError;

/// Crypto adapter over a toy log format: a magic byte, the recipient key
/// bytes, then contract address, storage slot and a length-prefixed preimage.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockCrypto {
    fail_derivation: bool,
}

impl MockCrypto {
    /// An adapter whose nullifier derivation always fails.
    pub(crate) fn failing_derivation() -> Self {
        Self {
            fail_derivation: true,
        }
    }

    /// The nullifier the adapter would attach to the given note.
    pub(crate) fn nullifier_for(&self, contract: Address, slot: Fr, preimage: &[Fr]) -> Nullifier {
        let raw = self
            .compute_raw_nullifier(contract, slot, preimage)
            .expect("non-failing mock derivation");
        self.silo_nullifier(contract, raw)
            .expect("non-failing mock siloing")
    }
}

impl NoteCrypto for MockCrypto {
    type Curve = TestCurve;
    type Error = MockCryptoError;

    fn try_decrypt(
        &self,
        log: &[u8],
        private_key: &PrivateKey,
        _curve: &Self::Curve,
    ) -> Option<NoteCandidate> {
        if log.len() < 98 || log[0] != LOG_MAGIC {
            return None;
        }
        if log[1..33] != private_key.to_bytes() {
            return None;
        }

        let contract = Address::from_field(Fr::from_bytes(log[33..65].try_into().ok()?));
        let slot = Fr::from_bytes(log[65..97].try_into().ok()?);
        let preimage_len = usize::from(log[97]);
        if log.len() != 98 + preimage_len * 32 {
            return None;
        }
        let preimage = (0..preimage_len)
            .map(|i| {
                let start = 98 + i * 32;
                Fr::from_bytes(log[start..start + 32].try_into().expect("32-byte word"))
            })
            .collect();

        Some(NoteCandidate::from_parts(contract, slot, preimage))
    }

    fn compute_raw_nullifier(
        &self,
        contract_address: Address,
        storage_slot: Fr,
        preimage: &[Fr],
    ) -> Result<Fr, Self::Error> {
        if self.fail_derivation {
            return Err(MockCryptoError);
        }

        let mut bytes = contract_address.to_field().to_bytes();
        let slot = storage_slot.to_bytes();
        for (byte, slot_byte) in bytes.iter_mut().zip(slot) {
            *byte ^= slot_byte;
        }
        for (i, word) in preimage.iter().enumerate() {
            for (byte, word_byte) in bytes.iter_mut().zip(word.to_bytes()) {
                *byte ^= word_byte.wrapping_add(i as u8);
            }
        }

        Ok(Fr::from_bytes(bytes))
    }

    fn silo_nullifier(
        &self,
        contract_address: Address,
        raw_nullifier: Fr,
    ) -> Result<Nullifier, Self::Error> {
        let mut bytes = raw_nullifier.to_bytes();
        for (byte, contract_byte) in bytes.iter_mut().zip(contract_address.to_field().to_bytes()) {
            *byte ^= contract_byte ^ 0x5A;
        }

        Ok(Nullifier::from_field(Fr::from_bytes(bytes)))
    }
}

/// Encodes a log addressed to `private_key` in the mock format.
pub(crate) fn encrypted_log(
    private_key: &PrivateKey,
    contract: Address,
    slot: Fr,
    preimage: &[Fr],
) -> Vec<u8> {
    let mut log = vec![LOG_MAGIC];
    log.extend_from_slice(&private_key.to_bytes());
    log.extend_from_slice(&contract.to_field().to_bytes());
    log.extend_from_slice(&slot.to_bytes());
    log.push(u8::try_from(preimage.len()).expect("short preimage"));
    for word in preimage {
        log.extend_from_slice(&word.to_bytes());
    }

    log
}

/// A log no test key can decrypt.
pub(crate) fn random_foreign_log(seed: u8) -> Vec<u8> {
    vec![seed; 120]
}

/// Deterministic key pair; the mock crypto equates public and private bytes.
pub(crate) fn test_key_pair(seed: u8) -> (PrivateKey, PublicKey) {
    (
        PrivateKey::from_bytes([seed; 32]),
        PublicKey::from_bytes([seed; 32]),
    )
}

/// Block with `tx_count` transactions, none of which deploy contracts.
pub(crate) fn mock_block(
    number: u64,
    note_data_start_index: u64,
    tx_count: usize,
    nullifiers: Vec<Nullifier>,
) -> BlockContext {
    mock_block_with_deployments(
        number,
        note_data_start_index,
        vec![None; tx_count],
        nullifiers,
    )
}

/// Block whose transactions carry the given deployment entries.
pub(crate) fn mock_block_with_deployments(
    number: u64,
    note_data_start_index: u64,
    deployed_contracts: Vec<Option<Address>>,
    nullifiers: Vec<Nullifier>,
) -> BlockContext {
    let tx_hashes = (0..deployed_contracts.len())
        .map(|i| {
            let mut hash = [0u8; 32];
            hash[0] = number as u8;
            hash[1] = i as u8;
            TxHash(hash)
        })
        .collect();

    BlockContext::from_parts(
        BlockNumber::from_u64(number),
        BlockHash([number as u8; 32]),
        note_data_start_index,
        tx_hashes,
        deployed_contracts,
        nullifiers,
    )
}

/// Builds block logs from nested buffers: transactions, then function
/// groups, then raw logs.
pub(crate) fn mock_logs(txs: Vec<Vec<Vec<Vec<u8>>>>) -> crate::primitives::EncryptedBlockLogs {
    crate::primitives::EncryptedBlockLogs::from_parts(
        txs.into_iter()
            .map(|function_groups| {
                crate::primitives::TxEncryptedLogs::from_parts(
                    function_groups
                        .into_iter()
                        .map(crate::primitives::FunctionLogs::from_parts)
                        .collect(),
                )
            })
            .collect(),
    )
}

#[derive(Debug, thiserror::Error)]
#[error("unknown public key")]
pub(crate) struct UnknownKey;

/// Key source backed by a fixed map.
#[derive(Debug, Default)]
pub(crate) struct MockKeySource {
    keys: HashMap<[u8; 32], PrivateKey>,
}

impl MockKeySource {
    pub(crate) fn with_key(public_key: PublicKey, private_key: PrivateKey) -> Self {
        let mut keys = HashMap::new();
        keys.insert(public_key.to_bytes(), private_key);
        Self { keys }
    }

    pub(crate) fn empty() -> Self {
        Self::default()
    }
}

impl KeySource for MockKeySource {
    type Error = UnknownKey;

    fn get_private_key(&self, public_key: &PublicKey) -> Result<PrivateKey, Self::Error> {
        self.keys
            .get(&public_key.to_bytes())
            .cloned()
            .ok_or(UnknownKey)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("injected store failure")]
pub(crate) struct InjectedStoreFailure;

/// In-memory store with idempotent inserts and one-shot failure injection.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    notes: Vec<NoteRecord>,
    transactions: Vec<TxRecord>,
    fail_next_add_transactions: bool,
}

impl MemoryStore {
    pub(crate) fn notes(&self) -> &[NoteRecord] {
        &self.notes
    }

    pub(crate) fn transactions(&self) -> &[TxRecord] {
        &self.transactions
    }

    /// Makes the next `add_transactions` call fail, after which the store
    /// behaves normally again.
    pub(crate) fn fail_next_add_transactions(&mut self) {
        self.fail_next_add_transactions = true;
    }
}

impl NoteStore for MemoryStore {
    type Error = InjectedStoreFailure;

    fn add_notes(&mut self, notes: Vec<NoteRecord>) -> Result<(), Self::Error> {
        for note in notes {
            let present = self.notes.iter().any(|existing| {
                existing.nullifier() == note.nullifier()
                    && existing.leaf_index() == note.leaf_index()
            });
            if !present {
                self.notes.push(note);
            }
        }

        Ok(())
    }

    fn add_transactions(&mut self, txs: Vec<TxRecord>) -> Result<(), Self::Error> {
        if self.fail_next_add_transactions {
            self.fail_next_add_transactions = false;
            return Err(InjectedStoreFailure);
        }

        for tx in txs {
            let present = self
                .transactions
                .iter()
                .any(|existing| existing.tx_hash() == tx.tx_hash());
            if !present {
                self.transactions.push(tx);
            }
        }

        Ok(())
    }

    fn remove_nullified(
        &mut self,
        nullifiers: &[Nullifier],
        owner: &PublicKey,
    ) -> Result<Vec<NoteRecord>, Self::Error> {
        let mut removed = Vec::new();
        self.notes.retain(|note| {
            if note.owner() == *owner && nullifiers.contains(&note.nullifier()) {
                removed.push(note.clone());
                false
            } else {
                true
            }
        });

        Ok(removed)
    }
}

/// Block feed pinned at a fixed chain height.
pub(crate) struct FixedHeightFeed {
    height: BlockNumber,
}

impl FixedHeightFeed {
    pub(crate) fn at(height: u64) -> Self {
        Self {
            height: BlockNumber::from_u64(height),
        }
    }
}

impl BlockFeed for FixedHeightFeed {
    type Error = Infallible;

    fn latest_block_number(
        &mut self,
    ) -> impl Future<Output = Result<BlockNumber, Self::Error>> + Send {
        ready(Ok(self.height))
    }
}
