//! Module for primitive structs associated with the sync engine

use std::fmt;

use getset::{CopyGetters, Getters};

use crate::keys::PublicKey;

/// An opaque field element of the ledger's native field.
///
/// The engine never interprets field elements; they are produced and consumed
/// by the injected crypto adapter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fr([u8; 32]);

impl Fr {
    /// The zero field element.
    pub const ZERO: Fr = Fr([0u8; 32]);

    /// Creates a field element from its canonical byte representation.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Fr(bytes)
    }

    /// Returns the canonical byte representation.
    pub fn to_bytes(self) -> [u8; 32] {
        self.0
    }
}

impl fmt::Display for Fr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Fr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fr({})", self)
    }
}

/// A contract or account address, a field element in the ledger's address space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(Fr);

impl Address {
    /// The zero address, used on-chain as "no contract deployed".
    pub const ZERO: Address = Address(Fr::ZERO);

    /// Creates an address from its underlying field element.
    pub fn from_field(field: Fr) -> Self {
        Address(field)
    }

    /// Returns the underlying field element.
    pub fn to_field(self) -> Fr {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A nullifier, the unique identifier published on-chain when a note is spent.
///
/// The sole join key between an on-chain spend and a locally stored note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Nullifier(Fr);

impl Nullifier {
    /// Creates a nullifier from its underlying field element.
    pub fn from_field(field: Fr) -> Self {
        Nullifier(field)
    }

    /// Returns the underlying field element.
    pub fn to_field(self) -> Fr {
        self.0
    }
}

impl fmt::Display for Nullifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hash of a block.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockHash(pub [u8; 32]);

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({})", self)
    }
}

/// Hash of a transaction.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash(pub [u8; 32]);

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self)
    }
}

/// A block number.
///
/// Block 0 is a sentinel meaning "no blocks processed"; the first real block
/// the feed produces is block 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockNumber(u64);

impl BlockNumber {
    /// Watermark value before any block has been processed.
    pub const NONE: BlockNumber = BlockNumber(0);

    /// Creates a block number.
    pub fn from_u64(number: u64) -> Self {
        BlockNumber(number)
    }

    /// The number of the block immediately after this one.
    pub fn next(self) -> Self {
        BlockNumber(self.0 + 1)
    }
}

impl From<BlockNumber> for u64 {
    fn from(number: BlockNumber) -> u64 {
        number.0
    }
}

impl fmt::Display for BlockNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-block context produced by the block feed.
///
/// Consumed by reference for the duration of one `process` call; the engine
/// never mutates or retains it.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct BlockContext {
    #[getset(get_copy = "pub")]
    block_number: BlockNumber,
    #[getset(get_copy = "pub")]
    block_hash: BlockHash,
    /// Leaf index in the note commitment tree of the first note in this block.
    #[getset(get_copy = "pub")]
    note_data_start_index: u64,
    #[getset(skip)]
    tx_hashes: Vec<TxHash>,
    /// Per-transaction first deployed contract, index-aligned with `tx_hashes`.
    #[getset(skip)]
    deployed_contracts: Vec<Option<Address>>,
    #[getset(skip)]
    nullifiers: Vec<Nullifier>,
}

impl BlockContext {
    /// Creates a block context from parts.
    pub fn from_parts(
        block_number: BlockNumber,
        block_hash: BlockHash,
        note_data_start_index: u64,
        tx_hashes: Vec<TxHash>,
        deployed_contracts: Vec<Option<Address>>,
        nullifiers: Vec<Nullifier>,
    ) -> Self {
        Self {
            block_number,
            block_hash,
            note_data_start_index,
            tx_hashes,
            deployed_contracts,
            nullifiers,
        }
    }

    /// Ordered transaction hashes of the block.
    pub fn tx_hashes(&self) -> &[TxHash] {
        &self.tx_hashes
    }

    /// Per-transaction first deployed contract address, if any.
    pub fn deployed_contracts(&self) -> &[Option<Address>] {
        &self.deployed_contracts
    }

    /// Nullifiers newly revealed in this block, in on-chain order.
    pub fn nullifiers(&self) -> &[Nullifier] {
        &self.nullifiers
    }
}

/// The encrypted logs of a single block, index-aligned with the block's
/// transactions.
///
/// The nested ordering is significant: a note's leaf index is derived from
/// its log's position within the whole block, so logs must always be iterated
/// in the same nested order.
#[derive(Debug, Clone, Default)]
pub struct EncryptedBlockLogs {
    txs: Vec<TxEncryptedLogs>,
}

impl EncryptedBlockLogs {
    /// Creates block logs from per-transaction log groups.
    pub fn from_parts(txs: Vec<TxEncryptedLogs>) -> Self {
        Self { txs }
    }

    /// Per-transaction log groups, in transaction order.
    pub fn txs(&self) -> &[TxEncryptedLogs] {
        &self.txs
    }
}

/// The encrypted logs emitted by one transaction, grouped by function call.
#[derive(Debug, Clone, Default)]
pub struct TxEncryptedLogs {
    function_logs: Vec<FunctionLogs>,
}

impl TxEncryptedLogs {
    /// Creates transaction logs from per-function log groups.
    pub fn from_parts(function_logs: Vec<FunctionLogs>) -> Self {
        Self { function_logs }
    }

    /// Per-function log groups, in call order.
    pub fn function_logs(&self) -> &[FunctionLogs] {
        &self.function_logs
    }
}

/// The raw encrypted log buffers emitted by one function call.
#[derive(Debug, Clone, Default)]
pub struct FunctionLogs {
    logs: Vec<Vec<u8>>,
}

impl FunctionLogs {
    /// Creates a function log group from raw buffers.
    pub fn from_parts(logs: Vec<Vec<u8>>) -> Self {
        Self { logs }
    }

    /// Raw encrypted buffers, in emission order.
    pub fn logs(&self) -> &[Vec<u8>] {
        &self.logs
    }
}

/// A successfully decrypted note payload.
///
/// Ephemeral; exists only inside one `process` call until promoted to a
/// [`NoteRecord`] or discarded.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct NoteCandidate {
    #[getset(get_copy = "pub")]
    contract_address: Address,
    #[getset(get_copy = "pub")]
    storage_slot: Fr,
    #[getset(skip)]
    preimage: Vec<Fr>,
}

impl NoteCandidate {
    /// Creates a note candidate from parts.
    pub fn from_parts(contract_address: Address, storage_slot: Fr, preimage: Vec<Fr>) -> Self {
        Self {
            contract_address,
            storage_slot,
            preimage,
        }
    }

    /// The note preimage, an ordered sequence of field elements.
    pub fn preimage(&self) -> &[Fr] {
        &self.preimage
    }
}

/// A note owned by this engine's key, ready for persistence.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters)]
pub struct NoteRecord {
    #[getset(get = "pub")]
    note: NoteCandidate,
    #[getset(get_copy = "pub")]
    nullifier: Nullifier,
    /// Position of the note's commitment in the append-only commitment tree.
    #[getset(get_copy = "pub")]
    leaf_index: u64,
    #[getset(get_copy = "pub")]
    owner: PublicKey,
}

impl NoteRecord {
    /// Creates a note record from parts.
    pub fn from_parts(
        note: NoteCandidate,
        nullifier: Nullifier,
        leaf_index: u64,
        owner: PublicKey,
    ) -> Self {
        Self {
            note,
            nullifier,
            leaf_index,
            owner,
        }
    }
}

/// A transaction pertaining to this engine's user, ready for persistence.
///
/// Never mutated by the engine after creation.
#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct TxRecord {
    #[getset(get_copy = "pub")]
    tx_hash: TxHash,
    #[getset(get_copy = "pub")]
    block_hash: BlockHash,
    #[getset(get_copy = "pub")]
    block_number: BlockNumber,
    #[getset(get_copy = "pub")]
    origin: Address,
    #[getset(get_copy = "pub")]
    deployed_contract: Option<Address>,
    /// Empty on success; downstream consumers may annotate separately.
    #[getset(get = "pub")]
    error: String,
}

impl TxRecord {
    /// Creates a transaction record from parts.
    pub fn from_parts(
        tx_hash: TxHash,
        block_hash: BlockHash,
        block_number: BlockNumber,
        origin: Address,
        deployed_contract: Option<Address>,
    ) -> Self {
        Self {
            tx_hash,
            block_hash,
            block_number,
            origin,
            deployed_contract,
            error: String::new(),
        }
    }
}

/// Encapsulates the current state of sync
#[derive(Debug, CopyGetters)]
pub struct SyncState {
    /// Highest block number whose effects are fully durable in the store.
    #[getset(get_copy = "pub")]
    synced_to_block: BlockNumber,
}

impl SyncState {
    /// Create new SyncState
    pub fn new() -> Self {
        SyncState {
            synced_to_block: BlockNumber::NONE,
        }
    }

    /// Advances the watermark. The watermark never moves backwards.
    pub(crate) fn advance_to(&mut self, block_number: BlockNumber) {
        if block_number > self.synced_to_block {
            self.synced_to_block = block_number;
        }
    }
}

impl Default for SyncState {
    fn default() -> Self {
        Self::new()
    }
}
