#![warn(missing_docs)]
//! Private note synchronization engine
//!
//! Discovers, decrypts and tracks the notes belonging to one user of a
//! privacy-preserving ledger, and retires notes whose nullifiers appear
//! on-chain.
//!
//! Entrypoint: [`crate::sync::NoteSyncEngine`]

pub mod client;
pub mod error;
pub mod interface;
pub mod keys;
#[allow(missing_docs)]
pub mod primitives;
pub mod scan;
pub mod sync;

#[cfg(test)]
pub(crate) mod mocks;
