//! Module for handling all queries to the block feed
//!
//! The engine is handed block batches by its caller and never fetches block
//! data itself; the only feed surface consumed here is the chain tip, used by
//! [`crate::sync::NoteSyncEngine::is_synchronized`].

use tokio::sync::{mpsc::UnboundedSender, oneshot};

use crate::error::SyncError;
use crate::primitives::BlockNumber;

pub mod fetch;

/// Fetch requests are created and sent to the [`crate::client::fetch::fetch`] task when a
/// query to the block feed is required.
///
/// Each variant includes a [`tokio::sync::oneshot::Sender`] for returning the fetched data
/// to the requester.
#[derive(Debug)]
pub enum FetchRequest {
    /// Gets the number of the latest block known to the feed.
    ChainTip(oneshot::Sender<BlockNumber>),
}

/// The fetch task hung up before answering, either because it stopped or
/// because the underlying feed failed.
#[derive(Debug, thiserror::Error)]
#[error("fetch request channel closed")]
pub struct FetchChannelClosed;

/// Gets the number of the latest block known to the feed.
///
/// Requires [`crate::client::fetch::fetch`] to be running concurrently, connected via the
/// `fetch_request` channel.
pub async fn get_chain_height(
    fetch_request_sender: UnboundedSender<FetchRequest>,
) -> Result<BlockNumber, SyncError> {
    let (sender, receiver) = oneshot::channel();
    fetch_request_sender
        .send(FetchRequest::ChainTip(sender))
        .map_err(|_| SyncError::ChainHeight(Box::new(FetchChannelClosed)))?;
    let chain_tip = receiver
        .await
        .map_err(|_| SyncError::ChainHeight(Box::new(FetchChannelClosed)))?;

    Ok(chain_tip)
}
