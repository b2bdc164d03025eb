//! Queue and serve fetch requests against the block feed

use tokio::sync::mpsc::UnboundedReceiver;

use crate::client::FetchRequest;
use crate::interface::BlockFeed;

/// Receives [`FetchRequest`]'s via an [`tokio::sync::mpsc::UnboundedReceiver`] for queueing
/// and serving from the block feed.
/// Returns the data specified in the [`FetchRequest`] variant via the provided
/// [`tokio::sync::oneshot::Sender`].
///
/// Allows all queries to the feed to be handled from a single task and keeps the engine
/// free of any direct feed connection.
pub async fn fetch<F>(
    mut fetch_request_receiver: UnboundedReceiver<FetchRequest>,
    mut feed: F,
) -> Result<(), F::Error>
where
    F: BlockFeed,
{
    let mut fetch_request_queue: Vec<FetchRequest> = Vec::new();

    loop {
        // returns `Ok` here when all requests have been served and the
        // fetch_request channel is closed on engine shutdown
        if receive_fetch_requests(&mut fetch_request_receiver, &mut fetch_request_queue).await {
            return Ok(());
        }

        if let Some(request) = select_fetch_request(&mut fetch_request_queue) {
            fetch_from_feed(&mut feed, request).await?;
        }
    }
}

// receives fetch requests and populates the fetch request queue
//
// returns `true` if the fetch request channel is closed and all fetch requests have been
// completed, signalling the task is no longer needed.
async fn receive_fetch_requests(
    receiver: &mut UnboundedReceiver<FetchRequest>,
    fetch_request_queue: &mut Vec<FetchRequest>,
) -> bool {
    // if there are no fetch requests to process, sleep until the next fetch request is
    // received or the channel is closed
    if fetch_request_queue.is_empty() {
        if let Some(fetch_request) = receiver.recv().await {
            fetch_request_queue.push(fetch_request);
        }
    }

    loop {
        match receiver.try_recv() {
            Ok(fetch_request) => fetch_request_queue.push(fetch_request),
            Err(tokio::sync::mpsc::error::TryRecvError::Empty) => break,
            Err(tokio::sync::mpsc::error::TryRecvError::Disconnected) => {
                if fetch_request_queue.is_empty() {
                    return true;
                } else {
                    break;
                }
            }
        }
    }

    false
}

// return `None` if a fetch request could not be selected
fn select_fetch_request(fetch_request_queue: &mut Vec<FetchRequest>) -> Option<FetchRequest> {
    if fetch_request_queue.first().is_some() {
        Some(fetch_request_queue.remove(0))
    } else {
        None
    }
}

async fn fetch_from_feed<F>(feed: &mut F, fetch_request: FetchRequest) -> Result<(), F::Error>
where
    F: BlockFeed,
{
    match fetch_request {
        FetchRequest::ChainTip(sender) => {
            tracing::debug!("Fetching chain tip.");
            let chain_tip = feed.latest_block_number().await?;
            if sender.send(chain_tip).is_err() {
                tracing::warn!("Chain tip requester hung up before receiving response.");
            }
        }
    }

    Ok(())
}
