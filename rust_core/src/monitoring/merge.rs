//! Merge stage: the single bounded queue every polling loop pushes into.
//!
//! Events from one loop keep that loop's emission order. Across loops they
//! interleave in arrival order; nothing sorts them by time.

use crate::models::PriceEvent;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_MERGE_CAPACITY: usize = 100;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeSendError {
    #[error("cancelled while waiting for merge stage capacity")]
    Cancelled,

    #[error("merge stage consumer has gone away")]
    Closed,
}

/// Producer handle onto the merge stage. Clone one per polling loop; the
/// stage closes once every clone has been dropped.
#[derive(Debug, Clone)]
pub struct MergeSender {
    tx: mpsc::Sender<PriceEvent>,
}

impl MergeSender {
    /// Push an event, suspending while the stage is full.
    ///
    /// Returns `MergeSendError::Cancelled` if `cancel` fires while blocked,
    /// so a full stage can never hold up shutdown.
    pub async fn send(
        &self,
        event: PriceEvent,
        cancel: &CancellationToken,
    ) -> Result<(), MergeSendError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(MergeSendError::Cancelled),
            result = self.tx.send(event) => result.map_err(|_| MergeSendError::Closed),
        }
    }
}

/// Create the merge stage. A zero capacity is bumped to one.
pub fn merge_stage(capacity: usize) -> (MergeSender, mpsc::Receiver<PriceEvent>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (MergeSender { tx }, rx)
}
