//! Submission lifecycle tracking.
//!
//! # Data Flow
//! ```text
//! ChainClient::submit
//!     → broadcast (transport)
//!     → SubmissionHandle::spawn (one tracker task per transaction)
//!         → poll inclusion / finalized head every poll_interval
//!         → SubmissionState::apply (drops out-of-order or late events)
//!         → mpsc → SubmissionHandle (Stream<Item = SubmissionUpdate>)
//! ```
//!
//! The tracker ends on a terminal state, on `cancel()`, or when the
//! handle is dropped.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use alloy::primitives::{TxHash, U256};
use futures_util::Stream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::blockchain::transport::ChainTransport;
use crate::blockchain::types::{BlockRef, ChainResult, DispatchFailure, LifecycleStatus};
use crate::config::ChainConfig;
use crate::observability::metrics;

/// Buffered updates per handle before the tracker waits on the consumer.
const UPDATE_BUFFER: usize = 16;

/// Tracker tuning, derived from [`ChainConfig`].
#[derive(Debug, Clone)]
pub struct SubmissionSettings {
    pub poll_interval: Duration,
    /// Wait without inclusion before a "still waiting" hint.
    pub stall_after: Duration,
    /// Blocks on top of the inclusion block before it counts as final.
    /// Only used when the node reports no finalized head.
    pub finality_depth: u64,
    /// Minimum free balance required before broadcasting.
    pub min_free_balance: U256,
}

impl From<&ChainConfig> for SubmissionSettings {
    fn from(config: &ChainConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            stall_after: Duration::from_secs(config.stall_after_secs),
            finality_depth: config.finality_depth,
            min_free_balance: U256::from(config.min_free_balance),
        }
    }
}

impl Default for SubmissionSettings {
    fn default() -> Self {
        Self::from(&ChainConfig::default())
    }
}

/// Where one transaction is in its life.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Building,
    Broadcasting,
    Included(BlockRef),
    Finalized(BlockRef),
    Failed(DispatchFailure),
}

impl SubmissionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionState::Finalized(_) | SubmissionState::Failed(_))
    }

    /// Advance on a lifecycle event. Returns `false` if the event does not
    /// apply to the current state and was ignored.
    pub fn apply(&mut self, status: &LifecycleStatus) -> bool {
        let next = match (&*self, status) {
            (s, _) if s.is_terminal() => return false,
            (_, LifecycleStatus::DispatchError(failure)) => SubmissionState::Failed(failure.clone()),
            (SubmissionState::Building, LifecycleStatus::Broadcast) => SubmissionState::Broadcasting,
            (SubmissionState::Broadcasting, LifecycleStatus::InBlock(block)) => {
                SubmissionState::Included(*block)
            }
            // re-included in another block after a reorg
            (SubmissionState::Included(current), LifecycleStatus::InBlock(block)) if current != block => {
                SubmissionState::Included(*block)
            }
            (
                SubmissionState::Broadcasting | SubmissionState::Included(_),
                LifecycleStatus::Finalized(block),
            ) => SubmissionState::Finalized(*block),
            _ => return false,
        };
        *self = next;
        true
    }

    pub fn block(&self) -> Option<BlockRef> {
        match self {
            SubmissionState::Included(block) | SubmissionState::Finalized(block) => Some(*block),
            _ => None,
        }
    }
}

/// One item of a submission stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionUpdate {
    Status(LifecycleStatus),
    /// Not included after `waited`; the submission keeps going.
    StillWaiting { waited: Duration },
}

/// A broadcast transaction and the stream of its lifecycle updates.
pub struct SubmissionHandle {
    tx_hash: TxHash,
    updates: mpsc::Receiver<SubmissionUpdate>,
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SubmissionHandle {
    /// Start tracking an already broadcast transaction.
    pub fn spawn(
        transport: Arc<dyn ChainTransport>,
        tx_hash: TxHash,
        settings: SubmissionSettings,
    ) -> Self {
        let (updates_tx, updates) = mpsc::channel(UPDATE_BUFFER);
        let (cancel, cancel_rx) = oneshot::channel();
        let task = tokio::spawn(track(transport, tx_hash, settings, updates_tx, cancel_rx));
        Self {
            tx_hash,
            updates,
            cancel: Some(cancel),
            task,
        }
    }

    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    /// Next update, or `None` once the tracker has stopped.
    pub async fn recv(&mut self) -> Option<SubmissionUpdate> {
        self.updates.recv().await
    }

    /// Stop tracking. Updates already buffered can still be received.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }

    /// Whether the tracker task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Stream for SubmissionHandle {
    type Item = SubmissionUpdate;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().updates.poll_recv(cx)
    }
}

impl Drop for SubmissionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl std::fmt::Debug for SubmissionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionHandle")
            .field("tx_hash", &self.tx_hash)
            .field("finished", &self.task.is_finished())
            .finish()
    }
}

async fn track(
    transport: Arc<dyn ChainTransport>,
    tx_hash: TxHash,
    settings: SubmissionSettings,
    updates: mpsc::Sender<SubmissionUpdate>,
    mut cancel: oneshot::Receiver<()>,
) {
    let mut state = SubmissionState::Building;
    let started = Instant::now();
    let mut hinted = false;

    if !emit(&mut state, LifecycleStatus::Broadcast, &updates).await {
        return;
    }

    let mut ticker = interval(settings.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = &mut cancel => {
                tracing::debug!(tx_hash = %tx_hash, "Submission tracking cancelled");
                return;
            }
            _ = ticker.tick() => {}
        }

        let inclusion = match transport.inclusion(tx_hash).await {
            Ok(inclusion) => inclusion,
            Err(e) => {
                tracing::warn!(tx_hash = %tx_hash, error = %e, "Inclusion lookup failed, will retry");
                continue;
            }
        };

        let Some(inclusion) = inclusion else {
            let waited = started.elapsed();
            if !hinted && state.block().is_none() && waited >= settings.stall_after {
                hinted = true;
                tracing::warn!(tx_hash = %tx_hash, waited_secs = waited.as_secs(), "Transaction not yet included");
                if updates.send(SubmissionUpdate::StillWaiting { waited }).await.is_err() {
                    return;
                }
            }
            continue;
        };

        if let Some(failure) = inclusion.failure {
            emit(&mut state, LifecycleStatus::DispatchError(failure), &updates).await;
            return;
        }

        if state.block() != Some(inclusion.block)
            && !emit(&mut state, LifecycleStatus::InBlock(inclusion.block), &updates).await
        {
            return;
        }

        let finalized = match is_finalized(transport.as_ref(), &inclusion.block, &settings).await {
            Ok(finalized) => finalized,
            Err(e) => {
                tracing::warn!(tx_hash = %tx_hash, error = %e, "Finality lookup failed, will retry");
                continue;
            }
        };
        if finalized {
            emit(&mut state, LifecycleStatus::Finalized(inclusion.block), &updates).await;
        }

        if state.is_terminal() {
            return;
        }
    }
}

/// Whether `block` is final: at or below the node's finalized head, or
/// `finality_depth` blocks deep when the node has no finalized head.
async fn is_finalized(
    transport: &dyn ChainTransport,
    block: &BlockRef,
    settings: &SubmissionSettings,
) -> ChainResult<bool> {
    if let Some(finalized) = transport.finalized_block_number().await? {
        return Ok(finalized >= block.number);
    }
    let best = transport.best_block_number().await?;
    Ok(best >= block.number.saturating_add(settings.finality_depth))
}

/// Apply and forward one status. Returns `false` when the consumer is gone.
async fn emit(
    state: &mut SubmissionState,
    status: LifecycleStatus,
    updates: &mpsc::Sender<SubmissionUpdate>,
) -> bool {
    if !state.apply(&status) {
        tracing::debug!(status = status.label(), "Ignoring out-of-order lifecycle event");
        return true;
    }
    metrics::record_submission_status(status.label());
    updates.send(SubmissionUpdate::Status(status)).await.is_ok()
}
