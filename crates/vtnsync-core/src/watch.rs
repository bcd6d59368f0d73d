// ── Watch bridge ──
//
// Background task connecting store change notifications to the
// reconciler. Only watched kinds trigger; a burst of changes arriving
// within the coalescing window collapses into a single run.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::reconciler::{Reconciler, RunOutcome};
use crate::resolve::HostResolver;
use crate::store::{EntityChange, Inventory};

/// One reconciliation performed by the bridge.
#[derive(Debug)]
pub struct WatchRun {
    /// The change that opened the window, or `None` when the bridge fell
    /// behind the notification channel and ran to catch up.
    pub trigger: Option<EntityChange>,
    /// Further watched changes folded into this run.
    pub coalesced: usize,
    pub result: Result<RunOutcome, CoreError>,
}

enum Next {
    Trigger(Option<EntityChange>),
    Stop,
}

/// Spawn the bridge. Runs are reported on the returned channel; the task
/// exits when `cancel` fires or the store's change channel closes.
///
/// A run already in progress is allowed to finish before the task exits.
pub fn spawn_watch<S, R>(
    reconciler: Arc<Reconciler<S, R>>,
    changes: broadcast::Receiver<EntityChange>,
    cancel: CancellationToken,
) -> (JoinHandle<()>, mpsc::UnboundedReceiver<WatchRun>)
where
    S: Inventory + 'static,
    R: HostResolver + 'static,
{
    let (runs_tx, runs_rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(watch_task(reconciler, changes, cancel, runs_tx));
    (handle, runs_rx)
}

async fn watch_task<S, R>(
    reconciler: Arc<Reconciler<S, R>>,
    mut changes: broadcast::Receiver<EntityChange>,
    cancel: CancellationToken,
    runs_tx: mpsc::UnboundedSender<WatchRun>,
) where
    S: Inventory + 'static,
    R: HostResolver + 'static,
{
    let window = reconciler.config().coalesce;
    info!(window = ?window, "watch bridge started");

    loop {
        let trigger = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            next = next_trigger(&mut changes) => match next {
                Next::Trigger(trigger) => trigger,
                Next::Stop => break,
            },
        };

        // Fold the rest of the burst into this run.
        let deadline = Instant::now() + window;
        let mut coalesced = 0usize;
        let mut closed = false;
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    info!("watch bridge stopping");
                    return;
                }
                () = tokio::time::sleep_until(deadline) => break,
                recv = changes.recv() => match recv {
                    Ok(change) if change.kind.is_watched() => coalesced += 1,
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        coalesced += usize::try_from(missed).unwrap_or(usize::MAX);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        closed = true;
                        break;
                    }
                },
            }
        }
        if coalesced > 0 {
            debug!(coalesced, "coalesced change burst");
        }

        let result = run_once(&reconciler, trigger.clone()).await;
        let _ = runs_tx.send(WatchRun {
            trigger,
            coalesced,
            result,
        });

        if closed {
            break;
        }
    }

    info!("watch bridge stopped");
}

async fn next_trigger(changes: &mut broadcast::Receiver<EntityChange>) -> Next {
    loop {
        match changes.recv().await {
            Ok(change) if change.kind.is_watched() => return Next::Trigger(Some(change)),
            Ok(change) => {
                debug!(kind = %change.kind, id = %change.id, "change on unwatched kind");
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!(missed, "watch bridge lagged, running full reconciliation");
                return Next::Trigger(None);
            }
            Err(broadcast::error::RecvError::Closed) => return Next::Stop,
        }
    }
}

async fn run_once<S, R>(
    reconciler: &Arc<Reconciler<S, R>>,
    trigger: Option<EntityChange>,
) -> Result<RunOutcome, CoreError>
where
    S: Inventory + 'static,
    R: HostResolver + 'static,
{
    let reconciler = Arc::clone(reconciler);
    tokio::task::spawn_blocking(move || match trigger {
        Some(change) => reconciler
            .handle_watched_object(change.kind, &change.id)
            .unwrap_or_else(|| reconciler.reconcile()),
        None => reconciler.reconcile(),
    })
    .await
    .map_err(|e| CoreError::Internal(format!("reconciliation task failed: {e}")))?
}
