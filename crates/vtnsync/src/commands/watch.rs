//! `watch`: continuous reconciliation.
//!
//! Every poll tick re-reads the state file and runs a full reconciliation,
//! so changes to unwatched kinds (tags, controllers, interest markers) are
//! picked up within one interval. Changes to watched kinds additionally
//! reach the reconciler through the watch bridge. Runs that wrote to any
//! consumer are persisted back to the file.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use vtnsync_core::{CoreError, RunOutcome, WatchRun, spawn_watch};

use crate::cli::{GlobalOpts, WatchArgs};
use crate::commands::{Session, print_skipped};
use crate::error::CliError;

/// One unit of work picked by the event loop.
enum Work {
    Report(WatchRun),
    Poll,
}

pub async fn handle(args: &WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let session = Arc::new(Session::open(global)?);
    let period = args
        .interval
        .map_or_else(|| session.config.poll_interval(), Duration::from_secs)
        .max(Duration::from_secs(1));

    let cancel = CancellationToken::new();
    let (bridge, mut runs) = spawn_watch(
        Arc::clone(&session.reconciler),
        session.store.subscribe_changes(),
        cancel.clone(),
    );
    info!(
        state = %session.state_path.display(),
        period_secs = period.as_secs(),
        "watching state file"
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    // Level-triggered: reconcile once up front regardless of events.
    tokio::select! {
        biased;
        _ = &mut shutdown => {
            info!("interrupted, shutting down");
            return stop(cancel, bridge).await;
        }
        () = initial_run(&session) => {}
    }

    let mut interval = tokio::time::interval(period);
    interval.tick().await; // consume the immediate first tick

    loop {
        let work = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            Some(run) = runs.recv() => Work::Report(run),
            _ = interval.tick() => Work::Poll,
        };
        // Ctrl-C stays responsive while a run waits on the lock or on
        // name resolution; the run itself finishes on the blocking pool.
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            () = perform(&session, work) => {}
        }
    }

    info!("interrupted, shutting down");
    stop(cancel, bridge).await
}

async fn stop(
    cancel: CancellationToken,
    bridge: tokio::task::JoinHandle<()>,
) -> Result<(), CliError> {
    cancel.cancel();
    if let Err(e) = bridge.await {
        warn!(error = %e, "watch bridge ended abnormally");
    }
    Ok(())
}

async fn initial_run(session: &Arc<Session>) {
    let result = Arc::clone(&session.reconciler).reconcile_blocking().await;
    after_run(session, &result, true).await;
}

async fn perform(session: &Arc<Session>, work: Work) {
    match work {
        Work::Report(run) => {
            match &run.trigger {
                Some(change) => info!(
                    kind = %change.kind,
                    id = %change.id,
                    coalesced = run.coalesced,
                    "change-triggered run finished"
                ),
                None => info!("catch-up run finished"),
            }
            after_run(session, &run.result, false).await;
        }
        Work::Poll => poll(session).await,
    }
}

/// Reload the state file, then reconcile against whatever is loaded.
async fn poll(session: &Arc<Session>) {
    let reloading = Arc::clone(session);
    match tokio::task::spawn_blocking(move || reloading.reload()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "state file reload failed, keeping current inventory"),
        Err(e) => warn!(error = %e, "state file reload task failed"),
    }

    let result = Arc::clone(&session.reconciler).reconcile_blocking().await;
    after_run(session, &result, false).await;
}

/// Log the run and persist if it may have written to a consumer.
///
/// Unchanged periodic runs stay quiet on stdout. A partially failed publish
/// can leave a slot written without its consumer counted as changed, so it
/// always goes through the dirty check.
async fn after_run(
    session: &Arc<Session>,
    result: &Result<RunOutcome, CoreError>,
    initial: bool,
) {
    let wrote = match result {
        Ok(outcome) => {
            let changed = outcome.publish.changed() > 0;
            if initial || changed {
                print_skipped(&outcome.skipped);
                println!("{}", outcome.publish);
            } else {
                debug!(report = %outcome.publish, "nothing to publish");
            }
            changed
        }
        Err(CoreError::Publish { failures, .. }) => {
            for failure in failures {
                warn!(%failure, "publish failed");
            }
            true
        }
        Err(e) => {
            warn!(error = %e, "reconciliation failed, waiting for the next change");
            false
        }
    };

    if !wrote {
        return;
    }
    let persisting = Arc::clone(session);
    match tokio::task::spawn_blocking(move || persisting.persist()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "failed to save state file"),
        Err(e) => warn!(error = %e, "state file save task failed"),
    }
}
