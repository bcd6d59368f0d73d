//! `sync`: one reconciliation run.

use std::sync::Arc;

use serde_json::json;
use tracing::info;
use vtnsync_core::{CoreError, EntityId, RunOutcome};

use crate::cli::{GlobalOpts, SyncArgs};
use crate::commands::{Session, print_skipped};
use crate::error::CliError;

pub async fn handle(args: &SyncArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let session = Session::open(global)?;
    let result = Arc::clone(&session.reconciler).reconcile_blocking().await;

    // Slots written before a partial publish failure are kept, including
    // one whose consumer could not be touched.
    let wrote = match &result {
        Ok(outcome) => outcome.publish.changed() > 0,
        Err(CoreError::Publish { .. }) => true,
        Err(_) => false,
    };
    if wrote && !args.dry_run {
        session.persist()?;
        info!(path = %session.state_path.display(), "state file updated");
    }

    let outcome = result?;
    print_skipped(&outcome.skipped);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary(&outcome, args.dry_run))?);
    } else {
        println!(
            "{} nodes, {} public gateways, {} skipped",
            outcome.nodes,
            outcome.gateways,
            outcome.skipped.len()
        );
        println!("{}", outcome.publish);
        if args.dry_run && outcome.publish.changed() > 0 {
            println!("dry run: state file not written");
        }
    }
    Ok(())
}

fn summary(outcome: &RunOutcome, dry_run: bool) -> serde_json::Value {
    let ids = |ids: &[EntityId]| ids.iter().map(ToString::to_string).collect::<Vec<_>>();
    let skipped: Vec<_> = outcome
        .skipped
        .iter()
        .map(|s| {
            json!({
                "kind": s.kind.to_string(),
                "id": s.id.to_string(),
                "name": s.name,
                "reason": s.reason.to_string(),
            })
        })
        .collect();

    json!({
        "primary": outcome.primary.to_string(),
        "nodes": outcome.nodes,
        "public_gateways": outcome.gateways,
        "skipped": skipped,
        "consumers": {
            "attempted": outcome.publish.attempted,
            "created": ids(&outcome.publish.created),
            "updated": ids(&outcome.publish.updated),
            "unchanged": ids(&outcome.publish.unchanged),
        },
        "dry_run": dry_run,
    })
}
