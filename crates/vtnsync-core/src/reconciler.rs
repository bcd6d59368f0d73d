// ── Reconciliation step ──
//
// Level-triggered and stateless across runs: every trigger, whatever
// entity caused it, rederives the whole document from the store and
// publishes it to every interested consumer. Nothing is diffed
// incrementally; the only comparison is the final per-consumer slot check.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::error::CoreError;
use crate::model::{EntityId, EntityKind, VtnService};
use crate::netcfg::{self, ConfigDocument, SkippedItem};
use crate::publish::{self, PublishReport, Publisher};
use crate::resolve::HostResolver;
use crate::store::Inventory;

/// Where the reconciler currently is in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Triggered,
    Deriving,
    Publishing,
}

/// Everything a successful run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub primary: EntityId,
    pub document: ConfigDocument,
    pub nodes: usize,
    pub gateways: usize,
    pub skipped: Vec<SkippedItem>,
    pub publish: PublishReport,
}

/// Pick the primary service record.
///
/// More than one record is an error unless `allow_multiple` is set, in
/// which case the lowest id wins.
pub fn select_primary(
    mut services: Vec<VtnService>,
    allow_multiple: bool,
) -> Result<VtnService, CoreError> {
    services.sort_by(|a, b| a.id.cmp(&b.id));
    let count = services.len();
    let mut services = services.into_iter();
    let first = services.next().ok_or(CoreError::NoServiceConfig)?;
    if count > 1 {
        if !allow_multiple {
            return Err(CoreError::AmbiguousServiceConfig { count });
        }
        warn!(count, chosen = %first.id, "multiple VTN service records, using the first");
    }
    Ok(first)
}

/// The reconciliation entry point.
///
/// Runs are serialized by a run-level lock, so overlapping triggers never
/// interleave their derive and publish phases.
pub struct Reconciler<S: Inventory, R: HostResolver> {
    store: Arc<S>,
    resolver: R,
    config: SyncConfig,
    run_lock: Mutex<()>,
    state: watch::Sender<RunState>,
}

impl<S: Inventory, R: HostResolver> Reconciler<S, R> {
    pub fn new(store: Arc<S>, resolver: R, config: SyncConfig) -> Self {
        let (state, _) = watch::channel(RunState::Idle);
        Self {
            store,
            resolver,
            config,
            run_lock: Mutex::new(()),
            state,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Observe run-state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    /// Run `f` against the store while holding the run lock, so no
    /// reconciliation interleaves with it.
    pub fn exclusive<T>(&self, f: impl FnOnce(&S) -> T) -> T {
        let _guard = self.run_lock.lock().unwrap_or_else(PoisonError::into_inner);
        f(&self.store)
    }

    /// Watch-dispatch entry point.
    ///
    /// Any watched kind triggers a full run; the entity id is only logged.
    /// Returns `None` for kinds this step does not watch.
    pub fn handle_watched_object(
        &self,
        kind: EntityKind,
        id: &EntityId,
    ) -> Option<Result<RunOutcome, CoreError>> {
        if !kind.is_watched() {
            debug!(%kind, %id, "ignoring unwatched entity");
            return None;
        }
        info!(%kind, %id, "watched object changed");
        Some(self.reconcile())
    }

    /// Derive the document without publishing it.
    pub fn render(&self) -> Result<netcfg::Derivation, CoreError> {
        let _guard = self.run_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let primary = self.primary()?;
        netcfg::derive(&*self.store, &self.resolver, &primary)
    }

    /// Run one full derive-and-publish pass. Blocks on name resolution.
    pub fn reconcile(&self) -> Result<RunOutcome, CoreError> {
        let _guard = self.run_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.set_state(RunState::Triggered);
        let result = self.run();
        self.set_state(RunState::Idle);

        match &result {
            Ok(outcome) => info!(
                nodes = outcome.nodes,
                gateways = outcome.gateways,
                skipped = outcome.skipped.len(),
                report = %outcome.publish,
                "reconciliation complete"
            ),
            Err(e) => warn!(error = %e, "reconciliation failed"),
        }
        result
    }

    fn run(&self) -> Result<RunOutcome, CoreError> {
        self.set_state(RunState::Deriving);
        let primary = self.primary()?;
        let derivation = netcfg::derive(&*self.store, &self.resolver, &primary)?;

        self.set_state(RunState::Publishing);
        let consumers = publish::interested_consumers(
            &*self.store,
            &self.config.interest_marker,
            &self.config.capability,
        )?;
        debug!(consumers = consumers.len(), "publishing to interested consumers");
        let report = Publisher::new(&*self.store, &self.config.channel)
            .publish(&derivation.document, &consumers)?;

        let cordvtn = derivation.config.cordvtn();
        Ok(RunOutcome {
            primary: primary.id,
            nodes: cordvtn.nodes.len(),
            gateways: cordvtn.public_gateways.len(),
            document: derivation.document,
            skipped: derivation.skipped,
            publish: report,
        })
    }

    fn primary(&self) -> Result<VtnService, CoreError> {
        select_primary(
            self.store.vtn_services()?,
            self.config.allow_multiple_primary,
        )
    }

    fn set_state(&self, state: RunState) {
        self.state.send_replace(state);
    }
}

impl<S, R> Reconciler<S, R>
where
    S: Inventory + 'static,
    R: HostResolver + 'static,
{
    /// Run [`reconcile`](Self::reconcile) on the blocking pool.
    pub async fn reconcile_blocking(self: Arc<Self>) -> Result<RunOutcome, CoreError> {
        tokio::task::spawn_blocking(move || self.reconcile())
            .await
            .map_err(|e| CoreError::Internal(format!("reconciliation task failed: {e}")))?
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn service(id: u64) -> VtnService {
        VtnService {
            id: EntityId::from(id),
            name: format!("vtn-{id}"),
            private_gateway_mac: String::new(),
            local_management_ip: String::new(),
            ovsdb_port: 6641,
            ssh_port: 22,
            ssh_user: "root".into(),
            ssh_key_file: String::new(),
            mgmt_subnet_bits: 24,
            xos_endpoint: String::new(),
            xos_user: String::new(),
            xos_password: SecretString::from(String::new()),
            controller_port: "6653".into(),
        }
    }

    #[test]
    fn no_primary_is_fatal() {
        let err = select_primary(vec![], false).unwrap_err();
        assert!(matches!(err, CoreError::NoServiceConfig));
        assert!(err.is_fatal_precondition());
    }

    #[test]
    fn several_primaries_are_ambiguous_by_default() {
        let err = select_primary(vec![service(2), service(1)], false).unwrap_err();
        assert!(matches!(err, CoreError::AmbiguousServiceConfig { count: 2 }));
    }

    #[test]
    fn lowest_id_wins_when_allowed() {
        let chosen = select_primary(vec![service(9), service(3)], true).unwrap();
        assert_eq!(chosen.id, EntityId::from(3));
    }
}
