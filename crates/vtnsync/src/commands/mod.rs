//! Command handlers and the session they share.

pub mod config_cmd;
pub mod render;
pub mod sync;
pub mod watch;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;
use vtnsync_core::{DataStore, InventorySnapshot, Reconciler, SkippedItem, StaticResolver};

use crate::cli::{Command, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;

pub type CliReconciler = Reconciler<DataStore, StaticResolver>;

/// Route a parsed command to its handler.
pub async fn dispatch(command: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match command {
        Command::Config(args) => config_cmd::handle(&args, global),
        Command::Render(args) => render::handle(&args, global),
        Command::Sync(args) => sync::handle(&args, global).await,
        Command::Watch(args) => watch::handle(&args, global).await,
    }
}

// ── Session ─────────────────────────────────────────────────────────

/// Loaded configuration, the store filled from the state file, and a
/// reconciler over it.
pub struct Session {
    pub config: Config,
    pub state_path: PathBuf,
    pub store: Arc<DataStore>,
    pub reconciler: Arc<CliReconciler>,
    /// Store contents as of the last load or save.
    synced: Mutex<InventorySnapshot>,
}

impl Session {
    pub fn open(global: &GlobalOpts) -> Result<Self, CliError> {
        let config = config::load(global)?;
        let state_path = config::state_path(global, &config);

        let store = Arc::new(DataStore::new());
        store.apply_snapshot(InventorySnapshot::load(&state_path)?);
        debug!(path = %state_path.display(), "loaded inventory state");

        let reconciler = Arc::new(Reconciler::new(
            Arc::clone(&store),
            config.resolver(),
            config.to_sync_config(),
        ));

        Ok(Self {
            config,
            state_path,
            synced: Mutex::new(store.to_snapshot()),
            store,
            reconciler,
        })
    }

    /// Save pending writes, then re-read the state file into the store.
    ///
    /// Runs under the reconciler's lock, so a reload never discards slots
    /// written by a run that has not been persisted yet.
    pub fn reload(&self) -> Result<(), CliError> {
        self.reconciler.exclusive(|store| {
            let mut synced = self.synced.lock().unwrap_or_else(PoisonError::into_inner);
            self.save_if_dirty(store, &mut synced)?;
            store.apply_snapshot(InventorySnapshot::load(&self.state_path)?);
            *synced = store.to_snapshot();
            Ok(())
        })
    }

    /// Write the store back to the state file if anything changed.
    pub fn persist(&self) -> Result<(), CliError> {
        self.reconciler.exclusive(|store| {
            let mut synced = self.synced.lock().unwrap_or_else(PoisonError::into_inner);
            self.save_if_dirty(store, &mut synced)
        })
    }

    fn save_if_dirty(
        &self,
        store: &DataStore,
        synced: &mut InventorySnapshot,
    ) -> Result<(), CliError> {
        let current = store.to_snapshot();
        if current != *synced {
            current.save(&self.state_path)?;
            debug!(path = %self.state_path.display(), "saved inventory state");
            *synced = current;
        }
        Ok(())
    }
}

// ── Shared output ───────────────────────────────────────────────────

/// Report left-out items on stderr.
pub fn print_skipped(skipped: &[SkippedItem]) {
    for item in skipped {
        eprintln!(
            "skipped {} {} ({}): {}",
            item.kind, item.id, item.name, item.reason
        );
    }
}
