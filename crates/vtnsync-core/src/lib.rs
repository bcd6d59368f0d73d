//! Level-triggered synchronizer for the VTN network configuration document.
//!
//! Every trigger recomputes one declarative document from the current
//! inventory and publishes it to each interested consumer, writing only
//! where the consumer's stored copy differs:
//!
//! - **[`DataStore`]**: In-memory reactive inventory built on
//!   `EntityCollection<T>` (`DashMap` + `tokio::sync::watch`). Implements the
//!   per-kind repository traits in [`store`] and announces effective
//!   mutations as [`EntityChange`]s.
//!
//! - **[`netcfg::derive`]**: Assembles the [`NetworkConfig`] from the primary
//!   service record, nodes and their tags, address pools, and controllers.
//!   Bad items are skipped and reported, never fatal.
//!
//! - **[`Publisher`]**: Change-aware, per-consumer idempotent writes into the
//!   configured attribute slot.
//!
//! - **[`Reconciler`]**: Owns the trigger policy and the run-level lock.
//!   [`spawn_watch`] bridges store notifications to it with coalescing.

pub mod config;
pub mod error;
pub mod model;
pub mod netcfg;
pub mod publish;
pub mod reconciler;
pub mod resolve;
pub mod store;
pub mod tags;
pub mod watch;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::SyncConfig;
pub use error::{CoreError, ResolveError, StoreError};
pub use netcfg::{ConfigDocument, Derivation, NetworkConfig, SkipReason, SkippedItem};
pub use publish::{PublishFailure, PublishReport, Publisher, interested_consumers};
pub use reconciler::{Reconciler, RunOutcome, RunState};
pub use resolve::{HostResolver, StaticResolver, SystemResolver};
pub use store::{DataStore, EntityChange, Inventory, InventorySnapshot, SnapshotError};
pub use tags::{TagError, TagLookup, TagResolver};
pub use watch::{WatchRun, spawn_watch};

pub use model::{
    AddressPool, Controller, EntityId, EntityKind, Node, ServiceInstance,
    ServiceInstanceAttribute, Tag, TagOwner, VtnService,
};
