//! Sync engine for a fleet of SSH-managed routers.
//!
//! This crate owns the domain model, the diagnostic parser, cross-router
//! identity resolution and the sync orchestrator:
//!
//! - **[`Controller`]**: runs sync cycles periodically, on demand, and after
//!   a router is registered. Also exposes single-router status checks, live
//!   stats, reboot and bounded fleet-wide command execution.
//!
//! - **[`collector`]**: builds the single-session diagnostic script and turns
//!   its output into a [`Snapshot`] via [`parser`].
//!
//! - **[`resolver`]**: folds every router's leases, neighbor tables and
//!   static host bindings into one MAC → (IP, hostname) map. The fold is
//!   order-independent; the gateway's DHCP view always wins.
//!
//! - **[`enrich`]**: turns a router's snapshot plus the identity map into
//!   its client list (persistent names, reverse DNS, vendor fallback) and
//!   detects newly joined clients.
//!
//! - **[`RouterStore`]**: in-memory reactive storage built on
//!   `EntityCollection<T>` (`DashMap` + `tokio::sync::watch`), with JSON
//!   persistence through [`StateFile`].
//!
//! - **[`ports`]**: the traits the pipeline talks through. Production
//!   implementations live in [`adapters`].

pub mod adapters;
pub mod collector;
pub mod config;
pub mod controller;
pub mod enrich;
pub mod error;
pub mod fleet;
pub mod model;
pub mod parser;
pub mod ports;
pub mod resolver;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::SyncConfig;
pub use controller::{Controller, RouterFailure, Services, SyncReport};
pub use error::CoreError;
pub use fleet::CommandOutcome;
pub use resolver::{Identity, IdentityMap};
pub use store::{FleetState, RouterStore, StateFile};

pub use model::{
    ArpEntry, Client, ConnectionType, InterfaceCounters, LeaseRecord, LoadAverage, MacAddress,
    Manufacturer, MemoryStats, RadioIdentity, Router, RouterId, RouterState, RouterStatus,
    Snapshot, StaticHostBinding, StatusUpdate, WifiAssociation,
};

pub use wrtfleet_ssh::{Credentials, ShellTarget};
