// ── Domain model ──

pub mod client;
pub mod identity;
pub mod router;
pub mod snapshot;

pub use client::{Client, ConnectionType, Manufacturer};
pub use identity::{MacAddress, RouterId};
pub use router::{RadioIdentity, Router, RouterState, RouterStatus, StatusUpdate};
pub use snapshot::{
    ArpEntry, InterfaceCounters, LeaseRecord, LoadAverage, MemoryStats, Snapshot,
    StaticHostBinding, WifiAssociation,
};
