// ── Per-poll diagnostic snapshot ──
//
// Everything one run of the diagnostic script tells us about a router.
// Built fresh every poll and consumed by the resolver; never stored.

use serde::Serialize;
use std::net::IpAddr;

use super::identity::MacAddress;
use super::router::RadioIdentity;

/// 1/5/15-minute load averages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

/// Memory totals in kB, derived from `/proc/meminfo`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MemoryStats {
    pub total_kb: u64,
    /// Free plus reclaimable (buffers and page cache).
    pub free_kb: u64,
    pub used_kb: u64,
    pub percent: u64,
}

impl MemoryStats {
    pub fn from_meminfo(total: u64, free: u64, buffers: u64, cached: u64) -> Self {
        let reclaimable = free.saturating_add(buffers).saturating_add(cached);
        let used = total.saturating_sub(reclaimable);
        let percent = if total == 0 {
            0
        } else {
            let rounded = (u128::from(used) * 100 + u128::from(total) / 2) / u128::from(total);
            u64::try_from(rounded.min(100)).unwrap_or(100)
        };
        Self {
            total_kb: total,
            free_kb: reclaimable,
            used_kb: used,
            percent,
        }
    }
}

/// Cumulative byte counters for the primary interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InterfaceCounters {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// A DHCP lease (or, on gateways without a lease file, a neighbor entry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaseRecord {
    pub mac: MacAddress,
    pub ip: IpAddr,
    /// `None` when the lease carries no hostname (`*`).
    pub name: Option<String>,
}

/// An ARP or kernel neighbor entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArpEntry {
    pub mac: MacAddress,
    pub ip: IpAddr,
}

/// A `config host` section from `/etc/config/dhcp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaticHostBinding {
    pub mac: MacAddress,
    pub name: String,
}

/// A station currently associated to one of the router's radios.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WifiAssociation {
    pub mac: MacAddress,
    pub signal_dbm: Option<i32>,
}

/// Parsed output of one diagnostic run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub uptime_secs: f64,
    pub load: LoadAverage,
    pub memory: MemoryStats,
    pub network: InterfaceCounters,
    pub radio: RadioIdentity,
    pub leases: Vec<LeaseRecord>,
    pub arp: Vec<ArpEntry>,
    pub static_hosts: Vec<StaticHostBinding>,
    pub associations: Vec<WifiAssociation>,
}
