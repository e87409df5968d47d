// ── Identity resolver ──
//
// Folds every router's leases, static host bindings and neighbor entries,
// plus the controller's own neighbor table, into one MAC -> {ip, name}
// map. Observations are sorted into a canonical order before the fold so
// the outcome depends only on the precedence rules, never on which
// router answered first.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::net::IpAddr;

use crate::model::{ArpEntry, MacAddress, RouterId, Snapshot};

/// Name shown while no source has named a client.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Best-known address and name for one MAC in the current cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    /// `None` is the "unknown address" placeholder.
    pub ip: Option<IpAddr>,
    /// `None` means no source supplied a name yet.
    pub name: Option<String>,
}

impl Identity {
    pub fn name_or_unknown(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN_NAME)
    }
}

/// Per-cycle identity map. Built fresh by [`resolve`] and dropped after
/// enrichment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityMap {
    entries: HashMap<MacAddress, Identity>,
}

impl IdentityMap {
    pub fn get(&self, mac: &MacAddress) -> Option<&Identity> {
        self.entries.get(mac)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MacAddress, &Identity)> {
        self.entries.iter()
    }
}

/// One router's snapshot as input to the resolver.
#[derive(Debug, Clone, Copy)]
pub struct Contribution<'a> {
    pub router: &'a RouterId,
    pub is_gateway: bool,
    pub snapshot: &'a Snapshot,
}

// ── Tagged observations ─────────────────────────────────────────────

/// Where an observation came from. Variant order is fold order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Source {
    LocalNeighbor,
    PeerLease,
    GatewayLease,
    StaticConfig,
    Arp,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Observation<'a> {
    source: Source,
    /// `None` for the controller's own neighbor table.
    router: Option<&'a RouterId>,
    mac: &'a MacAddress,
    ip: Option<IpAddr>,
    name: Option<&'a str>,
}

fn is_v4(ip: Option<IpAddr>) -> bool {
    ip.is_some_and(|ip| ip.is_ipv4())
}

/// Neighbor tables only ever contribute IPv4; an IPv6-only neighbor
/// keeps the placeholder address.
fn neighbor_address(entry: &ArpEntry) -> Option<IpAddr> {
    Some(entry.ip).filter(IpAddr::is_ipv4)
}

fn observations<'a>(local: &'a [ArpEntry], routers: &[Contribution<'a>]) -> Vec<Observation<'a>> {
    let mut out: Vec<Observation<'a>> = local
        .iter()
        .map(|n| Observation {
            source: Source::LocalNeighbor,
            router: None,
            mac: &n.mac,
            ip: neighbor_address(n),
            name: None,
        })
        .collect();

    for c in routers {
        let lease_source = if c.is_gateway {
            Source::GatewayLease
        } else {
            Source::PeerLease
        };
        out.extend(c.snapshot.leases.iter().map(|l| Observation {
            source: lease_source,
            router: Some(c.router),
            mac: &l.mac,
            ip: Some(l.ip),
            name: l.name.as_deref(),
        }));
        out.extend(c.snapshot.static_hosts.iter().map(|h| Observation {
            source: Source::StaticConfig,
            router: Some(c.router),
            mac: &h.mac,
            ip: None,
            name: Some(h.name.as_str()),
        }));
        out.extend(c.snapshot.arp.iter().map(|a| Observation {
            source: Source::Arp,
            router: Some(c.router),
            mac: &a.mac,
            ip: neighbor_address(a),
            name: None,
        }));
    }

    out.sort();
    out
}

fn merge(entries: &mut HashMap<MacAddress, Identity>, obs: &Observation<'_>) {
    let incoming = Identity {
        ip: obs.ip,
        name: obs.name.map(str::to_owned),
    };

    match (obs.source, entries.entry(obs.mac.clone())) {
        (_, Entry::Vacant(slot)) => {
            slot.insert(incoming);
        }
        (Source::LocalNeighbor, Entry::Occupied(mut slot)) => {
            if is_v4(incoming.ip) && !is_v4(slot.get().ip) {
                slot.get_mut().ip = incoming.ip;
            }
        }
        (source @ (Source::PeerLease | Source::GatewayLease), Entry::Occupied(mut slot)) => {
            let current = slot.get_mut();
            if source == Source::GatewayLease || current.name.is_none() {
                let ip = if is_v4(current.ip) && !is_v4(incoming.ip) {
                    current.ip
                } else {
                    incoming.ip
                };
                *current = Identity {
                    ip,
                    name: incoming.name,
                };
            }
        }
        (Source::StaticConfig, Entry::Occupied(mut slot)) => {
            let current = slot.get_mut();
            if current.name.is_none() {
                current.name = incoming.name;
            }
        }
        (Source::Arp, Entry::Occupied(mut slot)) => {
            let current = slot.get_mut();
            if is_v4(incoming.ip) && current.ip.is_none() {
                current.ip = incoming.ip;
            }
        }
    }
}

/// Build this cycle's identity map.
///
/// Precedence: lease over static config over ARP, gateway over peer,
/// named over unnamed, IPv4 over anything else.
pub fn resolve(local: &[ArpEntry], routers: &[Contribution<'_>]) -> IdentityMap {
    let mut entries = HashMap::new();
    for obs in observations(local, routers) {
        merge(&mut entries, &obs);
    }
    IdentityMap { entries }
}
