// ── Client enrichment ──
//
// Turns one router's snapshot plus the cycle's identity map into the
// client list stored on that router, and diffs it against the previous
// list to find newly joined clients.

use std::collections::HashSet;
use std::net::IpAddr;

use futures_util::future::join_all;

use crate::model::{
    Client, ConnectionType, LeaseRecord, MacAddress, RouterState, RouterStatus, Snapshot,
    WifiAssociation,
};
use crate::ports::{NameRegistry, ReverseDns, VendorLookup};
use crate::resolver::IdentityMap;

/// Last-resort client name.
pub const UNKNOWN_DEVICE: &str = "Unknown Device";

/// Naming and lookup collaborators used while building client lists.
#[derive(Clone, Copy)]
pub struct Enricher<'a> {
    pub names: &'a dyn NameRegistry,
    pub dns: &'a dyn ReverseDns,
    pub vendors: &'a dyn VendorLookup,
}

impl Enricher<'_> {
    /// All clients of one router: wireless associations first, then
    /// wired lease holders.
    pub async fn clients(&self, snapshot: &Snapshot, identities: &IdentityMap) -> Vec<Client> {
        let wireless = join_all(
            snapshot
                .associations
                .iter()
                .map(|assoc| self.wireless_client(assoc, identities)),
        )
        .await;

        let mut seen: HashSet<&MacAddress> = snapshot.associations.iter().map(|a| &a.mac).collect();
        let wired_leases: Vec<&LeaseRecord> = snapshot
            .leases
            .iter()
            .filter(|lease| seen.insert(&lease.mac))
            .collect();
        let wired = join_all(wired_leases.into_iter().map(|lease| self.wired_client(lease))).await;

        wireless.into_iter().chain(wired).collect()
    }

    async fn wireless_client(&self, assoc: &WifiAssociation, identities: &IdentityMap) -> Client {
        let identity = identities.get(&assoc.mac).cloned().unwrap_or_default();

        let mut resolved = identity.name;
        if resolved.is_none() {
            if let Some(ip @ IpAddr::V4(_)) = identity.ip {
                resolved = self.dns.resolve(ip).await;
            }
        }

        self.build(
            &assoc.mac,
            identity.ip,
            resolved,
            assoc.signal_dbm,
            ConnectionType::Wireless,
        )
        .await
    }

    async fn wired_client(&self, lease: &LeaseRecord) -> Client {
        self.build(
            &lease.mac,
            Some(lease.ip),
            lease.name.clone(),
            None,
            ConnectionType::Wired,
        )
        .await
    }

    /// Name priority: user-assigned, then DNS/lease, then vendor placeholder.
    async fn build(
        &self,
        mac: &MacAddress,
        ip: Option<IpAddr>,
        resolved: Option<String>,
        signal_dbm: Option<i32>,
        connection: ConnectionType,
    ) -> Client {
        let manufacturer = self.vendors.lookup(mac);
        let name = match self.names.lookup_name(mac).await {
            Some(custom) => custom,
            None => resolved.unwrap_or_else(|| {
                if manufacturer.is_known() {
                    format!("{manufacturer} Device")
                } else {
                    UNKNOWN_DEVICE.to_owned()
                }
            }),
        };

        Client {
            mac: mac.clone(),
            ip,
            name,
            manufacturer: manufacturer.to_string(),
            signal_dbm,
            connection,
        }
    }
}

/// Clients not present in the previous synced list of a router that was online.
///
/// A router's first successful cycle, or its first cycle back after being
/// offline, never reports new clients.
pub fn new_clients<'c>(previous: &RouterStatus, current: &'c [Client]) -> Vec<&'c Client> {
    if previous.state != RouterState::Online || !previous.synced {
        return Vec::new();
    }
    let known: HashSet<&MacAddress> = previous.clients.iter().map(|c| &c.mac).collect();
    current.iter().filter(|c| !known.contains(&c.mac)).collect()
}

/// Alert text for a newly joined client, in Telegram Markdown.
/// Names come from DHCP and users, so they are escaped outside any entity.
pub fn new_client_alert(client: &Client, router_name: &str) -> String {
    format!(
        "*New device*\nRouter: {}\nName: {}\nMAC: `{}`",
        escape_markdown(router_name),
        escape_markdown(&client.name),
        client.mac
    )
}

/// Backslash-escape the characters legacy Telegram Markdown treats as markup.
fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
