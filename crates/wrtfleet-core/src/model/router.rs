// ── Router domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use wrtfleet_ssh::{Credentials, ShellTarget};

use super::client::Client;
use super::identity::RouterId;

/// Router reachability state.
///
/// `Unknown` only exists until the first poll; every poll afterwards
/// lands in `Online` or `Offline`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RouterState {
    #[default]
    Unknown,
    Online,
    Offline,
}

impl RouterState {
    pub fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }
}

/// Radio identity derived from `iwinfo info` on the router.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RadioIdentity {
    pub essid: Option<String>,
    pub mesh_id: Option<String>,
    pub mode: Option<String>,
}

impl RadioIdentity {
    pub fn is_empty(&self) -> bool {
        self.essid.is_none() && self.mesh_id.is_none() && self.mode.is_none()
    }
}

/// Status fields written back after every poll.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouterStatus {
    pub state: RouterState,
    pub last_seen: Option<DateTime<Utc>>,
    pub last_failure: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    #[serde(default)]
    pub radio: RadioIdentity,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub client_count: usize,
    /// `clients` came from a full sync and the router has not been
    /// offline since. New clients are only reported against such a list.
    #[serde(default)]
    pub synced: bool,
}

/// A managed router: connection settings plus its last known status.
#[derive(Debug, Clone)]
pub struct Router {
    pub id: RouterId,
    /// Display name; defaults to the id.
    pub name: String,
    pub address: String,
    pub port: u16,
    pub username: String,
    pub credentials: Credentials,
    /// DHCP-authoritative gateway. Its leases win identity conflicts.
    pub is_gateway: bool,
    pub status: RouterStatus,
}

impl Router {
    pub fn new(
        id: impl Into<RouterId>,
        address: impl Into<String>,
        username: impl Into<String>,
        credentials: Credentials,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            address: address.into(),
            port: 22,
            username: username.into(),
            credentials,
            is_gateway: false,
            status: RouterStatus::default(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn gateway(mut self, is_gateway: bool) -> Self {
        self.is_gateway = is_gateway;
        self
    }

    pub fn shell_target(&self) -> ShellTarget {
        ShellTarget::new(&self.address, &self.username, self.credentials.clone())
            .with_port(self.port)
    }
}

// ── Partial status updates ──────────────────────────────────────────

/// A partial write to a router's status. `None` fields are left as-is.
#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
    pub state: Option<RouterState>,
    pub last_seen: Option<DateTime<Utc>>,
    pub last_failure: Option<DateTime<Utc>>,
    /// `Some(None)` clears the stored error.
    pub last_error: Option<Option<String>>,
    pub clients: Option<Vec<Client>>,
    pub client_count: Option<usize>,
    pub synced: Option<bool>,
    pub essid: Option<String>,
    pub mesh_id: Option<String>,
    pub radio_mode: Option<String>,
}

impl StatusUpdate {
    /// Successful poll: online, seen now, error cleared.
    pub fn online(now: DateTime<Utc>) -> Self {
        Self {
            state: Some(RouterState::Online),
            last_seen: Some(now),
            last_error: Some(None),
            ..Self::default()
        }
    }

    /// Failed poll: offline with the failure recorded. Clients are untouched.
    pub fn offline(now: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self {
            state: Some(RouterState::Offline),
            last_failure: Some(now),
            last_error: Some(Some(error.into())),
            synced: Some(false),
            ..Self::default()
        }
    }

    pub fn with_radio(mut self, radio: &RadioIdentity) -> Self {
        self.essid.clone_from(&radio.essid);
        self.mesh_id.clone_from(&radio.mesh_id);
        self.radio_mode.clone_from(&radio.mode);
        self
    }

    /// Client list from a full sync.
    pub fn with_clients(mut self, clients: Vec<Client>) -> Self {
        self.client_count = Some(clients.len());
        self.clients = Some(clients);
        self.synced = Some(true);
        self
    }

    /// Merge the set fields into `status`.
    pub fn apply(self, status: &mut RouterStatus) {
        if let Some(state) = self.state {
            status.state = state;
        }
        if let Some(ts) = self.last_seen {
            status.last_seen = Some(ts);
        }
        if let Some(ts) = self.last_failure {
            status.last_failure = Some(ts);
        }
        if let Some(err) = self.last_error {
            status.last_error = err;
        }
        if let Some(clients) = self.clients {
            status.clients = clients;
        }
        if let Some(count) = self.client_count {
            status.client_count = count;
        }
        if let Some(synced) = self.synced {
            status.synced = synced;
        }
        if let Some(essid) = self.essid {
            status.radio.essid = Some(essid);
        }
        if let Some(mesh_id) = self.mesh_id {
            status.radio.mesh_id = Some(mesh_id);
        }
        if let Some(mode) = self.radio_mode {
            status.radio.mode = Some(mode);
        }
    }
}
