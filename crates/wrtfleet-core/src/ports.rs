// ── Collaborator interfaces ──
//
// The sync pipeline talks to the outside world only through these
// traits. Production implementations live in `adapters` and `store`;
// tests substitute in-process fakes.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use ipnetwork::Ipv4Network;
use wrtfleet_ssh::ShellTarget;

use crate::error::CoreError;
use crate::model::{ArpEntry, MacAddress, Manufacturer, Router, RouterId, StatusUpdate};

/// Source of managed routers and sink for their status.
#[async_trait]
pub trait RouterRegistry: Send + Sync {
    async fn list_routers(&self) -> Result<Vec<Router>, CoreError>;

    async fn get_router(&self, id: &RouterId) -> Result<Router, CoreError>;

    /// Fails with [`CoreError::RouterExists`] if the id is taken.
    async fn add_router(&self, router: Router) -> Result<(), CoreError>;

    /// Apply a partial update; unset fields keep their stored value.
    async fn update_status(&self, id: &RouterId, update: StatusUpdate) -> Result<(), CoreError>;
}

/// User-assigned client names, keyed by MAC.
#[async_trait]
pub trait NameRegistry: Send + Sync {
    async fn lookup_name(&self, mac: &MacAddress) -> Option<String>;
}

/// PTR lookups. Implementations bound their own latency and never fail.
#[async_trait]
pub trait ReverseDns: Send + Sync {
    async fn resolve(&self, ip: IpAddr) -> Option<String>;
}

/// Vendor-prefix (OUI) lookup. Pure and total.
pub trait VendorLookup: Send + Sync {
    fn lookup(&self, mac: &MacAddress) -> Manufacturer;
}

/// Fire-and-forget alert delivery. Must not block the caller.
pub trait AlertNotifier: Send + Sync {
    fn notify(&self, message: String);
}

/// Runs one command on a router and returns its stdout.
#[async_trait]
pub trait RemoteShell: Send + Sync {
    /// `ready_timeout` bounds connect, handshake and authentication.
    async fn run(
        &self,
        target: &ShellTarget,
        command: &str,
        ready_timeout: Duration,
    ) -> Result<String, wrtfleet_ssh::Error>;
}

/// The controller host's own view of the LAN.
#[async_trait]
pub trait LocalNetwork: Send + Sync {
    /// Current neighbor table of this host.
    async fn neighbors(&self) -> Vec<ArpEntry>;

    /// Probe every host address in `subnet`. Failures are per-address and silent.
    async fn sweep(&self, subnet: Ipv4Network);
}

#[async_trait]
impl RemoteShell for wrtfleet_ssh::SshShell {
    async fn run(
        &self,
        target: &ShellTarget,
        command: &str,
        ready_timeout: Duration,
    ) -> Result<String, wrtfleet_ssh::Error> {
        self.run_within(target, command, ready_timeout).await
    }
}
