// ── Runtime sync configuration ──
//
// Tuning for the sync loop and fleet commands. Never touches disk: the
// CLI builds a `SyncConfig` from its config file and hands it in.

use std::time::Duration;

use ipnetwork::Ipv4Network;

use crate::adapters::dns::DEFAULT_DNS_TIMEOUT;

/// Default fan-out limit for fleet-wide commands.
pub const DEFAULT_COMMAND_CONCURRENCY: usize = 5;

/// Configuration for the sync orchestrator.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Period of the background `sync_all`. Zero disables it.
    pub interval: Duration,
    /// Concurrent sessions for [`run_on_all`](crate::Controller::run_on_all).
    pub command_concurrency: usize,
    /// Connect + handshake + auth budget per router.
    pub ready_timeout: Duration,
    /// Reverse-DNS budget per lookup.
    pub dns_timeout: Duration,
    /// Ping-sweep the local subnet before each cycle.
    pub sweep: bool,
    /// Subnet to sweep. Defaults to the gateway router's /24.
    pub sweep_subnet: Option<Ipv4Network>,
    /// Wait between registering a router and the follow-up full sync.
    pub register_sync_delay: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            command_concurrency: DEFAULT_COMMAND_CONCURRENCY,
            ready_timeout: Duration::from_secs(10),
            dns_timeout: DEFAULT_DNS_TIMEOUT,
            sweep: true,
            sweep_subnet: None,
            register_sync_delay: Duration::from_secs(3),
        }
    }
}
