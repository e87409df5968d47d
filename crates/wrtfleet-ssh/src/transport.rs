// Shared transport configuration for building SSH client sessions.
//
// Every session opened against the fleet shares the same timeouts and
// keepalive settings through this module.

use std::sync::Arc;
use std::time::Duration;

/// Default connect/handshake/auth budget for one router.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default budget for the remote command itself once the session is up.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// Shared transport configuration for SSH sessions.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Budget for TCP connect, key exchange, and authentication.
    pub connect_timeout: Duration,
    /// Budget for the command to run to completion.
    pub command_timeout: Duration,
    /// Interval for SSH keepalives while a command runs.
    pub keepalive_interval: Option<Duration>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            keepalive_interval: Some(Duration::from_secs(15)),
        }
    }
}

impl TransportConfig {
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Build the `russh` client config from this transport config.
    pub fn build_client_config(&self) -> Arc<russh::client::Config> {
        Arc::new(russh::client::Config {
            inactivity_timeout: Some(self.command_timeout),
            keepalive_interval: self.keepalive_interval,
            ..Default::default()
        })
    }
}
