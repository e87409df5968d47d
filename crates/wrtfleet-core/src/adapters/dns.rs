// Reverse DNS through the system resolver.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use dns_lookup::lookup_addr;
use tokio::time::timeout;
use tracing::debug;

use crate::ports::ReverseDns;

/// Default PTR lookup budget.
pub const DEFAULT_DNS_TIMEOUT: Duration = Duration::from_millis(1500);

/// PTR lookups via `getnameinfo`, run on the blocking pool.
#[derive(Debug, Clone)]
pub struct SystemDns {
    timeout: Duration,
}

impl Default for SystemDns {
    fn default() -> Self {
        Self::new(DEFAULT_DNS_TIMEOUT)
    }
}

impl SystemDns {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ReverseDns for SystemDns {
    async fn resolve(&self, ip: IpAddr) -> Option<String> {
        let lookup = tokio::task::spawn_blocking(move || lookup_addr(&ip));
        match timeout(self.timeout, lookup).await {
            Ok(Ok(Ok(host))) => usable_hostname(&host, ip),
            Ok(Ok(Err(e))) => {
                debug!(%ip, error = %e, "reverse lookup failed");
                None
            }
            Ok(Err(e)) => {
                debug!(%ip, error = %e, "reverse lookup task failed");
                None
            }
            Err(_) => {
                debug!(%ip, "reverse lookup timed out");
                None
            }
        }
    }
}

/// `getnameinfo` echoes the numeric address when there is no PTR record.
fn usable_hostname(host: &str, ip: IpAddr) -> Option<String> {
    let host = host.trim_end_matches('.');
    if host.is_empty() || host.parse::<IpAddr>().is_ok_and(|h| h == ip) {
        None
    } else {
        Some(host.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn numeric_answer_is_not_a_name() {
        let ip: IpAddr = "192.168.1.20".parse().unwrap();
        assert_eq!(usable_hostname("192.168.1.20", ip), None);
        assert_eq!(usable_hostname("", ip), None);
        assert_eq!(usable_hostname("laptop.lan.", ip).as_deref(), Some("laptop.lan"));
    }

    #[tokio::test]
    async fn loopback_lookup_never_errors() {
        let dns = SystemDns::new(Duration::from_millis(500));
        // Result depends on the host resolver; it must simply return.
        let _ = dns.resolve("127.0.0.1".parse().unwrap()).await;
    }
}
