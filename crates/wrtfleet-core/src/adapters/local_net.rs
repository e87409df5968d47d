// The controller host's own neighbor table and ICMP sweep.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream;
use ipnetwork::Ipv4Network;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::model::ArpEntry;
use crate::parser;
use crate::ports::LocalNetwork;

const PING_TIMEOUT: Duration = Duration::from_millis(500);
const PING_PAYLOAD: [u8; 56] = [0; 56];
const SWEEP_CONCURRENCY: usize = 64;
/// Refuse to sweep anything larger than a /16.
const MAX_SWEEP_HOSTS: u32 = 1 << 16;

/// Reads `ip neigh` (falling back to `/proc/net/arp`) and pings with
/// `surge-ping`. ICMP needs raw-socket privileges; without them every
/// probe fails quietly and the sweep is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemNetwork;

async fn ip_neigh() -> Option<String> {
    let output = Command::new("ip").args(["neigh", "show"]).output().await.ok()?;
    output
        .status
        .success()
        .then(|| String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Usable host addresses: network and broadcast are skipped for /30 and wider.
fn sweep_targets(subnet: Ipv4Network) -> impl Iterator<Item = Ipv4Addr> {
    let (network, broadcast) = (subnet.network(), subnet.broadcast());
    let edges = subnet.prefix() < 31;
    subnet
        .iter()
        .filter(move |ip| !edges || (*ip != network && *ip != broadcast))
}

#[async_trait]
impl LocalNetwork for SystemNetwork {
    async fn neighbors(&self) -> Vec<ArpEntry> {
        if let Some(neigh) = ip_neigh().await {
            return parser::neighbor_table("", &neigh);
        }
        match tokio::fs::read_to_string("/proc/net/arp").await {
            Ok(arp) => parser::neighbor_table(&arp, ""),
            Err(e) => {
                debug!(error = %e, "no local neighbor table available");
                Vec::new()
            }
        }
    }

    async fn sweep(&self, subnet: Ipv4Network) {
        if subnet.size() > MAX_SWEEP_HOSTS {
            warn!(%subnet, "subnet too large to sweep");
            return;
        }
        debug!(%subnet, "sweeping subnet");
        stream::iter(sweep_targets(subnet))
            .for_each_concurrent(SWEEP_CONCURRENCY, |ip| async move {
                let target = IpAddr::V4(ip);
                match timeout(PING_TIMEOUT, surge_ping::ping(target, &PING_PAYLOAD)).await {
                    Ok(Ok(_)) => trace!(%target, "ping reply"),
                    Ok(Err(e)) => trace!(%target, error = %e, "ping failed"),
                    Err(_) => {}
                }
            })
            .await;
    }
}
