// ── Diagnostic collector ──
//
// Builds the composite diagnostic script and runs it over one remote
// session per router. The script echoes one marker per section so the
// parser can split its output without knowing which commands exist on
// the router.

use std::fmt::Write as _;
use std::time::Duration;

use strum::IntoEnumIterator;
use tracing::debug;

use crate::model::{Router, Snapshot};
use crate::parser::{self, Section};
use crate::ports::RemoteShell;

/// iwinfo interface names, one per line.
const WIFI_IFACES: &str = r#"iwinfo 2>/dev/null | grep ESSID | cut -d" " -f1"#;

fn section_command(section: Section, is_gateway: bool) -> String {
    match section {
        Section::Uptime => "cat /proc/uptime".into(),
        Section::Load => "cat /proc/loadavg".into(),
        Section::Mem => "cat /proc/meminfo".into(),
        Section::Net => "ifconfig br-lan 2>/dev/null || ifconfig eth0 2>/dev/null".into(),
        // Only the gateway's lease table is authoritative; fall back to
        // the neighbor table when dnsmasq keeps its leases elsewhere.
        Section::Leases if is_gateway => "cat /tmp/dhcp.leases 2>/dev/null \
             || cat /var/lib/misc/dnsmasq.leases 2>/dev/null \
             || cat /tmp/var/lib/misc/dnsmasq.leases 2>/dev/null \
             || ip neigh show 2>/dev/null"
            .into(),
        Section::Leases => "cat /tmp/dhcp.leases 2>/dev/null".into(),
        Section::Arp => "cat /proc/net/arp 2>/dev/null".into(),
        Section::Wifi => {
            format!("{WIFI_IFACES} | while read iface; do iwinfo $iface assoclist 2>/dev/null; done")
        }
        Section::Neigh => "ip neigh show 2>/dev/null".into(),
        Section::DhcpConf => "cat /etc/config/dhcp 2>/dev/null".into(),
        Section::WifiInfoDetail => format!(
            "{WIFI_IFACES} | while read iface; do echo \"IFACE: $iface\"; iwinfo $iface info 2>/dev/null; done"
        ),
    }
}

/// The shell script run on every poll.
///
/// Each section's command is followed by `true` so a missing tool
/// cannot turn the whole run into a non-zero exit.
pub fn diagnostic_script(is_gateway: bool) -> String {
    let mut script = String::new();
    for section in Section::iter() {
        let _ = writeln!(script, "echo \"{}\"", section.marker());
        let _ = writeln!(script, "{}", section_command(section, is_gateway));
    }
    script.push_str("true\n");
    script
}

/// Run the diagnostic script on `router` and parse its output.
pub async fn collect(
    shell: &dyn RemoteShell,
    router: &Router,
    ready_timeout: Duration,
) -> Result<Snapshot, wrtfleet_ssh::Error> {
    let script = diagnostic_script(router.is_gateway);
    let raw = shell
        .run(&router.shell_target(), &script, ready_timeout)
        .await?;
    let snapshot = parser::parse(&raw);
    debug!(
        router = %router.id,
        leases = snapshot.leases.len(),
        arp = snapshot.arp.len(),
        associations = snapshot.associations.len(),
        "diagnostics collected"
    );
    Ok(snapshot)
}
