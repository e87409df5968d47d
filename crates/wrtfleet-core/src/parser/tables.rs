// DHCP leases and ARP / kernel neighbor tables.

use std::collections::BTreeMap;
use std::net::IpAddr;

use crate::model::{ArpEntry, LeaseRecord, MacAddress};

/// `ip neigh` line: `<ip> dev <iface> lladdr <mac> <STATE>`.
fn neigh_fields(parts: &[&str]) -> Option<(IpAddr, MacAddress)> {
    let idx = parts.iter().position(|p| *p == "lladdr")?;
    let mac = MacAddress::parse(parts.get(idx + 1)?)?;
    let ip = parts.first()?.parse().ok()?;
    Some((ip, mac))
}

/// Lease table lines.
///
/// Accepts the dnsmasq lease format (`<expiry> <mac> <ip> <name> <client-id>`)
/// and, for gateways without a lease file, `ip neigh` output.
pub(super) fn leases(lines: &[&str]) -> Vec<LeaseRecord> {
    let mut out = Vec::new();
    for line in lines {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let record = match parts.as_slice() {
            [_, mac, ip, name, ..] if mac.contains(':') => {
                let (Some(mac), Ok(ip)) = (MacAddress::parse(mac), ip.parse::<IpAddr>()) else {
                    continue;
                };
                let name = (*name != "*").then(|| (*name).to_owned());
                LeaseRecord { mac, ip, name }
            }
            _ if parts.len() >= 5 => {
                let Some((ip, mac)) = neigh_fields(&parts) else {
                    continue;
                };
                LeaseRecord { mac, ip, name: None }
            }
            _ => continue,
        };
        if !record.mac.is_zero() {
            out.push(record);
        }
    }
    out
}

/// Prefer IPv4; an IPv6 address only fills an empty slot.
fn insert_preferring_v4(table: &mut BTreeMap<MacAddress, IpAddr>, mac: MacAddress, ip: IpAddr) {
    if mac.is_zero() {
        return;
    }
    if ip.is_ipv4() {
        table.insert(mac, ip);
    } else {
        table.entry(mac).or_insert(ip);
    }
}

/// `/proc/net/arp` and `ip neigh` merged into one address per MAC.
pub(super) fn neighbors(arp: &[&str], neigh: &[&str]) -> Vec<ArpEntry> {
    let mut table = BTreeMap::new();

    for line in arp {
        // IP address  HW type  Flags  HW address  Mask  Device
        let parts: Vec<&str> = line.split_whitespace().collect();
        let (Some(ip), Some(mac)) = (parts.first(), parts.get(3)) else {
            continue;
        };
        let (Ok(ip), Some(mac)) = (ip.parse::<IpAddr>(), MacAddress::parse(mac)) else {
            continue;
        };
        insert_preferring_v4(&mut table, mac, ip);
    }

    for line in neigh {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 5 {
            continue;
        }
        if let Some((ip, mac)) = neigh_fields(&parts) {
            insert_preferring_v4(&mut table, mac, ip);
        }
    }

    table
        .into_iter()
        .map(|(mac, ip)| ArpEntry { mac, ip })
        .collect()
}
