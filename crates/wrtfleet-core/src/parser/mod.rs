// ── Diagnostic output parser ──
//
// Turns the raw text of one diagnostic run into a `Snapshot`. Parsing
// is best-effort and infallible: a missing or garbled section leaves
// its fields at zero/empty, since what a router reports depends on its
// firmware and installed packages.

mod dhcp_conf;
mod system;
mod tables;
mod wireless;

use std::collections::HashMap;

use strum::{AsRefStr, EnumIter, EnumString};

use crate::model::{ArpEntry, Snapshot};

/// Sections emitted by the diagnostic script, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, EnumIter, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Section {
    Uptime,
    Load,
    Mem,
    Net,
    Leases,
    Arp,
    Wifi,
    Neigh,
    DhcpConf,
    WifiInfoDetail,
}

impl Section {
    /// The delimiter line the script echoes before this section.
    pub fn marker(self) -> String {
        format!("---{}---", self.as_ref())
    }

    fn from_marker(line: &str) -> Option<Self> {
        line.trim()
            .strip_prefix("---")?
            .strip_suffix("---")?
            .parse()
            .ok()
    }
}

/// Section name -> the lines that followed its marker.
pub(crate) type Sections<'a> = HashMap<Section, Vec<&'a str>>;

fn split_sections(raw: &str) -> Sections<'_> {
    let mut sections = Sections::new();
    let mut current = None;

    for line in raw.lines() {
        if let Some(section) = Section::from_marker(line) {
            current = Some(section);
            sections.entry(section).or_default();
            continue;
        }
        if let Some(section) = current {
            if !line.trim().is_empty() {
                sections.entry(section).or_default().push(line);
            }
        }
    }

    sections
}

/// Parse one router's diagnostic output.
pub fn parse(raw: &str) -> Snapshot {
    let sections = split_sections(raw);
    let lines = |s: Section| sections.get(&s).map_or(&[][..], Vec::as_slice);

    Snapshot {
        uptime_secs: system::uptime(lines(Section::Uptime)),
        load: system::load_average(lines(Section::Load)),
        memory: system::memory(lines(Section::Mem)),
        network: system::interface_counters(lines(Section::Net)),
        radio: wireless::radio_identity(lines(Section::WifiInfoDetail)),
        leases: tables::leases(lines(Section::Leases)),
        arp: tables::neighbors(lines(Section::Arp), lines(Section::Neigh)),
        static_hosts: dhcp_conf::static_hosts(lines(Section::DhcpConf)),
        associations: wireless::associations(lines(Section::Wifi)),
    }
}

/// Parse a host's own `/proc/net/arp` and/or `ip neigh` output.
pub(crate) fn neighbor_table(arp: &str, neigh: &str) -> Vec<ArpEntry> {
    let arp: Vec<&str> = arp.lines().collect();
    let neigh: Vec<&str> = neigh.lines().collect();
    tables::neighbors(&arp, &neigh)
}
