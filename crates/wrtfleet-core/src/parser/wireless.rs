// `iwinfo assoclist` and `iwinfo info` output.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{MacAddress, RadioIdentity, WifiAssociation};

static MAC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9A-Fa-f]{2}[:-]){5}[0-9A-Fa-f]{2}").expect("valid regex")
});
static SIGNAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-\d+").expect("valid regex"));
static ESSID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"ESSID: "([^"]+)""#).expect("valid regex"));
static MESH_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"Mesh ID: "([^"]+)""#).expect("valid regex"));
static MODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Mode: (\S+)").expect("valid regex"));

/// Associated stations across all radios, one entry per MAC.
///
/// Signal is the first negative integer after the MAC on the same line
/// (`AA:BB:CC:DD:EE:FF  -52 dBm / -95 dBm (SNR 43)`).
pub(super) fn associations(lines: &[&str]) -> Vec<WifiAssociation> {
    let mut out: Vec<WifiAssociation> = Vec::new();
    for line in lines {
        let Some(found) = MAC.find(line) else {
            continue;
        };
        let mac = MacAddress::new(found.as_str());
        let rest = line.get(found.end()..).unwrap_or_default();
        let signal_dbm = SIGNAL.find(rest).and_then(|m| m.as_str().parse().ok());

        // A station on two radios of the same router: last line wins.
        match out.iter_mut().find(|a| a.mac == mac) {
            Some(existing) => existing.signal_dbm = signal_dbm,
            None => out.push(WifiAssociation { mac, signal_dbm }),
        }
    }
    out
}

fn capture(re: &Regex, line: &str) -> Option<String> {
    re.captures(line)?.get(1).map(|m| m.as_str().to_owned())
}

/// ESSID, mesh id and mode; with several radios the last one reported wins.
pub(super) fn radio_identity(lines: &[&str]) -> RadioIdentity {
    let mut radio = RadioIdentity::default();
    for line in lines {
        if let Some(essid) = capture(&ESSID, line) {
            radio.essid = Some(essid);
        }
        if let Some(mesh_id) = capture(&MESH_ID, line) {
            radio.mesh_id = Some(mesh_id);
        }
        if let Some(mode) = capture(&MODE, line) {
            radio.mode = Some(mode);
        }
    }
    radio
}
