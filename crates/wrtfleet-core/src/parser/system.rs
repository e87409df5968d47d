// Uptime, load, memory and interface counters.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{InterfaceCounters, LoadAverage, MemoryStats};

// BusyBox ifconfig: "RX bytes:123 (120.5 KiB)"
static LEGACY_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"RX bytes:(\d+)").expect("valid regex"));
static LEGACY_TX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"TX bytes:(\d+)").expect("valid regex"));
// net-tools 2.x: "RX packets 1000  bytes 123 (120.5 KiB)"
static MODERN_RX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"RX packets \d+\s+bytes (\d+)").expect("valid regex"));
static MODERN_TX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"TX packets \d+\s+bytes (\d+)").expect("valid regex"));

fn first_line<'a>(lines: &[&'a str]) -> &'a str {
    lines.first().copied().unwrap_or_default()
}

/// A finite, non-negative float; anything else is 0.
fn gauge(token: &str) -> f64 {
    token
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0)
}

/// `/proc/uptime`: first field, seconds since boot.
pub(super) fn uptime(lines: &[&str]) -> f64 {
    first_line(lines)
        .split_whitespace()
        .next()
        .map_or(0.0, gauge)
}

/// `/proc/loadavg`: first three fields.
pub(super) fn load_average(lines: &[&str]) -> LoadAverage {
    let mut fields = first_line(lines).split_whitespace().map(gauge);
    LoadAverage {
        one: fields.next().unwrap_or(0.0),
        five: fields.next().unwrap_or(0.0),
        fifteen: fields.next().unwrap_or(0.0),
    }
}

/// First numeric field of a `/proc/meminfo` line, e.g. `"MemFree:  10000 kB"`.
fn meminfo_value(line: &str) -> u64 {
    line.split_whitespace()
        .nth(1)
        .and_then(|t| t.parse().ok())
        .unwrap_or(0)
}

pub(super) fn memory(lines: &[&str]) -> MemoryStats {
    let (mut total, mut free, mut buffers, mut cached) = (0, 0, 0, 0);
    for line in lines {
        let line = line.trim();
        if line.starts_with("MemTotal:") {
            total = meminfo_value(line);
        } else if line.starts_with("MemFree:") {
            free = meminfo_value(line);
        } else if line.starts_with("Buffers:") {
            buffers = meminfo_value(line);
        } else if line.starts_with("Cached:") {
            cached = meminfo_value(line);
        }
    }
    MemoryStats::from_meminfo(total, free, buffers, cached)
}

fn capture_u64(re: &Regex, text: &str) -> Option<u64> {
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

/// Byte counters from `ifconfig`, legacy format first, then modern.
pub(super) fn interface_counters(lines: &[&str]) -> InterfaceCounters {
    let text = lines.join("\n");
    InterfaceCounters {
        rx_bytes: capture_u64(&LEGACY_RX, &text)
            .or_else(|| capture_u64(&MODERN_RX, &text))
            .unwrap_or(0),
        tx_bytes: capture_u64(&LEGACY_TX, &text)
            .or_else(|| capture_u64(&MODERN_TX, &text))
            .unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbled_uptime_is_zero() {
        assert!(uptime(&["up a while"]).abs() < f64::EPSILON);
        assert!(uptime(&[]).abs() < f64::EPSILON);
    }

    #[test]
    fn short_loadavg_pads_with_zero() {
        let load = load_average(&["0.42"]);
        assert!((load.one - 0.42).abs() < f64::EPSILON);
        assert!(load.five.abs() < f64::EPSILON);
        assert!(load.fifteen.abs() < f64::EPSILON);
    }

    #[test]
    fn memory_ignores_swap_cached() {
        let mem = memory(&[
            "MemTotal: 1000 kB",
            "MemFree: 100 kB",
            "Buffers: 50 kB",
            "Cached: 250 kB",
            "SwapCached: 999 kB",
        ]);
        assert_eq!(mem.used_kb, 600);
        assert_eq!(mem.percent, 60);
    }

    #[test]
    fn oversized_meminfo_does_not_overflow() {
        let mem = memory(&["MemTotal: 9999999999999999999 kB", "MemFree: 0 kB"]);
        assert_eq!(mem.total_kb, 9_999_999_999_999_999_999);
        assert_eq!(mem.used_kb, mem.total_kb);
        assert_eq!(mem.percent, 100);

        let mem = memory(&["MemTotal: 99999999999999999999999 kB", "MemFree: 10 kB"]);
        assert_eq!(mem.total_kb, 0);
        assert_eq!(mem.percent, 0);
    }

    #[test]
    fn meminfo_reads_only_the_first_number() {
        let mem = memory(&["MemTotal: 12 34 kB", "MemFree: 6 kB"]);
        assert_eq!(mem.total_kb, 12);
        assert_eq!(mem.used_kb, 6);
        assert_eq!(mem.percent, 50);

        let garbled = memory(&["MemTotal: lots kB", "MemFree: 5 kB"]);
        assert_eq!(garbled.percent, 0);
    }

    #[test]
    fn non_finite_gauges_are_zero() {
        assert!(uptime(&["inf 12.0"]).abs() < f64::EPSILON);
        assert!(uptime(&["-5.0 1.0"]).abs() < f64::EPSILON);
        let load = load_average(&["NaN 1e400 0.5 1/120 4242"]);
        assert!(load.one.abs() < f64::EPSILON);
        assert!(load.five.abs() < f64::EPSILON);
        assert!((load.fifteen - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn modern_ifconfig_counters() {
        let counters = interface_counters(&[
            "br-lan: flags=4163<UP,BROADCAST,RUNNING,MULTICAST>  mtu 1500",
            "        RX packets 5321  bytes 987654 (964.5 KiB)",
            "        TX packets 4210  bytes 123000 (120.1 KiB)",
        ]);
        assert_eq!(counters.rx_bytes, 987_654);
        assert_eq!(counters.tx_bytes, 123_000);
    }

    #[test]
    fn missing_counters_are_zero() {
        let counters = interface_counters(&["br-lan: error fetching interface information"]);
        assert_eq!(counters, InterfaceCounters::default());
    }
}
