// Static host bindings from UCI `/etc/config/dhcp`.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{MacAddress, StaticHostBinding};

static OPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*option\s+(\w+)\s+(?:'([^']*)'|"([^"]*)"|(\S+))"#).expect("valid regex")
});

/// `option <key> <value>` with single, double, or no quotes.
fn option(line: &str) -> Option<(&str, &str)> {
    let caps = OPTION.captures(line)?;
    let key = caps.get(1)?.as_str();
    let value = caps.get(2).or(caps.get(3)).or(caps.get(4))?.as_str();
    Some((key, value))
}

#[derive(Default)]
struct HostBlock<'a> {
    macs: Option<&'a str>,
    name: Option<&'a str>,
}

impl HostBlock<'_> {
    fn emit(&self, out: &mut Vec<StaticHostBinding>) {
        let (Some(macs), Some(name)) = (self.macs, self.name) else {
            return;
        };
        // `option mac` may list several space-separated addresses.
        for mac in macs.split_whitespace().filter_map(MacAddress::parse) {
            out.push(StaticHostBinding {
                mac,
                name: name.to_owned(),
            });
        }
    }
}

/// Every `config host` section that carries both a MAC and a name.
pub(super) fn static_hosts(lines: &[&str]) -> Vec<StaticHostBinding> {
    let mut out = Vec::new();
    let mut block: Option<HostBlock<'_>> = None;

    for &line in lines {
        let trimmed = line.trim();
        if let Some(kind) = trimmed.strip_prefix("config ") {
            if let Some(done) = block.take() {
                done.emit(&mut out);
            }
            if kind.split_whitespace().next() == Some("host") {
                block = Some(HostBlock::default());
            }
            continue;
        }
        let (Some(current), Some((key, value))) = (block.as_mut(), option(trimmed)) else {
            continue;
        };
        match key {
            "mac" => current.macs = Some(value),
            "name" => current.name = Some(value),
            _ => {}
        }
    }
    if let Some(done) = block {
        done.emit(&mut out);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_host_sections_only() {
        let out = static_hosts(&[
            "config dnsmasq",
            "\toption domain 'lan'",
            "config host",
            "\toption name 'nas'",
            "\toption mac 'AA:BB:CC:DD:EE:10 aa:bb:cc:dd:ee:11'",
            "\toption ip '192.168.1.10'",
            "config host",
            "\toption mac \"aa:bb:cc:dd:ee:12\"",
            "config domain",
            "\toption name 'router.lan'",
            "config host",
            "\toption name \"tv\"",
            "\toption mac aa:bb:cc:dd:ee:13",
        ]);

        let pairs: Vec<(&str, &str)> = out.iter().map(|b| (b.mac.as_str(), b.name.as_str())).collect();
        assert_eq!(
            pairs,
            vec![
                ("aa:bb:cc:dd:ee:10", "nas"),
                ("aa:bb:cc:dd:ee:11", "nas"),
                ("aa:bb:cc:dd:ee:13", "tv"),
            ]
        );
    }

    #[test]
    fn empty_config_has_no_hosts() {
        assert!(static_hosts(&[]).is_empty());
    }
}
