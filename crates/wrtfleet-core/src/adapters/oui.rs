// Built-in vendor prefix table.

use crate::model::{MacAddress, Manufacturer};
use crate::ports::VendorLookup;

/// Common consumer vendors seen on home networks.
const PREFIXES: &[(&str, &str)] = &[
    // Apple
    ("00:05:02", "Apple"),
    ("00:03:93", "Apple"),
    ("3c:22:fb", "Apple"),
    ("d8:a2:5e", "Apple"),
    ("fc:fc:48", "Apple"),
    ("28:cf:da", "Apple"),
    ("00:1c:b3", "Apple"),
    ("f4:5c:89", "Apple"),
    // VMware
    ("00:15:ad", "VMware"),
    ("00:0c:29", "VMware"),
    ("00:50:56", "VMware"),
    // Samsung
    ("b4:21:c7", "Samsung"),
    ("f0:25:b7", "Samsung"),
    ("38:aa:3c", "Samsung"),
    ("b0:70:2d", "Samsung"),
    ("64:16:66", "Samsung"),
    ("dc:2c:26", "Samsung"),
    ("ac:5a:f0", "Samsung"),
    ("1c:5a:3e", "Samsung"),
    // Google
    ("00:1a:11", "Google"),
    ("3c:5a:b4", "Google"),
    ("d8:0d:17", "Google"),
    // Xiaomi
    ("00:ec:0a", "Xiaomi"),
    ("64:90:c1", "Xiaomi"),
    ("98:2c:be", "Xiaomi"),
    // Microsoft
    ("00:1d:d9", "Microsoft"),
    ("24:4b:fe", "Microsoft"),
    ("44:37:e6", "Microsoft"),
    // Realtek
    ("00:e0:4c", "Realtek"),
    // Shenzhen
    ("00:1e:10", "Shenzhen"),
    ("00:26:37", "Shenzhen"),
    // Espressif
    ("ec:fa:bc", "Espressif (IoT)"),
    ("24:b2:de", "Espressif (IoT)"),
    ("30:ae:a4", "Espressif (IoT)"),
    ("4c:11:ae", "Espressif (IoT)"),
    ("80:7d:3a", "Espressif (IoT)"),
    ("a4:cf:12", "Espressif (IoT)"),
    // TP-Link
    ("84:0d:8e", "TP-Link"),
    ("50:c7:bf", "TP-Link"),
    ("00:31:92", "TP-Link"),
    ("e8:48:b8", "TP-Link"),
    ("b0:4e:26", "TP-Link"),
    // Dell
    ("c0:25:a5", "Dell"),
    ("d4:81:d7", "Dell"),
    ("14:b3:1f", "Dell"),
    ("b8:2a:72", "Dell"),
    // HP
    ("00:21:70", "HP"),
    ("3c:d9:2b", "HP"),
    ("d8:9d:67", "HP"),
];

/// Static OUI lookup. Unknown prefixes map to [`Manufacturer::Generic`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OuiTable;

impl VendorLookup for OuiTable {
    fn lookup(&self, mac: &MacAddress) -> Manufacturer {
        let oui = mac.oui();
        PREFIXES
            .iter()
            .find(|(prefix, _)| *prefix == oui)
            .map_or(Manufacturer::Generic, |(_, vendor)| {
                Manufacturer::Known((*vendor).to_owned())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_prefixes_resolve_case_insensitively() {
        let table = OuiTable;
        assert_eq!(
            table.lookup(&MacAddress::new("3C:22:FB:AA:BB:CC")),
            Manufacturer::Known("Apple".into())
        );
        assert_eq!(
            table.lookup(&MacAddress::new("a4-cf-12-00-00-01")).to_string(),
            "Espressif (IoT)"
        );
    }

    #[test]
    fn unknown_prefix_is_generic() {
        let vendor = OuiTable.lookup(&MacAddress::new("11:22:33:44:55:66"));
        assert!(!vendor.is_known());
        assert_eq!(vendor.to_string(), "Generic Device");
    }

    #[test]
    fn table_prefixes_are_normalized() {
        for (prefix, _) in PREFIXES {
            assert_eq!(MacAddress::new(prefix).as_str(), *prefix);
            assert_eq!(prefix.len(), 8);
        }
    }
}
