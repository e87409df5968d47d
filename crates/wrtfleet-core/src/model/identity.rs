// ── Core identity types ──
//
// RouterId and MacAddress key every record in the fleet: routers by
// their configured name, clients by hardware address.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── RouterId ────────────────────────────────────────────────────────

/// Stable identifier for a managed router (its configured name).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouterId(String);

impl RouterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RouterId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for RouterId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ── MacAddress ──────────────────────────────────────────────────────

/// MAC address, normalized to lowercase colon-separated format (aa:bb:cc:dd:ee:ff).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MacAddress(String);

impl MacAddress {
    /// Create a normalized MAC address from any common format.
    /// Accepts colon-separated or dash-separated hex; does not validate.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let normalized = raw.as_ref().trim().to_lowercase().replace('-', ":");
        Self(normalized)
    }

    /// Parse a token that must look like a MAC: six two-digit hex groups.
    pub fn parse(raw: &str) -> Option<Self> {
        let mac = Self::new(raw);
        let groups: Vec<&str> = mac.0.split(':').collect();
        let well_formed = groups.len() == 6
            && groups
                .iter()
                .all(|g| g.len() == 2 && g.chars().all(|c| c.is_ascii_hexdigit()));
        well_formed.then_some(mac)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Vendor prefix (first three octets), e.g. `"3c:22:fb"`.
    pub fn oui(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }

    /// All-zero addresses show up for incomplete neighbor entries.
    pub fn is_zero(&self) -> bool {
        self.0 == "00:00:00:00:00:00"
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MacAddress {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}
