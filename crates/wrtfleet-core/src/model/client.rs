// ── Client domain types ──

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use strum::Display;

use super::identity::MacAddress;

/// How a client reaches the router it was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionType {
    Wired,
    Wireless,
}

/// Vendor-prefix lookup result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Manufacturer {
    Known(String),
    /// Prefix not in the table.
    Generic,
}

impl Manufacturer {
    pub const GENERIC_LABEL: &'static str = "Generic Device";

    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Known(name) => name,
            Self::Generic => Self::GENERIC_LABEL,
        }
    }
}

impl fmt::Display for Manufacturer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A client as seen by one router, recomputed every sync cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub mac: MacAddress,
    /// `None` when no source produced a usable address.
    pub ip: Option<IpAddr>,
    pub name: String,
    pub manufacturer: String,
    pub signal_dbm: Option<i32>,
    #[serde(rename = "type")]
    pub connection: ConnectionType,
}

impl Client {
    pub fn is_wireless(&self) -> bool {
        self.connection == ConnectionType::Wireless
    }
}
