//! The shared switch/host identifier namespace.

use core::{fmt, str::FromStr};

use crate::dpid::{Dpid, ParseDpidError};
use crate::mac::{MacAddr, ParseMacError};

/// Local switch port number.
pub type PortNo = u32;

/// Identifier of a node in the topology graph.
///
/// Switches and hosts live in one namespace; the variant tag keeps a dpid and a MAC with the
/// same bit pattern apart. Switches order before hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityId {
    Switch(Dpid),
    Host(MacAddr),
}

impl EntityId {
    pub fn is_switch(&self) -> bool {
        matches!(self, Self::Switch(_))
    }

    pub fn is_host(&self) -> bool {
        matches!(self, Self::Host(_))
    }

    pub fn as_switch(&self) -> Option<Dpid> {
        match self {
            Self::Switch(dpid) => Some(*dpid),
            Self::Host(_) => None,
        }
    }

    pub fn as_host(&self) -> Option<MacAddr> {
        match self {
            Self::Host(mac) => Some(*mac),
            Self::Switch(_) => None,
        }
    }
}

impl From<Dpid> for EntityId {
    fn from(dpid: Dpid) -> Self {
        Self::Switch(dpid)
    }
}

impl From<MacAddr> for EntityId {
    fn from(mac: MacAddr) -> Self {
        Self::Host(mac)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Switch(dpid) => dpid.fmt(f),
            Self::Host(mac) => mac.fmt(f),
        }
    }
}

/// Error returned when an entity id string is neither a MAC nor a dpid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseEntityIdError {
    #[error("invalid host id: {0}")]
    Host(#[from] ParseMacError),
    #[error("invalid switch id: {0}")]
    Switch(#[from] ParseDpidError),
}

impl FromStr for EntityId {
    type Err = ParseEntityIdError;

    /// Colon-separated strings are hosts, everything else is a dpid.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains(':') {
            Ok(Self::Host(s.parse()?))
        } else {
            Ok(Self::Switch(s.parse()?))
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for EntityId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for EntityId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
