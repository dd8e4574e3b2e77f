//! Switch datapath identifiers.

use core::{fmt, str::FromStr};

/// Mask selecting the 48 bits normally derived from the switch MAC.
const MAC_BITS: u64 = 0x0000_ffff_ffff_ffff;

/// Error returned when a datapath id string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseDpidError {
    #[error("empty datapath id")]
    Empty,
    #[error("invalid datapath id octet {0:?}")]
    InvalidOctet(String),
    #[error("expected 6 octets, got {0}")]
    OctetCount(usize),
    #[error("invalid datapath id prefix {0:?}")]
    InvalidPrefix(String),
    #[error("invalid datapath id {0:?}")]
    Invalid(String),
}

/// 64-bit OpenFlow datapath identifier.
///
/// Rendered as six dash-separated hex octets of the low 48 bits, with the upper 16 bits
/// appended as `|N` only when they are non-zero:
///
/// ```
/// use dyntopo_primitives::Dpid;
///
/// assert_eq!(Dpid::new(1).to_string(), "00-00-00-00-00-01");
/// assert_eq!(Dpid::new(0x0002_0000_0000_00ff).to_string(), "00-00-00-00-00-ff|2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Dpid(u64);

impl Dpid {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Upper 16 bits, usually zero.
    pub const fn prefix(&self) -> u16 {
        (self.0 >> 48) as u16
    }
}

impl From<u64> for Dpid {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<Dpid> for u64 {
    fn from(dpid: Dpid) -> Self {
        dpid.0
    }
}

impl fmt::Display for Dpid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0.to_be_bytes();
        for (i, byte) in bytes.iter().skip(2).enumerate() {
            if i > 0 {
                f.write_str("-")?;
            }
            write!(f, "{byte:02x}")?;
        }
        if self.prefix() != 0 {
            write!(f, "|{}", self.prefix())?;
        }
        Ok(())
    }
}

impl FromStr for Dpid {
    type Err = ParseDpidError;

    /// Accepts the dashed form (with optional `|prefix`), `0x` hex, or a decimal integer.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseDpidError::Empty);
        }

        if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            return u64::from_str_radix(hex, 16)
                .map(Self)
                .map_err(|_| ParseDpidError::Invalid(s.to_owned()));
        }

        if !s.contains('-') && !s.contains('|') {
            return s
                .parse::<u64>()
                .map(Self)
                .map_err(|_| ParseDpidError::Invalid(s.to_owned()));
        }

        let (octets, prefix) = match s.split_once('|') {
            Some((octets, prefix)) => {
                let prefix = prefix
                    .parse::<u16>()
                    .map_err(|_| ParseDpidError::InvalidPrefix(prefix.to_owned()))?;
                (octets, prefix)
            }
            None => (s, 0),
        };

        let parts: Vec<&str> = octets.split('-').collect();
        if parts.len() != 6 {
            return Err(ParseDpidError::OctetCount(parts.len()));
        }

        let mut raw = 0u64;
        for part in parts {
            if part.is_empty() || part.len() > 2 {
                return Err(ParseDpidError::InvalidOctet(part.to_owned()));
            }
            let octet = u8::from_str_radix(part, 16)
                .map_err(|_| ParseDpidError::InvalidOctet(part.to_owned()))?;
            raw = (raw << 8) | u64::from(octet);
        }

        Ok(Self((u64::from(prefix) << 48) | (raw & MAC_BITS)))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Dpid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Dpid {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
