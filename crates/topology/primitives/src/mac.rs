//! Ethernet MAC addresses used as host identities.

use core::{fmt, str::FromStr};

/// Error returned when a MAC address string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseMacError {
    #[error("expected 6 octets, got {0}")]
    OctetCount(usize),
    #[error("invalid MAC octet {0:?}")]
    InvalidOctet(String),
}

/// 48-bit Ethernet address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MacAddr([u8; 6]);

impl MacAddr {
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Builds an address from the low 48 bits of `raw`.
    pub fn from_u64(raw: u64) -> Self {
        let bytes = raw.to_be_bytes();
        let mut octets = [0u8; 6];
        for (dst, src) in octets.iter_mut().zip(bytes.iter().skip(2)) {
            *dst = *src;
        }
        Self(octets)
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(octets: [u8; 6]) -> Self {
        Self(octets)
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for MacAddr {
    type Err = ParseMacError;

    /// Accepts `:` or `-` separated octets.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let sep = if s.contains(':') { ':' } else { '-' };
        let parts: Vec<&str> = s.trim().split(sep).collect();
        if parts.len() != 6 {
            return Err(ParseMacError::OctetCount(parts.len()));
        }

        let mut octets = [0u8; 6];
        for (octet, part) in octets.iter_mut().zip(parts) {
            if part.is_empty() || part.len() > 2 {
                return Err(ParseMacError::InvalidOctet(part.to_owned()));
            }
            *octet = u8::from_str_radix(part, 16)
                .map_err(|_| ParseMacError::InvalidOctet(part.to_owned()))?;
        }
        Ok(Self(octets))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for MacAddr {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for MacAddr {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
