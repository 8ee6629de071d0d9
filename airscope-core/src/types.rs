//! Common types used throughout airscope

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// MAC Address (6 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    /// Broadcast MAC address (ff:ff:ff:ff:ff:ff)
    pub const BROADCAST: MacAddr = MacAddr([0xff; 6]);

    /// Zero MAC address (00:00:00:00:00:00)
    pub const ZERO: MacAddr = MacAddr([0x00; 6]);

    /// Create a new MAC address
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Create a MAC address from a 6-byte slice
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        let bytes: [u8; 6] = slice.try_into().ok()?;
        Some(Self(bytes))
    }

    /// Get bytes as slice
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Check if this is the broadcast address
    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    /// Check if this is a group address (bit 0 of first octet set)
    pub fn is_multicast(&self) -> bool {
        self.0[0] & 0x01 != 0
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddr {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split(|c| c == ':' || c == '-').collect();
        if parts.len() != 6 {
            return Err(crate::Error::InvalidMac(s.to_string()));
        }

        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            bytes[i] = u8::from_str_radix(part, 16)
                .map_err(|_| crate::Error::InvalidMac(s.to_string()))?;
        }

        Ok(MacAddr(bytes))
    }
}

impl From<[u8; 6]> for MacAddr {
    fn from(bytes: [u8; 6]) -> Self {
        MacAddr(bytes)
    }
}

impl Serialize for MacAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Leading octets of a MAC address, used for ignore lists
///
/// `"33:33:00:"` matches every address starting with `33:33:00`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacPrefix(Vec<u8>);

impl MacPrefix {
    /// Prefix matching exactly one address
    pub fn exact(mac: MacAddr) -> Self {
        Self(mac.0.to_vec())
    }

    /// Check whether `mac` starts with this prefix
    pub fn matches(&self, mac: &MacAddr) -> bool {
        mac.0.starts_with(&self.0)
    }
}

impl FromStr for MacPrefix {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let octets: Vec<u8> = s
            .trim()
            .split(':')
            .filter(|part| !part.is_empty())
            .map(|part| u8::from_str_radix(part, 16))
            .collect::<Result<_, _>>()
            .map_err(|_| crate::Error::InvalidMac(s.to_string()))?;

        if octets.is_empty() || octets.len() > 6 {
            return Err(crate::Error::InvalidMac(s.to_string()));
        }
        Ok(Self(octets))
    }
}

impl fmt::Display for MacPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|b| format!("{:02x}", b)).collect();
        write!(f, "{}", parts.join(":"))?;
        if self.0.len() < 6 {
            write!(f, ":")?;
        }
        Ok(())
    }
}

/// Security scheme advertised by an access point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Crypto {
    /// Open network
    #[serde(rename = "OPN")]
    Opn,
    /// Legacy WEP (privacy bit without RSN/WPA elements)
    #[serde(rename = "WEP")]
    Wep,
    /// WPA (vendor-specific Microsoft element)
    #[serde(rename = "WPA")]
    Wpa,
    /// WPA2 (RSN element)
    #[serde(rename = "WPA2")]
    Wpa2,
}

impl fmt::Display for Crypto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crypto::Opn => write!(f, "OPN"),
            Crypto::Wep => write!(f, "WEP"),
            Crypto::Wpa => write!(f, "WPA"),
            Crypto::Wpa2 => write!(f, "WPA2"),
        }
    }
}

/// Accumulated set of crypto labels
pub type CryptoSet = BTreeSet<Crypto>;

/// Render a crypto set as `WEP,WPA2`
pub fn crypto_label(set: &CryptoSet) -> String {
    set.iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// IEEE 802.11 channel number
pub type Channel = u8;
