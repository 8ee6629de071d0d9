//! Raw captured units

use bytes::Bytes;
use std::time::SystemTime;

/// Link-layer header type of a capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    /// 802.11 frames preceded by a radiotap header (DLT 127)
    Radiotap,
    /// Bare 802.11 frames (DLT 105)
    Ieee80211,
    /// Anything else; not decodable by airscope
    Other(i32),
}

impl LinkType {
    /// Map a pcap DLT value
    pub fn from_dlt(dlt: i32) -> Self {
        match dlt {
            127 => LinkType::Radiotap,
            105 => LinkType::Ieee80211,
            other => LinkType::Other(other),
        }
    }

    /// DLT value of this link type
    pub fn dlt(self) -> i32 {
        match self {
            LinkType::Radiotap => 127,
            LinkType::Ieee80211 => 105,
            LinkType::Other(dlt) => dlt,
        }
    }
}

/// A captured packet, before 802.11 decoding
#[derive(Debug, Clone)]
pub struct Packet {
    /// When the packet was captured
    pub timestamp: SystemTime,
    /// Interface or file the packet came from
    pub source: String,
    /// Link-layer header type
    pub linktype: LinkType,
    /// Packet data (including all headers)
    pub data: Bytes,
}

impl Packet {
    /// Create a new packet stamped with the current time
    pub fn new(source: impl Into<String>, linktype: LinkType, data: impl Into<Bytes>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            source: source.into(),
            linktype,
            data: data.into(),
        }
    }

    /// Get packet data as slice
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get packet length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if packet is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
