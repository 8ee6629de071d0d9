//! IEEE 802.11 MAC frames
//!
//! ## MAC Header
//!
//! ```text
//! | Frame Control (2) | Duration (2) | Addr1 (6) | Addr2 (6) | Addr3 (6) |
//! | Sequence Control (2) | Addr4 (6, WDS only) | QoS Control (2, QoS data) |
//! ```
//!
//! Decoding is lenient: a frame cut short keeps whatever addresses fit and is
//! flagged `truncated`; only data that does not even carry a frame control
//! field is rejected.

use airscope_core::{Error, MacAddr, Result};
use bytes::Bytes;
use std::time::SystemTime;

use crate::arp::ArpPacket;
use crate::eapol::EapolPacket;
use crate::ie::{self, InformationElement};
use crate::llc::{LlcSnapHeader, ETHERTYPE_ARP, ETHERTYPE_EAPOL};

/// Management frame subtypes
pub mod mgmt {
    pub const ASSOC_REQ: u8 = 0;
    pub const ASSOC_RESP: u8 = 1;
    pub const REASSOC_REQ: u8 = 2;
    pub const REASSOC_RESP: u8 = 3;
    pub const PROBE_REQ: u8 = 4;
    pub const PROBE_RESP: u8 = 5;
    pub const BEACON: u8 = 8;
    pub const ATIM: u8 = 9;
    pub const DISASSOC: u8 = 10;
    pub const AUTH: u8 = 11;
    pub const DEAUTH: u8 = 12;
    pub const ACTION: u8 = 13;
}

/// Control frame subtypes
pub mod ctrl {
    pub const WRAPPER: u8 = 7;
    pub const BLOCK_ACK_REQ: u8 = 8;
    pub const BLOCK_ACK: u8 = 9;
    pub const PS_POLL: u8 = 10;
    pub const RTS: u8 = 11;
    pub const CTS: u8 = 12;
    pub const ACK: u8 = 13;
    pub const CF_END: u8 = 14;
}

/// Data subtype bit marking QoS data
pub const DATA_QOS: u8 = 0x08;
/// Data subtype bit marking frames without a payload (Null, CF-Ack, ...)
pub const DATA_NO_PAYLOAD: u8 = 0x04;

/// Capability: privacy (WEP or better) required
pub const CAPABILITY_PRIVACY: u16 = 0x0010;

const CAPABILITY_NAMES: [&str; 16] = [
    "ESS",
    "IBSS",
    "CFP",
    "CFP-req",
    "privacy",
    "short-preamble",
    "PBCC",
    "agility",
    "spectrum-mgmt",
    "QoS",
    "short-slot",
    "APSD",
    "radio-measurement",
    "DSSS-OFDM",
    "delayed-BA",
    "immediate-BA",
];

/// Render capability bits as `ESS+privacy+short-slot`
pub fn capability_text(capability: u16) -> String {
    CAPABILITY_NAMES
        .iter()
        .enumerate()
        .filter(|(bit, _)| capability & (1 << bit) != 0)
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join("+")
}

/// 802.11 frame type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    Management,
    Control,
    Data,
    Extension,
}

/// Frame Control field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameControl(pub u16);

impl FrameControl {
    const TO_DS: u16 = 0x0100;
    const FROM_DS: u16 = 0x0200;
    const MORE_FRAGMENTS: u16 = 0x0400;
    const RETRY: u16 = 0x0800;
    const PROTECTED: u16 = 0x4000;
    const ORDER: u16 = 0x8000;

    /// Build from type and subtype with no flags set
    pub fn new(frame_type: FrameType, subtype: u8) -> Self {
        let type_bits = match frame_type {
            FrameType::Management => 0,
            FrameType::Control => 1,
            FrameType::Data => 2,
            FrameType::Extension => 3,
        };
        FrameControl((type_bits << 2) | (u16::from(subtype & 0x0f) << 4))
    }

    pub fn protocol_version(&self) -> u8 {
        (self.0 & 0x0003) as u8
    }

    pub fn frame_type(&self) -> FrameType {
        match (self.0 >> 2) & 0x03 {
            0 => FrameType::Management,
            1 => FrameType::Control,
            2 => FrameType::Data,
            _ => FrameType::Extension,
        }
    }

    pub fn subtype(&self) -> u8 {
        ((self.0 >> 4) & 0x0f) as u8
    }

    pub fn to_ds(&self) -> bool {
        self.0 & Self::TO_DS != 0
    }

    pub fn from_ds(&self) -> bool {
        self.0 & Self::FROM_DS != 0
    }

    pub fn more_fragments(&self) -> bool {
        self.0 & Self::MORE_FRAGMENTS != 0
    }

    pub fn retry(&self) -> bool {
        self.0 & Self::RETRY != 0
    }

    pub fn protected(&self) -> bool {
        self.0 & Self::PROTECTED != 0
    }

    pub fn order(&self) -> bool {
        self.0 & Self::ORDER != 0
    }

    pub fn with_to_ds(self) -> Self {
        FrameControl(self.0 | Self::TO_DS)
    }

    pub fn with_from_ds(self) -> Self {
        FrameControl(self.0 | Self::FROM_DS)
    }

    pub fn with_protected(self) -> Self {
        FrameControl(self.0 | Self::PROTECTED)
    }

    fn is_qos_data(&self) -> bool {
        self.frame_type() == FrameType::Data && self.subtype() & DATA_QOS != 0
    }

    /// Length of the MAC header implied by this frame control
    pub fn header_len(&self) -> usize {
        match self.frame_type() {
            FrameType::Management => {
                if self.order() {
                    28
                } else {
                    24
                }
            }
            FrameType::Data => {
                let mut len = 24;
                if self.to_ds() && self.from_ds() {
                    len += 6;
                }
                if self.is_qos_data() {
                    len += 2;
                    if self.order() {
                        len += 4;
                    }
                }
                len
            }
            FrameType::Control => match self.subtype() {
                ctrl::CTS | ctrl::ACK | ctrl::WRAPPER => 10,
                _ => 16,
            },
            FrameType::Extension => 10,
        }
    }
}

/// WEP / TKIP / CCMP per-frame header at the start of a protected body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtectedHeader {
    pub iv: [u8; 3],
    pub key_id: u8,
    /// Extended IV present (TKIP or CCMP rather than WEP)
    pub ext_iv: bool,
}

impl ProtectedHeader {
    /// WEP IV + key ID
    pub const WEP_IV_SIZE: usize = 4;
    /// WEP integrity check value
    pub const WEP_ICV_SIZE: usize = 4;
}

/// A decoded 802.11 frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// Capture time
    pub timestamp: SystemTime,
    pub frame_control: FrameControl,
    pub addr1: Option<MacAddr>,
    pub addr2: Option<MacAddr>,
    pub addr3: Option<MacAddr>,
    pub addr4: Option<MacAddr>,
    /// Capability information (beacons, probe responses, association frames)
    pub capability: Option<u16>,
    /// Tagged parameters of management frames
    pub elements: Vec<InformationElement>,
    /// Everything after the MAC header
    pub body: Bytes,
    /// Antenna signal from the radiotap header
    pub signal_dbm: Option<i8>,
    /// Header or fixed parameters were cut short
    pub truncated: bool,
    /// The complete 802.11 frame (no radiotap, no FCS)
    pub raw: Bytes,
}

impl Frame {
    /// Decode a bare 802.11 frame
    pub fn parse(data: Bytes, timestamp: SystemTime, signal_dbm: Option<i8>) -> Result<Self> {
        if data.len() < 2 {
            return Err(Error::parse(format!(
                "802.11 frame too short: {} bytes",
                data.len()
            )));
        }

        let frame_control = FrameControl(u16::from_le_bytes([data[0], data[1]]));
        let frame_type = frame_control.frame_type();
        let header_len = frame_control.header_len();
        let mut truncated = data.len() < header_len;

        let addr_at = |offset: usize| data.get(offset..offset + 6).and_then(MacAddr::from_slice);

        let addr1 = addr_at(4);
        let (addr2, addr3, addr4) = match frame_type {
            FrameType::Management => (addr_at(10), addr_at(16), None),
            FrameType::Data => {
                let addr4 = if frame_control.to_ds() && frame_control.from_ds() {
                    addr_at(24)
                } else {
                    None
                };
                (addr_at(10), addr_at(16), addr4)
            }
            FrameType::Control if header_len >= 16 => (addr_at(10), None, None),
            FrameType::Control | FrameType::Extension => (None, None, None),
        };

        let body = if truncated {
            Bytes::new()
        } else {
            data.slice(header_len..)
        };

        let mut capability = None;
        let mut elements = Vec::new();
        if frame_type == FrameType::Management && !truncated && !frame_control.protected() {
            if let Some((fixed_len, cap_offset)) = management_layout(frame_control.subtype()) {
                if body.len() < fixed_len {
                    truncated = true;
                } else {
                    capability = cap_offset
                        .map(|off| u16::from_le_bytes([body[off], body[off + 1]]));
                    elements = ie::parse_elements(&body.slice(fixed_len..));
                }
            }
        }

        Ok(Frame {
            timestamp,
            frame_control,
            addr1,
            addr2,
            addr3,
            addr4,
            capability,
            elements,
            body,
            signal_dbm,
            truncated,
            raw: data,
        })
    }

    pub fn frame_type(&self) -> FrameType {
        self.frame_control.frame_type()
    }

    pub fn subtype(&self) -> u8 {
        self.frame_control.subtype()
    }

    pub fn is_management(&self) -> bool {
        self.frame_type() == FrameType::Management
    }

    pub fn is_data(&self) -> bool {
        self.frame_type() == FrameType::Data
    }

    pub fn is_protected(&self) -> bool {
        self.frame_control.protected()
    }

    /// BSSID according to the To-DS / From-DS bits
    ///
    /// WDS frames (both bits set) have no single BSSID.
    pub fn bssid(&self) -> Option<MacAddr> {
        match (self.frame_control.to_ds(), self.frame_control.from_ds()) {
            (false, false) => self.addr3,
            (true, false) => self.addr1,
            (false, true) => self.addr2,
            (true, true) => None,
        }
    }

    /// Final destination of the frame
    pub fn destination(&self) -> Option<MacAddr> {
        if self.frame_control.to_ds() {
            self.addr3
        } else {
            self.addr1
        }
    }

    /// Original sender of the frame
    pub fn source(&self) -> Option<MacAddr> {
        match (self.frame_control.to_ds(), self.frame_control.from_ds()) {
            (_, false) => self.addr2,
            (false, true) => self.addr3,
            (true, true) => self.addr4,
        }
    }

    /// Privacy bit of the capability field
    pub fn privacy(&self) -> bool {
        self.capability.map_or(false, |c| c & CAPABILITY_PRIVACY != 0)
    }

    /// First element with the given ID
    pub fn element(&self, id: u8) -> Option<&InformationElement> {
        ie::find(&self.elements, id)
    }

    /// Raw SSID bytes, if an SSID element is present
    pub fn ssid_bytes(&self) -> Option<&[u8]> {
        self.element(ie::element_id::SSID).map(|e| &e.data[..])
    }

    /// LLC/SNAP header and payload of an unprotected data frame
    pub fn llc(&self) -> Option<(LlcSnapHeader, Bytes)> {
        if !self.is_data() || self.is_protected() || self.subtype() & DATA_NO_PAYLOAD != 0 {
            return None;
        }
        let header = LlcSnapHeader::from_bytes(&self.body)?;
        Some((header, self.body.slice(LlcSnapHeader::SIZE..)))
    }

    /// Check if this data frame carries EAPOL
    pub fn is_eapol(&self) -> bool {
        matches!(self.llc(), Some((header, _)) if header.ethertype == ETHERTYPE_EAPOL)
    }

    /// Decoded EAPOL payload
    pub fn eapol(&self) -> Option<EapolPacket> {
        match self.llc() {
            Some((header, payload)) if header.ethertype == ETHERTYPE_EAPOL => {
                EapolPacket::parse(&payload).ok()
            }
            _ => None,
        }
    }

    /// Per-frame security header of a protected data frame
    pub fn protected_header(&self) -> Option<ProtectedHeader> {
        if !self.is_data() || !self.is_protected() || self.body.len() < ProtectedHeader::WEP_IV_SIZE {
            return None;
        }
        Some(ProtectedHeader {
            iv: [self.body[0], self.body[1], self.body[2]],
            key_id: self.body[3] >> 6,
            ext_iv: self.body[3] & 0x20 != 0,
        })
    }

    /// Protected data frame using WEP (no extended IV)
    pub fn is_wep(&self) -> bool {
        self.protected_header().map_or(false, |h| !h.ext_iv)
    }

    /// ARP packet carried by this data frame
    ///
    /// Unprotected frames are decoded through LLC/SNAP. For WEP frames the
    /// region between the IV and the ICV is tried as plaintext, which only
    /// succeeds for captures that have already been decrypted.
    pub fn arp(&self) -> Option<ArpPacket> {
        if let Some((header, payload)) = self.llc() {
            if header.ethertype == ETHERTYPE_ARP {
                return ArpPacket::parse(&payload).ok();
            }
            return None;
        }
        if !self.is_wep() || self.body.len() < ProtectedHeader::WEP_IV_SIZE + ProtectedHeader::WEP_ICV_SIZE {
            return None;
        }
        let inner = &self.body[ProtectedHeader::WEP_IV_SIZE..self.body.len() - ProtectedHeader::WEP_ICV_SIZE];
        let header = LlcSnapHeader::from_bytes(inner)?;
        if header.ethertype != ETHERTYPE_ARP {
            return None;
        }
        ArpPacket::parse(&inner[LlcSnapHeader::SIZE..]).ok()
    }
}

/// (fixed parameter length, capability offset) for management subtypes
/// that carry tagged parameters
fn management_layout(subtype: u8) -> Option<(usize, Option<usize>)> {
    match subtype {
        mgmt::ASSOC_REQ => Some((4, Some(0))),
        mgmt::ASSOC_RESP | mgmt::REASSOC_RESP => Some((6, Some(0))),
        mgmt::REASSOC_REQ => Some((10, Some(0))),
        mgmt::PROBE_REQ => Some((0, None)),
        mgmt::PROBE_RESP | mgmt::BEACON => Some((12, Some(10))),
        mgmt::AUTH => Some((6, None)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::FrameBuilder;

    fn mac(b: u8) -> MacAddr {
        MacAddr::new([b; 6])
    }

    fn parse(bytes: Vec<u8>) -> Frame {
        Frame::parse(Bytes::from(bytes), SystemTime::now(), None).unwrap()
    }

    #[test]
    fn test_frame_control() {
        let fc = FrameControl(0x0080);
        assert_eq!(fc.frame_type(), FrameType::Management);
        assert_eq!(fc.subtype(), mgmt::BEACON);
        assert_eq!(FrameControl::new(FrameType::Management, mgmt::BEACON), fc);

        let data = FrameControl::new(FrameType::Data, 0).with_to_ds().with_protected();
        assert!(data.to_ds());
        assert!(!data.from_ds());
        assert!(data.protected());
        assert_eq!(data.header_len(), 24);
    }

    #[test]
    fn test_header_len() {
        assert_eq!(FrameControl::new(FrameType::Data, DATA_QOS).header_len(), 26);
        assert_eq!(
            FrameControl::new(FrameType::Data, 0).with_to_ds().with_from_ds().header_len(),
            30
        );
        assert_eq!(FrameControl::new(FrameType::Control, ctrl::ACK).header_len(), 10);
        assert_eq!(FrameControl::new(FrameType::Control, ctrl::RTS).header_len(), 16);
    }

    #[test]
    fn test_parse_beacon() {
        let frame = parse(
            FrameBuilder::beacon(mac(0xaa))
                .ssid("HomeNet")
                .channel(6)
                .privacy(true)
                .build(),
        );
        assert!(frame.is_management());
        assert_eq!(frame.subtype(), mgmt::BEACON);
        assert_eq!(frame.addr1, Some(MacAddr::BROADCAST));
        assert_eq!(frame.bssid(), Some(mac(0xaa)));
        assert_eq!(frame.ssid_bytes(), Some(&b"HomeNet"[..]));
        assert!(frame.privacy());
        assert!(!frame.truncated);
    }

    #[test]
    fn test_bssid_follows_ds_bits() {
        let to_ap = parse(
            FrameBuilder::data(mac(0xaa), mac(0xbb), mac(0xcc))
                .to_ds()
                .build(),
        );
        assert_eq!(to_ap.bssid(), Some(mac(0xaa)));
        assert_eq!(to_ap.destination(), Some(mac(0xcc)));

        let from_ap = parse(
            FrameBuilder::data(mac(0xbb), mac(0xaa), mac(0xcc))
                .from_ds()
                .build(),
        );
        assert_eq!(from_ap.bssid(), Some(mac(0xaa)));
        assert_eq!(from_ap.source(), Some(mac(0xcc)));

        let wds = parse(
            FrameBuilder::data(mac(1), mac(2), mac(3))
                .to_ds()
                .from_ds()
                .addr4(mac(4))
                .build(),
        );
        assert_eq!(wds.bssid(), None);
        assert_eq!(wds.addr4, Some(mac(4)));
    }

    #[test]
    fn test_truncated_header_keeps_addresses_that_fit() {
        let mut bytes = FrameBuilder::beacon(mac(0xaa)).build();
        bytes.truncate(12);
        let frame = parse(bytes);
        assert!(frame.truncated);
        assert_eq!(frame.addr1, Some(MacAddr::BROADCAST));
        assert_eq!(frame.addr2, None);
        assert!(frame.body.is_empty());
    }

    #[test]
    fn test_truncated_fixed_parameters() {
        let mut bytes = FrameBuilder::beacon(mac(0xaa)).build();
        bytes.truncate(24 + 6);
        let frame = parse(bytes);
        assert!(frame.truncated);
        assert_eq!(frame.capability, None);
        assert!(frame.elements.is_empty());
    }

    #[test]
    fn test_rejects_tiny_frame() {
        assert!(Frame::parse(Bytes::from_static(&[0x80]), SystemTime::now(), None).is_err());
    }

    #[test]
    fn test_eapol_detection() {
        let frame = parse(
            FrameBuilder::data(mac(0xbb), mac(0xaa), mac(0xaa))
                .from_ds()
                .eapol_key(crate::eapol::key_info::PAIRWISE | crate::eapol::key_info::ACK)
                .build(),
        );
        assert!(frame.is_eapol());
        let key = frame.eapol().and_then(|p| p.key()).unwrap();
        assert_eq!(key.message_number(), Some(1));

        let qos = parse(
            FrameBuilder::data(mac(0xaa), mac(0xbb), mac(0xaa))
                .qos()
                .to_ds()
                .eapol_key(crate::eapol::key_info::PAIRWISE | crate::eapol::key_info::MIC)
                .build(),
        );
        assert!(qos.is_eapol());
    }

    #[test]
    fn test_wep_detection() {
        let wep = parse(
            FrameBuilder::data(mac(0xbb), mac(0xaa), mac(0xaa))
                .wep(&[0u8; 40])
                .build(),
        );
        assert!(wep.is_wep());
        assert!(!wep.is_eapol());

        let ccmp = parse(
            FrameBuilder::data(mac(0xbb), mac(0xaa), mac(0xaa))
                .ccmp(&[0u8; 40])
                .build(),
        );
        assert!(ccmp.is_protected());
        assert!(!ccmp.is_wep());
    }

    #[test]
    fn test_wep_arp() {
        use crate::arp::ArpPacket;
        use std::net::Ipv4Addr;

        let arp = ArpPacket::new_request(
            mac(0xbb),
            Ipv4Addr::new(10, 0, 0, 2),
            Ipv4Addr::new(10, 0, 0, 1),
        );
        let frame = parse(
            FrameBuilder::data(mac(0xaa), mac(0xbb), MacAddr::BROADCAST)
                .to_ds()
                .wep_llc(ETHERTYPE_ARP, &arp.serialize())
                .build(),
        );
        assert!(frame.arp().map_or(false, |a| a.is_request()));

        let not_arp = parse(
            FrameBuilder::data(mac(0xaa), mac(0xbb), mac(0xcc))
                .to_ds()
                .wep(&[0x55u8; 100])
                .build(),
        );
        assert!(not_arp.arp().is_none());

        // ciphertext the size of an ARP request is still not an ARP request
        let same_size = parse(
            FrameBuilder::data(mac(0xaa), mac(0xbb), MacAddr::BROADCAST)
                .to_ds()
                .wep(&[0x5au8; 36])
                .build(),
        );
        assert!(same_size.is_wep());
        assert!(same_size.arp().is_none());
    }

    #[test]
    fn test_capability_text() {
        assert_eq!(capability_text(0x0411), "ESS+privacy+short-slot");
        assert_eq!(capability_text(0), "");
    }
}
