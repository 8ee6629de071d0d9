//! Fluent builder for raw 802.11 frames
//!
//! Used to feed synthetic traffic to the decoder and the analyzer.

use airscope_core::{LinkType, MacAddr, Packet};

use crate::dot11::{mgmt, FrameControl, FrameType, CAPABILITY_PRIVACY, DATA_QOS};
use crate::eapol::{EapolKey, EapolPacket, EapolType};
use crate::ie::{element_id, encode_elements, InformationElement, WPA_VENDOR_PREFIX};
use crate::llc::{LlcSnapHeader, ETHERTYPE_EAPOL};
use crate::radiotap::{RadiotapHeader, FLAG_FCS};

/// RSN element body advertising CCMP with PSK
const RSN_CCMP_PSK: [u8; 18] = [
    0x01, 0x00, 0x00, 0x0f, 0xac, 0x04, 0x01, 0x00, 0x00, 0x0f, 0xac, 0x04, 0x01, 0x00, 0x00,
    0x0f, 0xac, 0x02,
];

/// Builder for a single 802.11 frame
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    frame_control: FrameControl,
    addr1: MacAddr,
    addr2: Option<MacAddr>,
    addr3: Option<MacAddr>,
    addr4: Option<MacAddr>,
    fixed: Vec<u8>,
    capability_offset: Option<usize>,
    elements: Vec<InformationElement>,
    payload: Vec<u8>,
    radiotap: Option<(u8, i8)>,
}

impl FrameBuilder {
    fn new(frame_control: FrameControl, addr1: MacAddr) -> Self {
        Self {
            frame_control,
            addr1,
            addr2: None,
            addr3: None,
            addr4: None,
            fixed: Vec::new(),
            capability_offset: None,
            elements: Vec::new(),
            payload: Vec::new(),
            radiotap: None,
        }
    }

    /// Management frame with the standard three addresses
    pub fn management(subtype: u8, addr1: MacAddr, addr2: MacAddr, addr3: MacAddr) -> Self {
        let mut builder = Self::new(FrameControl::new(FrameType::Management, subtype), addr1);
        builder.addr2 = Some(addr2);
        builder.addr3 = Some(addr3);
        builder
    }

    /// Beacon from `bssid` (ESS capability, 100 TU interval)
    pub fn beacon(bssid: MacAddr) -> Self {
        Self::management(mgmt::BEACON, MacAddr::BROADCAST, bssid, bssid).with_beacon_fixed()
    }

    /// Probe response from `bssid` to `client`
    pub fn probe_response(bssid: MacAddr, client: MacAddr) -> Self {
        Self::management(mgmt::PROBE_RESP, client, bssid, bssid).with_beacon_fixed()
    }

    /// Probe request from `client`; pass `MacAddr::BROADCAST` for a wildcard probe
    pub fn probe_request(client: MacAddr, bssid: MacAddr) -> Self {
        Self::management(mgmt::PROBE_REQ, bssid, client, bssid)
    }

    /// Association request from `client` to `bssid`
    pub fn association_request(client: MacAddr, bssid: MacAddr) -> Self {
        let mut builder = Self::management(mgmt::ASSOC_REQ, bssid, client, bssid);
        builder.fixed = vec![0x01, 0x00, 0x0a, 0x00];
        builder.capability_offset = Some(0);
        builder
    }

    /// Open-system authentication frame
    pub fn authentication(addr1: MacAddr, addr2: MacAddr, bssid: MacAddr, sequence: u16) -> Self {
        let mut builder = Self::management(mgmt::AUTH, addr1, addr2, bssid);
        builder.fixed = vec![0x00, 0x00];
        builder.fixed.extend_from_slice(&sequence.to_le_bytes());
        builder.fixed.extend_from_slice(&[0x00, 0x00]);
        builder
    }

    /// Control frame; `addr2` is omitted for CTS and ACK
    pub fn control(subtype: u8, addr1: MacAddr, addr2: Option<MacAddr>) -> Self {
        let mut builder = Self::new(FrameControl::new(FrameType::Control, subtype), addr1);
        builder.addr2 = addr2;
        builder
    }

    /// Data frame; the DS bits are set separately
    pub fn data(addr1: MacAddr, addr2: MacAddr, addr3: MacAddr) -> Self {
        let mut builder = Self::new(FrameControl::new(FrameType::Data, 0), addr1);
        builder.addr2 = Some(addr2);
        builder.addr3 = Some(addr3);
        builder
    }

    fn with_beacon_fixed(mut self) -> Self {
        self.fixed = vec![0u8; 12];
        self.fixed[8..10].copy_from_slice(&100u16.to_le_bytes());
        self.fixed[10..12].copy_from_slice(&0x0001u16.to_le_bytes());
        self.capability_offset = Some(10);
        self
    }

    pub fn to_ds(mut self) -> Self {
        self.frame_control = self.frame_control.with_to_ds();
        self
    }

    pub fn from_ds(mut self) -> Self {
        self.frame_control = self.frame_control.with_from_ds();
        self
    }

    pub fn addr4(mut self, addr: MacAddr) -> Self {
        self.addr4 = Some(addr);
        self
    }

    /// Turn a data frame into QoS data
    pub fn qos(mut self) -> Self {
        self.frame_control = FrameControl(self.frame_control.0 | (u16::from(DATA_QOS) << 4));
        self
    }

    /// Overwrite the capability field
    pub fn capability(mut self, capability: u16) -> Self {
        if let Some(off) = self.capability_offset {
            self.fixed[off..off + 2].copy_from_slice(&capability.to_le_bytes());
        }
        self
    }

    /// Set or clear the privacy capability bit
    pub fn privacy(self, enabled: bool) -> Self {
        let current = self
            .capability_offset
            .map(|off| u16::from_le_bytes([self.fixed[off], self.fixed[off + 1]]))
            .unwrap_or(0);
        let capability = if enabled {
            current | CAPABILITY_PRIVACY
        } else {
            current & !CAPABILITY_PRIVACY
        };
        self.capability(capability)
    }

    pub fn element(mut self, id: u8, data: &[u8]) -> Self {
        self.elements.push(InformationElement::new(id, data.to_vec()));
        self
    }

    pub fn ssid(self, ssid: &str) -> Self {
        self.ssid_bytes(ssid.as_bytes())
    }

    pub fn ssid_bytes(self, ssid: &[u8]) -> Self {
        self.element(element_id::SSID, ssid)
    }

    /// DS Parameter Set element
    pub fn channel(self, channel: u8) -> Self {
        self.element(element_id::DS_PARAMETER_SET, &[channel])
    }

    /// RSN element (WPA2)
    pub fn rsn(self) -> Self {
        self.element(element_id::RSN, &RSN_CCMP_PSK)
    }

    /// WPA vendor element
    pub fn wpa(self) -> Self {
        let mut body = WPA_VENDOR_PREFIX.to_vec();
        body.extend_from_slice(&[0x00, 0x50, 0xf2, 0x02]);
        self.element(element_id::VENDOR_SPECIFIC, &body)
    }

    /// Raw frame body after the header
    pub fn payload(mut self, payload: &[u8]) -> Self {
        self.payload = payload.to_vec();
        self
    }

    /// LLC/SNAP-encapsulated payload
    pub fn llc(mut self, ethertype: u16, payload: &[u8]) -> Self {
        self.payload = LlcSnapHeader::rfc1042(ethertype).to_bytes().to_vec();
        self.payload.extend_from_slice(payload);
        self
    }

    /// EAPOL-Key frame with the given key information bits
    pub fn eapol_key(self, key_info: u16) -> Self {
        let packet = EapolPacket {
            version: 2,
            packet_type: EapolType::Key,
            body: EapolKey::body(key_info, 1, [0x42; 32]).into(),
        };
        self.llc(ETHERTYPE_EAPOL, &packet.to_bytes())
    }

    /// WEP-protected body: IV, opaque data, ICV
    pub fn wep(mut self, ciphertext: &[u8]) -> Self {
        self.frame_control = self.frame_control.with_protected();
        self.payload = vec![0x01, 0x02, 0x03, 0x00];
        self.payload.extend_from_slice(ciphertext);
        self.payload.extend_from_slice(&[0u8; 4]);
        self
    }

    /// WEP-protected body whose contents are a readable LLC/SNAP payload
    pub fn wep_llc(self, ethertype: u16, payload: &[u8]) -> Self {
        let mut inner = LlcSnapHeader::rfc1042(ethertype).to_bytes().to_vec();
        inner.extend_from_slice(payload);
        self.wep(&inner)
    }

    /// CCMP-protected body (extended IV bit set)
    pub fn ccmp(mut self, ciphertext: &[u8]) -> Self {
        self.frame_control = self.frame_control.with_protected();
        self.payload = vec![0x01, 0x00, 0x00, 0x20, 0x00, 0x00, 0x00, 0x00];
        self.payload.extend_from_slice(ciphertext);
        self.payload.extend_from_slice(&[0u8; 8]);
        self
    }

    /// Prefix a radiotap header carrying the antenna signal
    pub fn signal(mut self, dbm: i8) -> Self {
        let flags = self.radiotap.map_or(0, |(flags, _)| flags);
        self.radiotap = Some((flags, dbm));
        self
    }

    /// Append an FCS and flag it in the radiotap header
    pub fn fcs(mut self) -> Self {
        let dbm = self.radiotap.map_or(0, |(_, dbm)| dbm);
        self.radiotap = Some((FLAG_FCS, dbm));
        self
    }

    /// Link type of the built bytes
    pub fn linktype(&self) -> LinkType {
        if self.radiotap.is_some() {
            LinkType::Radiotap
        } else {
            LinkType::Ieee80211
        }
    }

    /// Serialize the frame
    pub fn build(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64 + self.payload.len());

        if let Some((flags, dbm)) = self.radiotap {
            buf.extend_from_slice(&RadiotapHeader::encode(flags, dbm));
        }

        buf.extend_from_slice(&self.frame_control.0.to_le_bytes());
        buf.extend_from_slice(&[0x00, 0x00]);
        buf.extend_from_slice(self.addr1.as_bytes());
        if let Some(addr2) = self.addr2 {
            buf.extend_from_slice(addr2.as_bytes());
        }
        if let Some(addr3) = self.addr3 {
            buf.extend_from_slice(addr3.as_bytes());
            buf.extend_from_slice(&[0x10, 0x00]);
        }
        if self.frame_control.frame_type() == FrameType::Data {
            if self.frame_control.to_ds() && self.frame_control.from_ds() {
                buf.extend_from_slice(self.addr4.unwrap_or(MacAddr::ZERO).as_bytes());
            }
            if self.frame_control.subtype() & DATA_QOS != 0 {
                buf.extend_from_slice(&[0x00, 0x00]);
            }
        }

        buf.extend_from_slice(&self.fixed);
        buf.extend_from_slice(&encode_elements(&self.elements));
        buf.extend_from_slice(&self.payload);

        if matches!(self.radiotap, Some((flags, _)) if flags & FLAG_FCS != 0) {
            buf.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        }

        buf
    }

    /// Wrap the serialized frame in a captured packet
    pub fn packet(&self, source: &str) -> Packet {
        Packet::new(source, self.linktype(), self.build())
    }
}
