//! LLC (Logical Link Control) and SNAP (SubNetwork Access Protocol)
//!
//! 802.11 data frames carry their upper-layer protocol behind an
//! RFC 1042 LLC/SNAP header: `AA AA 03 00 00 00` followed by an EtherType.

/// EtherType of 802.1X / EAPOL
pub const ETHERTYPE_EAPOL: u16 = 0x888E;

/// EtherType of ARP
pub const ETHERTYPE_ARP: u16 = 0x0806;

/// EtherType of IPv4
pub const ETHERTYPE_IPV4: u16 = 0x0800;

/// SNAP DSAP/SSAP value
pub const SAP_SNAP: u8 = 0xAA;

/// Unnumbered Information control field
pub const CONTROL_UI: u8 = 0x03;

/// OUI (Organizationally Unique Identifier) - 3 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Oui(pub [u8; 3]);

impl Oui {
    /// RFC 1042 OUI (0x000000) - encapsulated Ethernet
    pub const RFC_1042: Oui = Oui([0x00, 0x00, 0x00]);

    /// 802.1H bridge tunnel OUI (0x0000F8)
    pub const BRIDGE_TUNNEL: Oui = Oui([0x00, 0x00, 0xF8]);
}

/// Combined LLC + SNAP header (8 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlcSnapHeader {
    /// Destination Service Access Point
    pub dsap: u8,
    /// Source Service Access Point
    pub ssap: u8,
    /// Control field
    pub control: u8,
    /// Organizationally Unique Identifier
    pub oui: Oui,
    /// Encapsulated EtherType
    pub ethertype: u16,
}

impl LlcSnapHeader {
    /// Header size in bytes
    pub const SIZE: usize = 8;

    /// RFC 1042 header for an EtherType
    pub fn rfc1042(ethertype: u16) -> Self {
        Self {
            dsap: SAP_SNAP,
            ssap: SAP_SNAP,
            control: CONTROL_UI,
            oui: Oui::RFC_1042,
            ethertype,
        }
    }

    /// Parse from bytes; `None` unless the data starts with a SNAP header
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < Self::SIZE {
            return None;
        }
        if data[0] != SAP_SNAP || data[1] != SAP_SNAP || data[2] != CONTROL_UI {
            return None;
        }

        Some(Self {
            dsap: data[0],
            ssap: data[1],
            control: data[2],
            oui: Oui([data[3], data[4], data[5]]),
            ethertype: u16::from_be_bytes([data[6], data[7]]),
        })
    }

    /// Convert to bytes
    pub fn to_bytes(&self) -> [u8; 8] {
        let mut bytes = [0u8; 8];
        bytes[0] = self.dsap;
        bytes[1] = self.ssap;
        bytes[2] = self.control;
        bytes[3..6].copy_from_slice(&self.oui.0);
        bytes[6..8].copy_from_slice(&self.ethertype.to_be_bytes());
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_eapol_header() {
        let data = [0xAA, 0xAA, 0x03, 0x00, 0x00, 0x00, 0x88, 0x8E, 0x01];
        let header = LlcSnapHeader::from_bytes(&data).unwrap();
        assert_eq!(header.oui, Oui::RFC_1042);
        assert_eq!(header.ethertype, ETHERTYPE_EAPOL);
    }

    #[test]
    fn test_rejects_non_snap() {
        assert!(LlcSnapHeader::from_bytes(&[0x42, 0x42, 0x03, 0, 0, 0, 0, 0]).is_none());
        assert!(LlcSnapHeader::from_bytes(&[0xAA, 0xAA, 0x03]).is_none());
    }

    #[test]
    fn test_to_bytes() {
        let header = LlcSnapHeader::rfc1042(ETHERTYPE_ARP);
        assert_eq!(
            header.to_bytes(),
            [0xAA, 0xAA, 0x03, 0x00, 0x00, 0x00, 0x08, 0x06]
        );
    }
}
