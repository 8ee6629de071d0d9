//! Information elements (tagged parameters) of management frames

use bytes::Bytes;

/// Element IDs used by airscope
pub mod element_id {
    pub const SSID: u8 = 0;
    pub const SUPPORTED_RATES: u8 = 1;
    pub const DS_PARAMETER_SET: u8 = 3;
    pub const TIM: u8 = 5;
    pub const COUNTRY: u8 = 7;
    pub const HT_CAPABILITIES: u8 = 45;
    pub const RSN: u8 = 48;
    pub const EXTENDED_RATES: u8 = 50;
    pub const VENDOR_SPECIFIC: u8 = 221;
}

/// Microsoft OUI, vendor type 1 (WPA), version 1
pub const WPA_VENDOR_PREFIX: [u8; 6] = [0x00, 0x50, 0xF2, 0x01, 0x01, 0x00];

/// A single tagged element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InformationElement {
    pub id: u8,
    pub data: Bytes,
}

impl InformationElement {
    pub fn new(id: u8, data: impl Into<Bytes>) -> Self {
        Self {
            id,
            data: data.into(),
        }
    }

    /// Vendor-specific element announcing WPA (version 1)
    pub fn is_wpa(&self) -> bool {
        self.id == element_id::VENDOR_SPECIFIC && self.data.starts_with(&WPA_VENDOR_PREFIX)
    }

    /// RSN element (WPA2)
    pub fn is_rsn(&self) -> bool {
        self.id == element_id::RSN
    }

    /// Current channel carried by a DS Parameter Set element
    pub fn ds_channel(&self) -> Option<u8> {
        if self.id == element_id::DS_PARAMETER_SET {
            self.data.first().copied()
        } else {
            None
        }
    }
}

/// Walk a tagged-parameter list
///
/// Parsing stops at the first element whose declared length runs past the
/// end of the buffer; everything before it is kept.
pub fn parse_elements(data: &Bytes) -> Vec<InformationElement> {
    let mut elements = Vec::new();
    let mut offset = 0;

    while offset + 2 <= data.len() {
        let id = data[offset];
        let len = data[offset + 1] as usize;
        let start = offset + 2;
        let end = start + len;
        if end > data.len() {
            break;
        }
        elements.push(InformationElement {
            id,
            data: data.slice(start..end),
        });
        offset = end;
    }

    elements
}

/// First element with the given ID
pub fn find(elements: &[InformationElement], id: u8) -> Option<&InformationElement> {
    elements.iter().find(|e| e.id == id)
}

/// Serialize elements back into tagged-parameter form
pub fn encode_elements(elements: &[InformationElement]) -> Vec<u8> {
    let mut buf = Vec::new();
    for element in elements {
        buf.push(element.id);
        buf.push(element.data.len().min(255) as u8);
        buf.extend_from_slice(&element.data[..element.data.len().min(255)]);
    }
    buf
}
