//! Frame classification

use airscope_packet::dot11::mgmt;
use airscope_packet::{Frame, FrameType};
use std::fmt;

/// What a frame is, for the purposes of the analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FrameClass {
    Beacon,
    ProbeRequest,
    ProbeResponse,
    /// Association and reassociation requests and responses
    Association,
    Authentication,
    /// Data frame carrying EAPOL (WPA/WPA2 handshake)
    EapolKeyExchange,
    /// WEP-encrypted data
    WepData,
    OtherManagement,
    OtherDataOrControl,
    Unrecognized,
}

impl FrameClass {
    /// Every class, in declaration order
    pub const ALL: [FrameClass; 10] = [
        FrameClass::Beacon,
        FrameClass::ProbeRequest,
        FrameClass::ProbeResponse,
        FrameClass::Association,
        FrameClass::Authentication,
        FrameClass::EapolKeyExchange,
        FrameClass::WepData,
        FrameClass::OtherManagement,
        FrameClass::OtherDataOrControl,
        FrameClass::Unrecognized,
    ];

    /// Short lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            FrameClass::Beacon => "beacon",
            FrameClass::ProbeRequest => "probe_request",
            FrameClass::ProbeResponse => "probe_response",
            FrameClass::Association => "association",
            FrameClass::Authentication => "authentication",
            FrameClass::EapolKeyExchange => "eapol",
            FrameClass::WepData => "wep_data",
            FrameClass::OtherManagement => "other_management",
            FrameClass::OtherDataOrControl => "other_data_or_control",
            FrameClass::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for FrameClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify a decoded frame
///
/// Never fails: frames without a receiver and a transmitter address, cut
/// short, or of the extension type are `Unrecognized`.
pub fn classify(frame: &Frame) -> FrameClass {
    if frame.addr1.is_none() || frame.addr2.is_none() || frame.truncated {
        return FrameClass::Unrecognized;
    }

    match frame.frame_type() {
        FrameType::Management => match frame.subtype() {
            mgmt::BEACON => FrameClass::Beacon,
            mgmt::PROBE_REQ => FrameClass::ProbeRequest,
            mgmt::PROBE_RESP => FrameClass::ProbeResponse,
            mgmt::ASSOC_REQ | mgmt::ASSOC_RESP | mgmt::REASSOC_REQ | mgmt::REASSOC_RESP => {
                FrameClass::Association
            }
            mgmt::AUTH => FrameClass::Authentication,
            _ => FrameClass::OtherManagement,
        },
        FrameType::Data => {
            if frame.is_eapol() {
                FrameClass::EapolKeyExchange
            } else if frame.is_wep() {
                FrameClass::WepData
            } else {
                FrameClass::OtherDataOrControl
            }
        }
        FrameType::Control => FrameClass::OtherDataOrControl,
        FrameType::Extension => FrameClass::Unrecognized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airscope_core::MacAddr;
    use airscope_packet::dot11::ctrl;
    use airscope_packet::eapol::key_info;
    use airscope_packet::FrameBuilder;
    use bytes::Bytes;
    use std::time::SystemTime;

    const AP: MacAddr = MacAddr::new([0xaa; 6]);
    const STA: MacAddr = MacAddr::new([0xbb; 6]);

    fn class_of(builder: FrameBuilder) -> FrameClass {
        let frame = Frame::parse(Bytes::from(builder.build()), SystemTime::now(), None).unwrap();
        classify(&frame)
    }

    #[test]
    fn test_management_classes() {
        assert_eq!(class_of(FrameBuilder::beacon(AP)), FrameClass::Beacon);
        assert_eq!(
            class_of(FrameBuilder::probe_request(STA, MacAddr::BROADCAST)),
            FrameClass::ProbeRequest
        );
        assert_eq!(
            class_of(FrameBuilder::probe_response(AP, STA)),
            FrameClass::ProbeResponse
        );
        assert_eq!(
            class_of(FrameBuilder::association_request(STA, AP)),
            FrameClass::Association
        );
        assert_eq!(
            class_of(FrameBuilder::management(mgmt::REASSOC_RESP, STA, AP, AP).payload(&[0u8; 6])),
            FrameClass::Association
        );
        assert_eq!(
            class_of(FrameBuilder::authentication(AP, STA, AP, 1)),
            FrameClass::Authentication
        );
        assert_eq!(
            class_of(FrameBuilder::management(mgmt::DEAUTH, STA, AP, AP).payload(&[7, 0])),
            FrameClass::OtherManagement
        );
    }

    #[test]
    fn test_data_classes() {
        let eapol = FrameBuilder::data(STA, AP, AP)
            .from_ds()
            .eapol_key(key_info::PAIRWISE | key_info::ACK);
        assert_eq!(class_of(eapol), FrameClass::EapolKeyExchange);

        let wep = FrameBuilder::data(STA, AP, AP).from_ds().wep(&[1u8; 32]);
        assert_eq!(class_of(wep), FrameClass::WepData);

        let ccmp = FrameBuilder::data(STA, AP, AP).from_ds().ccmp(&[1u8; 32]);
        assert_eq!(class_of(ccmp), FrameClass::OtherDataOrControl);

        let plain = FrameBuilder::data(AP, STA, AP).to_ds().llc(0x0800, &[0x45; 20]);
        assert_eq!(class_of(plain), FrameClass::OtherDataOrControl);
    }

    #[test]
    fn test_control_frames() {
        assert_eq!(
            class_of(FrameBuilder::control(ctrl::RTS, AP, Some(STA))),
            FrameClass::OtherDataOrControl
        );
        // ACK carries no transmitter address
        assert_eq!(
            class_of(FrameBuilder::control(ctrl::ACK, AP, None)),
            FrameClass::Unrecognized
        );
    }

    #[test]
    fn test_missing_addresses() {
        let mut bytes = FrameBuilder::beacon(AP).build();
        bytes.truncate(8);
        let frame = Frame::parse(Bytes::from(bytes), SystemTime::now(), None).unwrap();
        assert_eq!(frame.addr1, None);
        assert_eq!(classify(&frame), FrameClass::Unrecognized);
    }

    #[test]
    fn test_extension_frames() {
        let mut bytes = vec![0x0c, 0x00, 0x00, 0x00];
        bytes.extend_from_slice(AP.as_bytes());
        bytes.extend_from_slice(STA.as_bytes());
        let frame = Frame::parse(Bytes::from(bytes), SystemTime::now(), None).unwrap();
        assert_eq!(classify(&frame), FrameClass::Unrecognized);
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = FrameClass::ALL.iter().map(|c| c.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), FrameClass::ALL.len());
    }
}
