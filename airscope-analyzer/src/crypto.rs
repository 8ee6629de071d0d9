//! Security scheme and SSID extraction from beacons and probe responses

use airscope_core::{Crypto, CryptoSet, Error, Result};
use airscope_packet::Frame;

/// Security schemes advertised by a beacon or probe response
///
/// RSN gives WPA2 and the Microsoft WPA vendor element gives WPA; only when
/// neither is present does the privacy bit decide between WEP and OPN.
/// The result is never empty.
pub fn detect_crypto(frame: &Frame) -> CryptoSet {
    let mut crypto = CryptoSet::new();
    for element in &frame.elements {
        if element.is_rsn() {
            crypto.insert(Crypto::Wpa2);
        } else if element.is_wpa() {
            crypto.insert(Crypto::Wpa);
        }
    }

    if crypto.is_empty() {
        crypto.insert(if frame.privacy() {
            Crypto::Wep
        } else {
            Crypto::Opn
        });
    }
    crypto
}

/// Decode an SSID element
///
/// `Ok(None)` for a missing, empty or all-null SSID (hidden network);
/// an error when the bytes are not UTF-8.
pub fn decode_ssid(raw: Option<&[u8]>) -> Result<Option<String>> {
    let raw = match raw {
        Some(raw) if !raw.is_empty() && raw.iter().any(|&b| b != 0) => raw,
        _ => return Ok(None),
    };
    std::str::from_utf8(raw)
        .map(|ssid| Some(ssid.to_string()))
        .map_err(|e| Error::Encoding(format!("SSID is not valid UTF-8: {}", e)))
}

/// SSID advertised or probed by a frame
pub fn frame_ssid(frame: &Frame) -> Result<Option<String>> {
    decode_ssid(frame.ssid_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use airscope_core::MacAddr;
    use airscope_packet::FrameBuilder;
    use bytes::Bytes;
    use std::time::SystemTime;

    fn beacon(builder: FrameBuilder) -> Frame {
        Frame::parse(Bytes::from(builder.build()), SystemTime::now(), None).unwrap()
    }

    fn crypto_of(builder: FrameBuilder) -> Vec<Crypto> {
        detect_crypto(&beacon(builder)).into_iter().collect()
    }

    const AP: MacAddr = MacAddr::new([0xaa; 6]);

    #[test]
    fn test_open_and_wep() {
        assert_eq!(crypto_of(FrameBuilder::beacon(AP)), vec![Crypto::Opn]);
        assert_eq!(
            crypto_of(FrameBuilder::beacon(AP).privacy(true)),
            vec![Crypto::Wep]
        );
    }

    #[test]
    fn test_wpa_elements_override_privacy() {
        assert_eq!(
            crypto_of(FrameBuilder::beacon(AP).privacy(true).rsn()),
            vec![Crypto::Wpa2]
        );
        assert_eq!(
            crypto_of(FrameBuilder::beacon(AP).privacy(true).wpa()),
            vec![Crypto::Wpa]
        );
        assert_eq!(
            crypto_of(FrameBuilder::beacon(AP).privacy(true).wpa().rsn()),
            vec![Crypto::Wpa, Crypto::Wpa2]
        );
    }

    #[test]
    fn test_other_vendor_elements_ignored() {
        let wmm = [0x00, 0x50, 0xf2, 0x02, 0x01, 0x01];
        assert_eq!(
            crypto_of(FrameBuilder::beacon(AP).element(221, &wmm)),
            vec![Crypto::Opn]
        );
    }

    #[test]
    fn test_decode_ssid() {
        assert_eq!(decode_ssid(Some(&b"HomeNet"[..])).unwrap(), Some("HomeNet".to_string()));
        assert_eq!(decode_ssid(None).unwrap(), None);
        assert_eq!(decode_ssid(Some(&b""[..])).unwrap(), None);
        assert_eq!(decode_ssid(Some(&[0u8, 0, 0, 0][..])).unwrap(), None);
        assert!(matches!(
            decode_ssid(Some(&[0xffu8, 0xfe, b'a'][..])),
            Err(Error::Encoding(_))
        ));
    }

    #[test]
    fn test_frame_ssid() {
        let frame = beacon(FrameBuilder::beacon(AP).ssid("Café"));
        assert_eq!(frame_ssid(&frame).unwrap(), Some("Café".to_string()));
    }
}
