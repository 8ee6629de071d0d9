//! Radiotap header parsing
//!
//! Monitor-mode captures prefix every 802.11 frame with a radiotap header.
//! Only the leading fields up to the antenna signal are decoded; the rest of
//! the header is skipped using its declared length.

use airscope_core::{Error, Result};

/// Present-bitmap bits of the fields airscope reads
pub mod present {
    pub const TSFT: u32 = 1 << 0;
    pub const FLAGS: u32 = 1 << 1;
    pub const RATE: u32 = 1 << 2;
    pub const CHANNEL: u32 = 1 << 3;
    pub const FHSS: u32 = 1 << 4;
    pub const ANTENNA_SIGNAL: u32 = 1 << 5;
    pub const EXT: u32 = 1 << 31;
}

/// Flags field: frame includes a trailing FCS
pub const FLAG_FCS: u8 = 0x10;

/// Flags field: frame failed the FCS check
pub const FLAG_BAD_FCS: u8 = 0x40;

const HEADER_MIN_SIZE: usize = 8;

/// (present bit, alignment, size) in the order the fields appear
const FIELDS: [(u32, usize, usize); 6] = [
    (present::TSFT, 8, 8),
    (present::FLAGS, 1, 1),
    (present::RATE, 1, 1),
    (present::CHANNEL, 2, 4),
    (present::FHSS, 1, 2),
    (present::ANTENNA_SIGNAL, 1, 1),
];

/// Decoded radiotap header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RadiotapHeader {
    pub version: u8,
    /// Total header length; the 802.11 frame starts here
    pub length: usize,
    /// First present bitmap
    pub present: u32,
    pub flags: Option<u8>,
    /// Rate in 500 kbps units
    pub rate: Option<u8>,
    /// Channel frequency in MHz
    pub frequency: Option<u16>,
    /// Antenna signal in dBm
    pub antenna_signal: Option<i8>,
}

impl RadiotapHeader {
    /// Parse the radiotap header at the start of `data`
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_MIN_SIZE {
            return Err(Error::parse("radiotap header too short"));
        }
        let version = data[0];
        if version != 0 {
            return Err(Error::parse(format!("unsupported radiotap version {}", version)));
        }
        let length = u16::from_le_bytes([data[2], data[3]]) as usize;
        if length < HEADER_MIN_SIZE || length > data.len() {
            return Err(Error::parse(format!(
                "radiotap length {} out of bounds (packet is {} bytes)",
                length,
                data.len()
            )));
        }
        let present = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);

        // Skip any extended present bitmaps
        let mut offset = 4;
        let mut word = present;
        while word & present::EXT != 0 {
            offset += 4;
            if offset + 4 > length {
                return Err(Error::parse("radiotap present bitmap overruns header"));
            }
            word = u32::from_le_bytes([
                data[offset],
                data[offset + 1],
                data[offset + 2],
                data[offset + 3],
            ]);
        }
        offset += 4;

        let mut header = RadiotapHeader {
            version,
            length,
            present,
            ..Default::default()
        };

        for (bit, align, size) in FIELDS {
            if present & bit == 0 {
                continue;
            }
            offset = (offset + align - 1) & !(align - 1);
            if offset + size > length {
                break;
            }
            let field = &data[offset..offset + size];
            match bit {
                present::FLAGS => header.flags = Some(field[0]),
                present::RATE => header.rate = Some(field[0]),
                present::CHANNEL => header.frequency = Some(u16::from_le_bytes([field[0], field[1]])),
                present::ANTENNA_SIGNAL => header.antenna_signal = Some(field[0] as i8),
                _ => {}
            }
            offset += size;
        }

        Ok(header)
    }

    /// Check whether the captured frame carries a trailing FCS
    pub fn has_fcs(&self) -> bool {
        self.flags.map_or(false, |f| f & FLAG_FCS != 0)
    }

    /// Channel number derived from the frequency
    pub fn channel(&self) -> Option<u8> {
        self.frequency.and_then(frequency_to_channel)
    }

    /// Minimal header carrying flags and an antenna signal
    pub fn encode(flags: u8, antenna_signal: i8) -> Vec<u8> {
        let present = present::FLAGS | present::ANTENNA_SIGNAL;
        let mut buf = vec![0u8, 0u8];
        buf.extend_from_slice(&10u16.to_le_bytes());
        buf.extend_from_slice(&present.to_le_bytes());
        buf.push(flags);
        buf.push(antenna_signal as u8);
        buf
    }
}

/// Map a 2.4 GHz or 5 GHz center frequency to its channel number
pub fn frequency_to_channel(freq: u16) -> Option<u8> {
    match freq {
        2484 => Some(14),
        2412..=2472 => Some(((freq - 2407) / 5) as u8),
        5000..=5925 => Some(((freq - 5000) / 5) as u8),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags_and_signal() {
        let data = RadiotapHeader::encode(FLAG_FCS, -42);
        let header = RadiotapHeader::parse(&data).unwrap();
        assert_eq!(header.length, 10);
        assert!(header.has_fcs());
        assert_eq!(header.antenna_signal, Some(-42));
    }

    #[test]
    fn test_parse_with_alignment() {
        // TSFT + flags + rate + channel + signal, preceded by an extended bitmap
        let present = present::TSFT
            | present::FLAGS
            | present::RATE
            | present::CHANNEL
            | present::ANTENNA_SIGNAL
            | present::EXT;
        let mut data = vec![0u8, 0u8, 0, 0];
        data.extend_from_slice(&present.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        // TSFT aligned to 8 at offset 16 after the 12 bitmap bytes
        data.extend_from_slice(&[0u8; 4]);
        data.extend_from_slice(&[0u8; 8]);
        data.push(0x00);
        data.push(0x02);
        data.extend_from_slice(&2437u16.to_le_bytes());
        data.extend_from_slice(&0x00a0u16.to_le_bytes());
        data.push((-60i8) as u8);
        let len = data.len() as u16;
        data[2..4].copy_from_slice(&len.to_le_bytes());

        let header = RadiotapHeader::parse(&data).unwrap();
        assert_eq!(header.rate, Some(2));
        assert_eq!(header.frequency, Some(2437));
        assert_eq!(header.channel(), Some(6));
        assert_eq!(header.antenna_signal, Some(-60));
        assert!(!header.has_fcs());
    }

    #[test]
    fn test_rejects_bad_length() {
        let mut data = RadiotapHeader::encode(0, -10);
        data[2] = 200;
        assert!(RadiotapHeader::parse(&data).is_err());
        assert!(RadiotapHeader::parse(&[0, 0, 8]).is_err());
    }

    #[test]
    fn test_frequency_to_channel() {
        assert_eq!(frequency_to_channel(2412), Some(1));
        assert_eq!(frequency_to_channel(2472), Some(13));
        assert_eq!(frequency_to_channel(2484), Some(14));
        assert_eq!(frequency_to_channel(5180), Some(36));
        assert_eq!(frequency_to_channel(900), None);
    }
}
