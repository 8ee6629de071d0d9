//! EAPOL frame structures
//!
//! Only what is needed to recognize and label the WPA/WPA2 four-way
//! handshake is decoded; key material is kept as opaque bytes.
//!
//! ## EAPOL Frame Structure
//!
//! ```text
//! +------------------+
//! | Protocol Version | 1 byte
//! +------------------+
//! | Packet Type      | 1 byte
//! +------------------+
//! | Body Length      | 2 bytes (network order)
//! +------------------+
//! | Body             | Variable
//! +------------------+
//! ```
//!
//! ## EAPOL-Key Body
//!
//! ```text
//! | Descriptor Type (1) | Key Information (2) | Key Length (2) |
//! | Replay Counter (8)  | Nonce (32) | IV (16) | RSC (8) | ID (8) |
//! | MIC (16) | Key Data Length (2) | Key Data (variable) |
//! ```

use airscope_core::{Error, Result};
use bytes::Bytes;

pub const EAPOL_TYPE_EAP_PACKET: u8 = 0x00;
pub const EAPOL_TYPE_START: u8 = 0x01;
pub const EAPOL_TYPE_LOGOFF: u8 = 0x02;
pub const EAPOL_TYPE_KEY: u8 = 0x03;
pub const EAPOL_TYPE_ASF_ALERT: u8 = 0x04;

/// Key information bits
pub mod key_info {
    pub const PAIRWISE: u16 = 0x0008;
    pub const INSTALL: u16 = 0x0040;
    pub const ACK: u16 = 0x0080;
    pub const MIC: u16 = 0x0100;
    pub const SECURE: u16 = 0x0200;
}

const EAPOL_HEADER_SIZE: usize = 4;
const KEY_BODY_MIN_SIZE: usize = 95;

/// EAPOL Packet Type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EapolType {
    /// EAP-Packet (contains EAP frame)
    EapPacket,
    /// EAPOL-Start (supplicant initiates)
    Start,
    /// EAPOL-Logoff
    Logoff,
    /// EAPOL-Key (WPA/WPA2)
    Key,
    /// EAPOL-Encapsulated-ASF-Alert
    AsfAlert,
    /// Reserved / vendor type
    Unknown(u8),
}

impl EapolType {
    /// Parse from byte value
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            EAPOL_TYPE_EAP_PACKET => EapolType::EapPacket,
            EAPOL_TYPE_START => EapolType::Start,
            EAPOL_TYPE_LOGOFF => EapolType::Logoff,
            EAPOL_TYPE_KEY => EapolType::Key,
            EAPOL_TYPE_ASF_ALERT => EapolType::AsfAlert,
            other => EapolType::Unknown(other),
        }
    }

    /// Convert to byte value
    pub fn to_byte(&self) -> u8 {
        match self {
            EapolType::EapPacket => EAPOL_TYPE_EAP_PACKET,
            EapolType::Start => EAPOL_TYPE_START,
            EapolType::Logoff => EAPOL_TYPE_LOGOFF,
            EapolType::Key => EAPOL_TYPE_KEY,
            EapolType::AsfAlert => EAPOL_TYPE_ASF_ALERT,
            EapolType::Unknown(byte) => *byte,
        }
    }
}

/// EAPOL Packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EapolPacket {
    /// Protocol version (1, 2 or 3)
    pub version: u8,
    /// Packet type
    pub packet_type: EapolType,
    /// Packet body
    pub body: Bytes,
}

impl EapolPacket {
    /// Parse EAPOL packet from bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < EAPOL_HEADER_SIZE {
            return Err(Error::parse("EAPOL packet too short"));
        }

        let version = data[0];
        let packet_type = EapolType::from_byte(data[1]);
        let body_len = u16::from_be_bytes([data[2], data[3]]) as usize;

        if data.len() < EAPOL_HEADER_SIZE + body_len {
            return Err(Error::parse(format!(
                "EAPOL body truncated: expected {} bytes, got {}",
                body_len,
                data.len() - EAPOL_HEADER_SIZE
            )));
        }

        Ok(Self {
            version,
            packet_type,
            body: Bytes::copy_from_slice(&data[EAPOL_HEADER_SIZE..EAPOL_HEADER_SIZE + body_len]),
        })
    }

    /// Build bytes (header + body)
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(EAPOL_HEADER_SIZE + self.body.len());
        buf.push(self.version);
        buf.push(self.packet_type.to_byte());
        buf.extend_from_slice(&(self.body.len() as u16).to_be_bytes());
        buf.extend_from_slice(&self.body);
        buf
    }

    /// Decode the EAPOL-Key body, if this is a key frame
    pub fn key(&self) -> Option<EapolKey> {
        if self.packet_type != EapolType::Key {
            return None;
        }
        EapolKey::parse(&self.body).ok()
    }
}

/// EAPOL-Key descriptor (fields needed to place a frame in the handshake)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EapolKey {
    pub descriptor_type: u8,
    pub key_info: u16,
    pub key_length: u16,
    pub replay_counter: u64,
    pub nonce: [u8; 32],
}

impl EapolKey {
    /// Parse an EAPOL-Key body
    pub fn parse(body: &[u8]) -> Result<Self> {
        if body.len() < KEY_BODY_MIN_SIZE {
            return Err(Error::parse("EAPOL-Key body too short"));
        }

        let mut replay = [0u8; 8];
        replay.copy_from_slice(&body[5..13]);
        let mut nonce = [0u8; 32];
        nonce.copy_from_slice(&body[13..45]);

        Ok(Self {
            descriptor_type: body[0],
            key_info: u16::from_be_bytes([body[1], body[2]]),
            key_length: u16::from_be_bytes([body[3], body[4]]),
            replay_counter: u64::from_be_bytes(replay),
            nonce,
        })
    }

    /// Minimal EAPOL-Key body with the given key information and nonce
    pub fn body(key_info: u16, replay_counter: u64, nonce: [u8; 32]) -> Vec<u8> {
        let mut buf = vec![0u8; KEY_BODY_MIN_SIZE];
        buf[0] = 2;
        buf[1..3].copy_from_slice(&key_info.to_be_bytes());
        buf[3..5].copy_from_slice(&16u16.to_be_bytes());
        buf[5..13].copy_from_slice(&replay_counter.to_be_bytes());
        buf[13..45].copy_from_slice(&nonce);
        buf
    }

    fn has(&self, bit: u16) -> bool {
        self.key_info & bit != 0
    }

    /// Position in the four-way handshake (1-4), if it is a pairwise key frame
    pub fn message_number(&self) -> Option<u8> {
        if !self.has(key_info::PAIRWISE) {
            return None;
        }
        match (self.has(key_info::ACK), self.has(key_info::MIC)) {
            (true, false) => Some(1),
            (true, true) => Some(3),
            (false, true) if self.has(key_info::SECURE) => Some(4),
            (false, true) => Some(2),
            (false, false) => None,
        }
    }
}
