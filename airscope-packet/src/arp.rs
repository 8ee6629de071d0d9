//! ARP packet parsing

use airscope_core::{Error, MacAddr, Result};
use std::net::Ipv4Addr;

/// Size of an Ethernet/IPv4 ARP packet
pub const ARP_PACKET_SIZE: usize = 28;

/// ARP Operation Codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpOpcode {
    /// ARP Request
    Request,
    /// ARP Reply
    Reply,
    /// Anything else (RARP, InARP, ...)
    Other(u16),
}

impl ArpOpcode {
    pub fn from_u16(val: u16) -> Self {
        match val {
            1 => Self::Request,
            2 => Self::Reply,
            other => Self::Other(other),
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            Self::Request => 1,
            Self::Reply => 2,
            Self::Other(val) => val,
        }
    }
}

/// ARP Packet (Ethernet hardware, IPv4 protocol)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpPacket {
    /// Operation
    pub operation: ArpOpcode,
    /// Sender hardware address
    pub sender_hw_addr: MacAddr,
    /// Sender protocol address
    pub sender_proto_addr: Ipv4Addr,
    /// Target hardware address
    pub target_hw_addr: MacAddr,
    /// Target protocol address
    pub target_proto_addr: Ipv4Addr,
}

impl ArpPacket {
    /// Create new ARP request
    pub fn new_request(sender_mac: MacAddr, sender_ip: Ipv4Addr, target_ip: Ipv4Addr) -> Self {
        Self {
            operation: ArpOpcode::Request,
            sender_hw_addr: sender_mac,
            sender_proto_addr: sender_ip,
            target_hw_addr: MacAddr::ZERO,
            target_proto_addr: target_ip,
        }
    }

    /// Parse ARP packet from bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < ARP_PACKET_SIZE {
            return Err(Error::parse("ARP packet too short"));
        }

        let htype = u16::from_be_bytes([data[0], data[1]]);
        let ptype = u16::from_be_bytes([data[2], data[3]]);
        if htype != 1 || ptype != 0x0800 || data[4] != 6 || data[5] != 4 {
            return Err(Error::parse("ARP packet is not Ethernet/IPv4"));
        }

        let operation = ArpOpcode::from_u16(u16::from_be_bytes([data[6], data[7]]));
        let mac_at = |offset: usize| {
            MacAddr::from_slice(&data[offset..offset + 6])
                .ok_or_else(|| Error::parse("ARP hardware address truncated"))
        };

        Ok(Self {
            operation,
            sender_hw_addr: mac_at(8)?,
            sender_proto_addr: Ipv4Addr::new(data[14], data[15], data[16], data[17]),
            target_hw_addr: mac_at(18)?,
            target_proto_addr: Ipv4Addr::new(data[24], data[25], data[26], data[27]),
        })
    }

    /// Serialize ARP packet to bytes
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(ARP_PACKET_SIZE);
        buf.extend_from_slice(&1u16.to_be_bytes());
        buf.extend_from_slice(&0x0800u16.to_be_bytes());
        buf.push(6);
        buf.push(4);
        buf.extend_from_slice(&self.operation.to_u16().to_be_bytes());
        buf.extend_from_slice(self.sender_hw_addr.as_bytes());
        buf.extend_from_slice(&self.sender_proto_addr.octets());
        buf.extend_from_slice(self.target_hw_addr.as_bytes());
        buf.extend_from_slice(&self.target_proto_addr.octets());
        buf
    }

    /// Check if this is a request
    pub fn is_request(&self) -> bool {
        self.operation == ArpOpcode::Request
    }
}
