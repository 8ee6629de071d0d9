//! IEEE 802.11 frame decoding for airscope
//!
//! Turns captured [`Packet`]s into [`Frame`]s: strips the radiotap header
//! and FCS, decodes the MAC header and management tagged parameters, and
//! exposes the LLC/SNAP, EAPOL and ARP payloads of data frames.

pub mod arp;
pub mod builder;
pub mod dot11;
pub mod eapol;
pub mod ie;
pub mod llc;
pub mod radiotap;

pub use arp::{ArpOpcode, ArpPacket};
pub use builder::FrameBuilder;
pub use dot11::{capability_text, Frame, FrameControl, FrameType, ProtectedHeader};
pub use eapol::{EapolKey, EapolPacket, EapolType};
pub use ie::{element_id, InformationElement};
pub use radiotap::RadiotapHeader;

use airscope_core::{Error, LinkType, Packet, Result};

const FCS_SIZE: usize = 4;

/// Decode a captured packet into an 802.11 frame
pub fn decode(packet: &Packet) -> Result<Frame> {
    match packet.linktype {
        LinkType::Ieee80211 => Frame::parse(packet.data.clone(), packet.timestamp, None),
        LinkType::Radiotap => {
            let header = RadiotapHeader::parse(&packet.data)?;
            let mut end = packet.data.len();
            if header.has_fcs() {
                if end < header.length + FCS_SIZE {
                    return Err(Error::parse("frame shorter than its FCS"));
                }
                end -= FCS_SIZE;
            }
            Frame::parse(
                packet.data.slice(header.length..end),
                packet.timestamp,
                header.antenna_signal,
            )
        }
        LinkType::Other(dlt) => Err(Error::parse(format!(
            "unsupported link type {} (expected 802.11 or radiotap)",
            dlt
        ))),
    }
}
