//! The frame source abstraction shared by live and offline capture

use airscope_core::{Packet, Result};
use airscope_packet::Frame;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::stats::{CaptureStats, StatsAccumulator};

/// A stream of decoded 802.11 frames
pub trait FrameSource {
    /// Next decoded frame; `Ok(None)` once the stream has ended
    ///
    /// Packets that do not decode are counted and skipped, never returned.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Ask the source to end the stream after the current frame
    fn request_stop(&mut self) {}

    /// Name of the interface or file being read
    fn name(&self) -> &str;

    /// Statistics collected so far
    fn stats(&self) -> CaptureStats;
}

/// Decode a captured packet, counting it as malformed on failure
pub(crate) fn decode_or_skip(packet: &Packet, stats: &StatsAccumulator) -> Option<Frame> {
    stats.record_packet(packet.len());
    match airscope_packet::decode(packet) {
        Ok(frame) => Some(frame),
        Err(e) => {
            stats.record_malformed();
            debug!(source = %packet.source, len = packet.len(), "Skipping malformed frame: {}", e);
            None
        }
    }
}

/// Capture timestamp of a pcap record
pub(crate) fn packet_time(header: &pcap::PacketHeader) -> SystemTime {
    let secs = header.ts.tv_sec.max(0) as u64;
    let micros = header.ts.tv_usec.max(0) as u64;
    UNIX_EPOCH + Duration::from_secs(secs) + Duration::from_micros(micros)
}
