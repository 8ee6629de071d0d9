//! Offline replay of a capture file or an in-memory packet list

use airscope_core::{Error, LinkType, Packet, Result};
use airscope_packet::Frame;
use bytes::Bytes;
use pcap::{Capture, Offline};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::source::{decode_or_skip, packet_time, FrameSource};
use crate::stats::{CaptureStats, StatsAccumulator};

enum Input {
    File {
        capture: Capture<Offline>,
        linktype: LinkType,
    },
    Memory(VecDeque<Packet>),
}

/// Finite frame source replaying recorded traffic
pub struct OfflineCapture {
    name: String,
    path: Option<PathBuf>,
    input: Input,
    finished: bool,
    stats: StatsAccumulator,
}

impl OfflineCapture {
    /// Open a pcap capture file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let capture = Capture::from_file(path).map_err(|e| {
            Error::Capture(format!("Failed to open '{}': {}", path.display(), e))
        })?;

        let linktype = LinkType::from_dlt(capture.get_datalink().0);
        if let LinkType::Other(dlt) = linktype {
            warn!(
                file = %path.display(),
                dlt,
                "Capture file is not 802.11; every frame will be skipped"
            );
        }

        info!(file = %path.display(), linktype = ?linktype, "Opened capture file");

        Ok(Self {
            name: path.display().to_string(),
            path: Some(path.to_path_buf()),
            input: Input::File { capture, linktype },
            finished: false,
            stats: StatsAccumulator::new(),
        })
    }

    /// Replay packets already held in memory
    pub fn from_packets(name: &str, packets: Vec<Packet>) -> Self {
        debug!(source = %name, count = packets.len(), "Replaying in-memory packets");
        Self {
            name: name.to_string(),
            path: None,
            input: Input::Memory(packets.into()),
            finished: false,
            stats: StatsAccumulator::new(),
        }
    }

    /// Path of the capture file, when replaying one
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn next_packet(&mut self) -> Result<Option<Packet>> {
        match &mut self.input {
            Input::Memory(queue) => Ok(queue.pop_front()),
            Input::File { capture, linktype } => match capture.next_packet() {
                Ok(raw) => Ok(Some(Packet {
                    timestamp: packet_time(raw.header),
                    source: self.name.clone(),
                    linktype: *linktype,
                    data: Bytes::copy_from_slice(raw.data),
                })),
                Err(pcap::Error::NoMorePackets) => Ok(None),
                // a file cut short mid-write still ends the replay normally
                Err(e) => {
                    warn!(source = %self.name, "Failed to read capture file: {}", e);
                    self.stats.record_packet(0);
                    self.stats.record_malformed();
                    Ok(None)
                }
            },
        }
    }
}

impl FrameSource for OfflineCapture {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        while !self.finished {
            match self.next_packet()? {
                Some(packet) => {
                    if let Some(frame) = decode_or_skip(&packet, &self.stats) {
                        return Ok(Some(frame));
                    }
                }
                None => {
                    self.finished = true;
                    info!(source = %self.name, packets = self.stats.packets_received(), "Replay finished");
                }
            }
        }
        Ok(None)
    }

    fn request_stop(&mut self) {
        if !self.finished {
            info!(source = %self.name, "Replay stopped on request");
            self.finished = true;
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn stats(&self) -> CaptureStats {
        self.stats.snapshot()
    }
}
