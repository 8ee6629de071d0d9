//! Frame source counters

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Snapshot of what a frame source has seen
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CaptureStats {
    /// Packets handed over by pcap or the in-memory queue
    pub packets_received: u64,
    pub bytes_received: u64,
    /// Packets skipped because they did not decode as 802.11
    pub packets_malformed: u64,
    /// Drops reported by the kernel (live capture only)
    pub kernel_dropped: u64,
    /// Drops reported by the driver (live capture only)
    pub interface_dropped: u64,
    /// Time since the source was created
    pub elapsed: Duration,
}

impl CaptureStats {
    /// Frames that reached the analyzer
    pub fn frames_decoded(&self) -> u64 {
        self.packets_received.saturating_sub(self.packets_malformed)
    }

    /// Kernel drops as a percentage of everything the kernel saw
    pub fn drop_rate(&self) -> f64 {
        percent(self.kernel_dropped, self.packets_received + self.kernel_dropped)
    }

    /// Malformed packets as a percentage of received packets
    pub fn malformed_rate(&self) -> f64 {
        percent(self.packets_malformed, self.packets_received)
    }

    pub fn packets_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.packets_received as f64 / secs
        } else {
            0.0
        }
    }

    /// Format statistics as human-readable string
    pub fn format(&self) -> String {
        format!(
            "Packets: {} received ({} bytes), {} decoded, {} malformed ({:.2}%)\n\
             Drops: {} kernel ({:.2}%), {} interface\n\
             Elapsed: {:.2}s ({:.1} packets/s)",
            self.packets_received,
            self.bytes_received,
            self.frames_decoded(),
            self.packets_malformed,
            self.malformed_rate(),
            self.kernel_dropped,
            self.drop_rate(),
            self.interface_dropped,
            self.elapsed.as_secs_f64(),
            self.packets_per_second(),
        )
    }
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

#[derive(Debug, Default)]
struct Counters {
    packets: AtomicU64,
    bytes: AtomicU64,
    malformed: AtomicU64,
    kernel_dropped: AtomicU64,
    interface_dropped: AtomicU64,
}

/// Shared counters updated by a frame source
///
/// Clones share the same counters.
#[derive(Debug, Clone)]
pub struct StatsAccumulator {
    counters: Arc<Counters>,
    started: Instant,
}

impl StatsAccumulator {
    pub fn new() -> Self {
        Self {
            counters: Arc::new(Counters::default()),
            started: Instant::now(),
        }
    }

    /// Count a packet before it is decoded
    pub fn record_packet(&self, len: usize) {
        self.counters.packets.fetch_add(1, Ordering::Relaxed);
        self.counters.bytes.fetch_add(len as u64, Ordering::Relaxed);
    }

    /// Count a packet that did not decode
    pub fn record_malformed(&self) {
        self.counters.malformed.fetch_add(1, Ordering::Relaxed);
    }

    /// Replace the drop counters with the totals reported by pcap
    pub fn set_drops(&self, kernel: u64, interface: u64) {
        self.counters.kernel_dropped.store(kernel, Ordering::Relaxed);
        self.counters
            .interface_dropped
            .store(interface, Ordering::Relaxed);
    }

    pub fn packets_received(&self) -> u64 {
        self.counters.packets.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> CaptureStats {
        let c = &self.counters;
        CaptureStats {
            packets_received: c.packets.load(Ordering::Relaxed),
            bytes_received: c.bytes.load(Ordering::Relaxed),
            packets_malformed: c.malformed.load(Ordering::Relaxed),
            kernel_dropped: c.kernel_dropped.load(Ordering::Relaxed),
            interface_dropped: c.interface_dropped.load(Ordering::Relaxed),
            elapsed: self.started.elapsed(),
        }
    }
}

impl Default for StatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
