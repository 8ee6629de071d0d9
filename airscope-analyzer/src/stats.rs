//! Analyzer statistics and run summary

use airscope_capture::CaptureStats;
use airscope_core::MacAddr;
use std::collections::BTreeMap;

use crate::classify::FrameClass;

/// Counters kept by an analyzer
#[derive(Debug, Clone, Default)]
pub struct AnalyzerStats {
    /// Frames handed to the analyzer
    pub frames_seen: u64,
    /// Frames per class
    pub per_class: BTreeMap<FrameClass, u64>,
    /// Events delivered to the sink
    pub events_published: u64,
    /// Failed publishes
    pub publish_errors: u64,
    /// Failed store operations
    pub store_errors: u64,
    /// SSIDs that were not valid UTF-8
    pub encoding_errors: u64,
    /// EAPOL frames collected
    pub handshake_frames: u64,
}

impl AnalyzerStats {
    /// Count a classified frame
    pub fn record(&mut self, class: FrameClass) {
        self.frames_seen += 1;
        *self.per_class.entry(class).or_insert(0) += 1;
    }

    /// Frames of one class
    pub fn count(&self, class: FrameClass) -> u64 {
        self.per_class.get(&class).copied().unwrap_or(0)
    }

    /// Frames dropped as unrecognized
    pub fn frames_dropped(&self) -> u64 {
        self.count(FrameClass::Unrecognized)
    }

    /// Frames that went through the handlers
    pub fn frames_processed(&self) -> u64 {
        self.frames_seen - self.frames_dropped()
    }

    /// Format statistics as human-readable string
    pub fn format(&self) -> String {
        let mut out = format!(
            "Frames: {} seen, {} processed, {} dropped\n\
             Events: {} published, {} failed\n\
             Store errors: {}, encoding errors: {}\n\
             Handshake frames: {}",
            self.frames_seen,
            self.frames_processed(),
            self.frames_dropped(),
            self.events_published,
            self.publish_errors,
            self.store_errors,
            self.encoding_errors,
            self.handshake_frames,
        );
        for (class, count) in &self.per_class {
            out.push_str(&format!("\n  {}: {}", class, count));
        }
        out
    }
}

/// Result of [`Analyzer::run`](crate::Analyzer::run)
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub stats: AnalyzerStats,
    pub capture: CaptureStats,
    /// Access points with at least one captured handshake frame
    pub handshake_bssids: Vec<MacAddr>,
    /// The run ended because a stop was requested through the store
    pub stopped_by_request: bool,
}

impl RunSummary {
    /// Check if any handshake frame was captured
    pub fn has_handshakes(&self) -> bool {
        !self.handshake_bssids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let mut stats = AnalyzerStats::default();
        stats.record(FrameClass::Beacon);
        stats.record(FrameClass::Beacon);
        stats.record(FrameClass::Unrecognized);

        assert_eq!(stats.frames_seen, 3);
        assert_eq!(stats.count(FrameClass::Beacon), 2);
        assert_eq!(stats.count(FrameClass::WepData), 0);
        assert_eq!(stats.frames_dropped(), 1);
        assert_eq!(stats.frames_processed(), 2);
        assert!(stats.format().contains("beacon: 2"));
    }
}
