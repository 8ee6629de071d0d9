//! Per-access-point accumulation of authentication exchange frames

use airscope_core::MacAddr;
use airscope_packet::Frame;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Session-scoped buffer of EAPOL frames per BSSID
///
/// Frames are kept in arrival order and never persisted. Deciding whether
/// an exchange is a complete four-way handshake is left to consumers.
#[derive(Debug, Default)]
pub struct HandshakeTracker {
    exchanges: Mutex<HashMap<MacAddr, Vec<Frame>>>,
}

impl HandshakeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a frame; returns the new length of the exchange
    pub fn append(&self, bssid: MacAddr, frame: Frame) -> usize {
        let mut exchanges = self.exchanges.lock();
        let exchange = exchanges.entry(bssid).or_default();
        exchange.push(frame);
        exchange.len()
    }

    /// Copy of the frames collected so far for an access point
    pub fn exchange_for(&self, bssid: &MacAddr) -> Vec<Frame> {
        self.exchanges
            .lock()
            .get(bssid)
            .cloned()
            .unwrap_or_default()
    }

    /// BSSIDs with at least one collected frame, sorted
    pub fn bssids(&self) -> Vec<MacAddr> {
        let mut bssids: Vec<MacAddr> = self.exchanges.lock().keys().copied().collect();
        bssids.sort();
        bssids
    }

    /// Check if anything was collected
    pub fn is_empty(&self) -> bool {
        self.exchanges.lock().is_empty()
    }

    /// Drop every buffer
    pub fn reset(&self) {
        self.exchanges.lock().clear();
    }
}
