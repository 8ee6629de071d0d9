//! Live monitor-mode capture wrapper around pcap

use airscope_core::{Error, LinkType, Packet, Result};
use airscope_packet::Frame;
use bytes::Bytes;
use parking_lot::RwLock;
use pcap::{Active, Capture, Device};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::interface::{get_interface, InterfaceInfo};
use crate::source::{decode_or_skip, packet_time, FrameSource};
use crate::stats::{CaptureStats, StatsAccumulator};

/// Default snapshot length (maximum bytes per packet)
const DEFAULT_SNAPLEN: i32 = 65535;

/// Default timeout for packet capture (milliseconds)
const DEFAULT_TIMEOUT_MS: i32 = 1000;

/// Configuration for live capture
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Maximum bytes to capture per packet
    pub snaplen: i32,
    /// Read timeout in milliseconds
    pub timeout_ms: i32,
    /// Enable promiscuous mode
    pub promiscuous: bool,
    /// Request monitor mode (rfmon) from libpcap
    pub monitor_mode: bool,
    /// Buffer size (0 = default)
    pub buffer_size: i32,
    /// Enable immediate mode (deliver packets immediately)
    pub immediate_mode: bool,
    /// BPF filter applied when the capture opens
    pub filter: Option<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            snaplen: DEFAULT_SNAPLEN,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            promiscuous: true,
            monitor_mode: false,
            buffer_size: 0,
            immediate_mode: true,
            filter: None,
        }
    }
}

/// State of a live capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// Created, not yet opened
    Idle,
    /// Delivering frames
    Capturing,
    /// Stop requested; the stream ends before the next frame
    Stopping,
    /// Finished
    Stopped,
}

/// Shared, cloneable lifecycle of a capture
///
/// Clones observe and drive the same state, so a handle can be given to
/// another thread (or a signal handler) to request a stop.
#[derive(Debug, Clone)]
pub struct CaptureLifecycle {
    state: Arc<RwLock<CaptureState>>,
}

impl CaptureLifecycle {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(CaptureState::Idle)),
        }
    }

    /// Current state
    pub fn state(&self) -> CaptureState {
        *self.state.read()
    }

    /// Idle -> Capturing
    pub fn start(&self) -> Result<()> {
        let mut state = self.state.write();
        match *state {
            CaptureState::Idle => {
                *state = CaptureState::Capturing;
                Ok(())
            }
            other => Err(Error::InvalidState(format!(
                "cannot start a capture in state {:?}",
                other
            ))),
        }
    }

    /// Capturing -> Stopping; returns false if the capture was not running
    pub fn request_stop(&self) -> bool {
        let mut state = self.state.write();
        if *state == CaptureState::Capturing {
            *state = CaptureState::Stopping;
            true
        } else {
            false
        }
    }

    /// Stopping -> Stopped
    pub fn finish(&self) -> Result<()> {
        let mut state = self.state.write();
        match *state {
            CaptureState::Stopping => {
                *state = CaptureState::Stopped;
                Ok(())
            }
            other => Err(Error::InvalidState(format!(
                "cannot finish a capture in state {:?}",
                other
            ))),
        }
    }

    /// Stop after a fatal error, still passing through Stopping
    pub fn abort(&self) {
        self.request_stop();
        let _ = self.finish();
    }

    /// Check if frames are being delivered
    pub fn is_capturing(&self) -> bool {
        self.state() == CaptureState::Capturing
    }
}

impl Default for CaptureLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Live capture on a monitor-mode interface
///
/// The stream is infinite: it only ends after a stop request or a fatal
/// capture error.
pub struct LiveCapture {
    interface: String,
    interface_info: InterfaceInfo,
    config: CaptureConfig,
    capture: Option<Capture<Active>>,
    linktype: LinkType,
    lifecycle: CaptureLifecycle,
    stats: StatsAccumulator,
}

impl LiveCapture {
    /// Create a live capture on the specified interface
    pub fn new(interface: &str, config: CaptureConfig) -> Result<Self> {
        let interface_info = get_interface(interface)?;

        if !interface_info.is_up {
            return Err(Error::Capture(format!(
                "Interface '{}' is not up",
                interface
            )));
        }
        if !interface_info.looks_wireless() {
            warn!(interface = %interface, "Interface does not look like a wireless device");
        }

        info!("Created live capture on interface: {}", interface);

        Ok(Self {
            interface: interface.to_string(),
            interface_info,
            config,
            capture: None,
            linktype: LinkType::Radiotap,
            lifecycle: CaptureLifecycle::new(),
            stats: StatsAccumulator::new(),
        })
    }

    /// Get interface information
    pub fn interface_info(&self) -> &InterfaceInfo {
        &self.interface_info
    }

    /// Get current capture state
    pub fn state(&self) -> CaptureState {
        self.lifecycle.state()
    }

    /// Handle that can stop this capture from elsewhere
    pub fn lifecycle(&self) -> CaptureLifecycle {
        self.lifecycle.clone()
    }

    /// Link type reported by the opened capture
    pub fn linktype(&self) -> LinkType {
        self.linktype
    }

    /// Initialize pcap capture
    fn init_capture(&self) -> Result<Capture<Active>> {
        debug!("Initializing pcap capture on {}", self.interface);

        let device = Device::from(self.interface.as_str());
        let mut capture = Capture::from_device(device)
            .map_err(|e| Error::Capture(format!("Failed to create capture: {}", e)))?
            .promisc(self.config.promiscuous)
            .rfmon(self.config.monitor_mode)
            .snaplen(self.config.snaplen)
            .timeout(self.config.timeout_ms)
            .immediate_mode(self.config.immediate_mode);

        if self.config.buffer_size > 0 {
            capture = capture.buffer_size(self.config.buffer_size);
        }

        let mut capture = capture
            .open()
            .map_err(|e| Error::Capture(format!("Failed to open capture: {}", e)))?;

        if let Some(filter) = self.config.filter.as_ref() {
            capture
                .filter(filter, true)
                .map_err(|e| Error::Capture(format!("Failed to apply filter: {}", e)))?;
            debug!("Applied filter: {}", filter);
        }

        info!("Capture initialized on {}", self.interface);
        Ok(capture)
    }

    /// Open the device and start delivering frames
    pub fn start(&mut self) -> Result<()> {
        self.lifecycle.start()?;

        let capture = match self.init_capture() {
            Ok(capture) => capture,
            Err(e) => {
                self.lifecycle.abort();
                return Err(e);
            }
        };

        self.linktype = LinkType::from_dlt(capture.get_datalink().0);
        if let LinkType::Other(dlt) = self.linktype {
            warn!(
                interface = %self.interface,
                dlt,
                "Interface is not in monitor mode; frames will not decode"
            );
        }
        self.capture = Some(capture);

        info!(interface = %self.interface, linktype = ?self.linktype, "Starting live capture");
        Ok(())
    }

    /// Request a stop; the stream ends before the next frame
    pub fn stop(&mut self) {
        if self.lifecycle.request_stop() {
            info!("Stopping live capture on {}", self.interface);
        }
    }

    /// Refresh kernel drop counters from pcap
    pub fn refresh_pcap_stats(&mut self) -> Result<()> {
        let capture = self
            .capture
            .as_mut()
            .ok_or_else(|| Error::Capture("Capture not active".to_string()))?;
        let stats = capture
            .stats()
            .map_err(|e| Error::Capture(format!("Failed to get stats: {}", e)))?;
        self.stats
            .set_drops(u64::from(stats.dropped), u64::from(stats.if_dropped));
        Ok(())
    }

    fn close(&mut self) {
        if let Err(e) = self.refresh_pcap_stats() {
            debug!("Could not read final pcap stats: {}", e);
        }
        self.capture = None;
        info!("Capture on {} finished", self.interface);
    }
}

impl FrameSource for LiveCapture {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            match self.lifecycle.state() {
                CaptureState::Idle => self.start()?,
                CaptureState::Capturing => {}
                CaptureState::Stopping => {
                    self.lifecycle.finish()?;
                    self.close();
                    return Ok(None);
                }
                CaptureState::Stopped => return Ok(None),
            }

            let capture = match self.capture.as_mut() {
                Some(capture) => capture,
                None => {
                    self.lifecycle.abort();
                    return Err(Error::Capture("Capture not active".to_string()));
                }
            };

            let packet = match capture.next_packet() {
                Ok(raw) => Packet {
                    timestamp: packet_time(raw.header),
                    source: self.interface.clone(),
                    linktype: self.linktype,
                    data: Bytes::copy_from_slice(raw.data),
                },
                Err(pcap::Error::TimeoutExpired) => continue,
                Err(e) => {
                    error!("Packet capture error: {}", e);
                    self.lifecycle.abort();
                    return Err(Error::Capture(format!("Capture failed: {}", e)));
                }
            };

            if let Some(frame) = decode_or_skip(&packet, &self.stats) {
                return Ok(Some(frame));
            }
        }
    }

    fn request_stop(&mut self) {
        self.stop();
    }

    fn name(&self) -> &str {
        &self.interface
    }

    fn stats(&self) -> CaptureStats {
        self.stats.snapshot()
    }
}

impl Drop for LiveCapture {
    fn drop(&mut self) {
        self.lifecycle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_config_default() {
        let config = CaptureConfig::default();
        assert_eq!(config.snaplen, DEFAULT_SNAPLEN);
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert!(config.promiscuous);
        assert!(!config.monitor_mode);
        assert!(config.filter.is_none());
    }

    #[test]
    fn test_lifecycle_happy_path() {
        let lifecycle = CaptureLifecycle::new();
        assert_eq!(lifecycle.state(), CaptureState::Idle);

        lifecycle.start().unwrap();
        assert!(lifecycle.is_capturing());

        assert!(lifecycle.request_stop());
        assert_eq!(lifecycle.state(), CaptureState::Stopping);

        lifecycle.finish().unwrap();
        assert_eq!(lifecycle.state(), CaptureState::Stopped);
    }

    #[test]
    fn test_lifecycle_never_skips_stopping() {
        let lifecycle = CaptureLifecycle::new();
        assert!(lifecycle.finish().is_err());

        lifecycle.start().unwrap();
        assert!(lifecycle.finish().is_err());
        assert!(lifecycle.start().is_err());
        assert_eq!(lifecycle.state(), CaptureState::Capturing);
    }

    #[test]
    fn test_stop_request_before_start_is_ignored() {
        let lifecycle = CaptureLifecycle::new();
        assert!(!lifecycle.request_stop());
        assert_eq!(lifecycle.state(), CaptureState::Idle);
    }

    #[test]
    fn test_lifecycle_clones_share_state() {
        let lifecycle = CaptureLifecycle::new();
        let handle = lifecycle.clone();
        lifecycle.start().unwrap();

        let stopper = std::thread::spawn(move || handle.request_stop());
        assert!(stopper.join().unwrap());
        assert_eq!(lifecycle.state(), CaptureState::Stopping);
    }

    #[test]
    fn test_abort_ends_stopped() {
        let lifecycle = CaptureLifecycle::new();
        lifecycle.start().unwrap();
        lifecycle.abort();
        assert_eq!(lifecycle.state(), CaptureState::Stopped);

        let idle = CaptureLifecycle::new();
        idle.abort();
        assert_eq!(idle.state(), CaptureState::Idle);
    }

    #[test]
    fn test_new_capture_on_missing_interface() {
        let result = LiveCapture::new("nonexistent_interface_xyz", CaptureConfig::default());
        assert!(matches!(result, Err(Error::InterfaceNotFound(_))));
    }
}
