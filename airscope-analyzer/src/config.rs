//! Analyzer configuration

use airscope_core::{keys, Channel, Error, MacAddr, MacPrefix, Result};
use std::time::Duration;

/// Addresses and prefixes never registered as clients
pub const DEFAULT_IGNORED: [&str; 6] = [
    "ff:ff:ff:ff:ff:ff",
    "00:00:00:00:00:00",
    "33:33:00:",
    "33:33:ff:",
    "01:80:c2:00:00:00",
    "01:00:5e:",
];

/// Default lifetime of the probed-networks set
pub const DEFAULT_PROBE_NETWORK_TTL: Duration = Duration::from_secs(30);

/// Highest channel of the default (North American) plan
pub const LAST_CHANNEL_DEFAULT: Channel = 11;

/// Highest channel of the world plan
pub const LAST_CHANNEL_WORLD: Channel = 13;

/// Configuration for an [`Analyzer`](crate::Analyzer)
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Monitor interface name; enables per-interface channel counters
    pub interface: Option<String>,
    /// Accept channels 12 and 13
    pub world_channels: bool,
    /// Client addresses to ignore
    pub ignore: Vec<MacPrefix>,
    /// Expiry of `last_seen_probe_networks`
    pub probe_network_ttl: Duration,
    /// Store key polled for a cooperative stop
    pub stop_key: String,
    /// Maintain `iface_<iface>_channel_<n>_count` counters
    pub count_channels: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            interface: None,
            world_channels: false,
            ignore: DEFAULT_IGNORED
                .iter()
                .filter_map(|prefix| prefix.parse().ok())
                .collect(),
            probe_network_ttl: DEFAULT_PROBE_NETWORK_TTL,
            stop_key: keys::STOP_ANALYZER.to_string(),
            count_channels: true,
        }
    }
}

impl AnalyzerConfig {
    /// Configuration for a live monitor interface
    pub fn live(interface: &str) -> Self {
        Self {
            interface: Some(interface.to_string()),
            ..Default::default()
        }
    }

    /// Configuration for replaying a capture file (world channel plan)
    pub fn offline() -> Self {
        Self {
            world_channels: true,
            ..Default::default()
        }
    }

    /// Also ignore one exact address (typically the monitor interface's own MAC)
    pub fn ignore_mac(mut self, mac: MacAddr) -> Self {
        self.ignore.push(MacPrefix::exact(mac));
        self
    }

    /// Check a client address against the ignore list
    pub fn is_ignored(&self, mac: &MacAddr) -> bool {
        self.ignore.iter().any(|prefix| prefix.matches(mac))
    }

    /// Highest channel accepted by the active channel plan
    pub fn last_channel(&self) -> Channel {
        if self.world_channels {
            LAST_CHANNEL_WORLD
        } else {
            LAST_CHANNEL_DEFAULT
        }
    }

    /// Reject unusable settings
    pub fn validate(&self) -> Result<()> {
        if self.stop_key.is_empty() {
            return Err(Error::invalid_config("stop_key", "must not be empty"));
        }
        if self.probe_network_ttl.is_zero() {
            return Err(Error::invalid_config("probe_network_ttl", "must be positive"));
        }
        if let Some(iface) = &self.interface {
            if iface.is_empty() {
                return Err(Error::invalid_config("interface", "must not be empty"));
            }
        }
        Ok(())
    }
}
