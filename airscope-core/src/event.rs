//! Published events and the sinks that receive them
//!
//! The analyzer announces what it learns on a small, fixed set of topics.
//! Publication is fire-and-forget: the analyzer logs a failed publish and
//! keeps processing frames.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{Channel, Error, MacAddr, Result};

/// Topic for newly seen (access point, client) pairs
pub const TOPIC_CLIENT_FOUND: &str = "client_found";
/// Topic for beacons of access points marked as targets
pub const TOPIC_TARGET_FOUND: &str = "target_found";
/// Topic for WEP-encrypted traffic
pub const TOPIC_WEP_FOUND: &str = "wep_found";
/// Topic for newly discovered open networks
pub const TOPIC_SCAN: &str = "scan";

/// Payload of `client_found`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientFound {
    pub client_addr: MacAddr,
    pub bssid: MacAddr,
    pub channel: Option<Channel>,
}

/// Payload of `target_found`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetFound {
    pub bssid: MacAddr,
    pub channel: Option<Channel>,
}

/// Payload of `wep_found`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WepFound {
    pub client_addr: Option<MacAddr>,
    pub bssid: MacAddr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arp: Option<bool>,
}

/// Payload of `scan`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scan {
    pub bssid: MacAddr,
}

/// Event published by the analyzer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ClientFound(ClientFound),
    TargetFound(TargetFound),
    WepFound(WepFound),
    Scan(Scan),
}

impl Event {
    /// Topic name this event is published on
    pub fn topic(&self) -> &'static str {
        match self {
            Event::ClientFound(_) => TOPIC_CLIENT_FOUND,
            Event::TargetFound(_) => TOPIC_TARGET_FOUND,
            Event::WepFound(_) => TOPIC_WEP_FOUND,
            Event::Scan(_) => TOPIC_SCAN,
        }
    }

    /// JSON payload
    pub fn payload(&self) -> Result<String> {
        let text = match self {
            Event::ClientFound(p) => serde_json::to_string(p),
            Event::TargetFound(p) => serde_json::to_string(p),
            Event::WepFound(p) => serde_json::to_string(p),
            Event::Scan(p) => serde_json::to_string(p),
        };
        text.map_err(|e| Error::publish(self.topic().to_string(), e.to_string()))
    }
}

/// Receiver of published events (a pub/sub bus the analyzer does not own)
pub trait EventSink: Send + Sync {
    /// Publish a raw payload on a topic
    fn publish(&self, topic: &str, payload: &str) -> Result<()>;

    /// Serialize and publish an event
    fn publish_event(&self, event: &Event) -> Result<()> {
        let payload = event.payload()?;
        self.publish(event.topic(), &payload)
    }
}

/// Sink that keeps every published event in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<(String, String)>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All published (topic, payload) pairs in publication order
    pub fn published(&self) -> Vec<(String, String)> {
        self.events.lock().clone()
    }

    /// Payloads published on one topic
    pub fn payloads(&self, topic: &str) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| p.clone())
            .collect()
    }

    /// Forget everything published so far
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for MemorySink {
    fn publish(&self, topic: &str, payload: &str) -> Result<()> {
        self.events
            .lock()
            .push((topic.to_string(), payload.to_string()));
        Ok(())
    }
}

/// Sink that writes events to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&self, topic: &str, payload: &str) -> Result<()> {
        info!(topic = %topic, payload = %payload, "Event published");
        Ok(())
    }
}
