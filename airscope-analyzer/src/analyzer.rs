//! Per-frame analysis loop
//!
//! The `Analyzer` pulls frames from a [`FrameSource`], classifies them and
//! dispatches to the handler for each class. Everything it learns goes into
//! the shared store; discoveries other processes care about are published
//! on the event sink. A failing store write or publish is logged and
//! counted, and never ends the loop.

use airscope_capture::FrameSource;
use airscope_core::event::{ClientFound, Scan, TargetFound, WepFound};
use airscope_core::{keys, Channel, Crypto, Error, Event, EventSink, KeyValueStore, MacAddr, Result};
use airscope_packet::{capability_text, Frame};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::access_point::{AccessPointRegistry, ApObservation};
use crate::channel::frame_channel;
use crate::classify::{classify, FrameClass};
use crate::client::ClientRegistry;
use crate::config::AnalyzerConfig;
use crate::crypto::{detect_crypto, frame_ssid};
use crate::handshake::HandshakeTracker;
use crate::probe::{ProbeLog, ProbeSighting};
use crate::stats::{AnalyzerStats, RunSummary};

/// Value of the stop key that ends a run
pub const STOP_VALUE: &str = "True";

/// Passive 802.11 analyzer
pub struct Analyzer {
    config: AnalyzerConfig,
    store: Arc<dyn KeyValueStore>,
    sink: Arc<dyn EventSink>,
    access_points: AccessPointRegistry,
    clients: ClientRegistry,
    probes: ProbeLog,
    handshakes: HandshakeTracker,
    stats: AnalyzerStats,
    /// When the probed-networks expiry was last applied
    probe_expiry_applied: Option<Instant>,
}

impl Analyzer {
    /// Create an analyzer over a store and an event sink
    ///
    /// The probed-networks set gets its expiry here; if the set does not
    /// exist yet the expiry is applied after the first probe is recorded,
    /// and again whenever a probe recreates the set after it expired.
    pub fn new(
        config: AnalyzerConfig,
        store: Arc<dyn KeyValueStore>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self> {
        config.validate()?;

        let probes = ProbeLog::new(store.clone());
        let probe_expiry_applied = match probes.expire_networks(config.probe_network_ttl) {
            Ok(applied) => applied.then(Instant::now),
            Err(e) => {
                warn!("Failed to set expiry on probed networks: {}", e);
                None
            }
        };

        info!(
            interface = ?config.interface,
            world_channels = config.world_channels,
            ignored = config.ignore.len(),
            "Creating analyzer"
        );

        Ok(Self {
            access_points: AccessPointRegistry::new(store.clone()),
            clients: ClientRegistry::new(store.clone()),
            probes,
            handshakes: HandshakeTracker::new(),
            stats: AnalyzerStats::default(),
            probe_expiry_applied,
            config,
            store,
            sink,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn access_points(&self) -> &AccessPointRegistry {
        &self.access_points
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    pub fn probes(&self) -> &ProbeLog {
        &self.probes
    }

    /// EAPOL frames collected during this session
    pub fn handshakes(&self) -> &HandshakeTracker {
        &self.handshakes
    }

    pub fn stats(&self) -> &AnalyzerStats {
        &self.stats
    }

    /// Forget session state (collected handshakes and counters)
    ///
    /// Store contents are shared with other processes and are left alone.
    pub fn reset(&mut self) {
        self.handshakes.reset();
        self.stats = AnalyzerStats::default();
    }

    /// Check the store for a cooperative stop request
    pub fn stop_requested(&mut self) -> bool {
        match self.store.get(&self.config.stop_key) {
            Ok(value) => value.as_deref() == Some(STOP_VALUE),
            Err(e) => {
                self.store_failed("read stop flag", &e);
                false
            }
        }
    }

    /// Pull frames until the source is exhausted or a stop is requested
    ///
    /// The stop flag is checked before every frame. Only an error from the
    /// source ends the run early.
    pub fn run<S: FrameSource + ?Sized>(&mut self, source: &mut S) -> Result<RunSummary> {
        info!(source = %source.name(), "Starting analysis");
        let mut stopped_by_request = false;

        loop {
            if !stopped_by_request && self.stop_requested() {
                info!(key = %self.config.stop_key, "Stop requested");
                source.request_stop();
                stopped_by_request = true;
            }

            match source.next_frame()? {
                Some(frame) => {
                    self.process(&frame);
                }
                None => break,
            }
        }

        let handshake_bssids = self.handshakes.bssids();
        if !handshake_bssids.is_empty() {
            info!(
                access_points = handshake_bssids.len(),
                "Collected handshake frames"
            );
        }
        info!(
            frames = self.stats.frames_seen,
            dropped = self.stats.frames_dropped(),
            "Analysis finished"
        );

        Ok(RunSummary {
            stats: self.stats.clone(),
            capture: source.stats(),
            handshake_bssids,
            stopped_by_request,
        })
    }

    /// Classify one frame and update state accordingly
    pub fn process(&mut self, frame: &Frame) -> FrameClass {
        let class = classify(frame);
        self.stats.record(class);

        if class == FrameClass::Unrecognized {
            debug!(truncated = frame.truncated, "Dropping unrecognized frame");
            return class;
        }
        if let Some(dbm) = frame.signal_dbm {
            debug!(class = %class, signal_dbm = dbm, "Frame");
        }

        match class {
            FrameClass::Beacon | FrameClass::ProbeResponse => self.handle_beacon(frame, class),
            FrameClass::ProbeRequest => self.handle_probe_request(frame),
            FrameClass::EapolKeyExchange => self.handle_eapol(frame),
            FrameClass::WepData => self.handle_wep(frame),
            _ => {}
        }

        self.register_client(frame);
        class
    }

    fn handle_beacon(&mut self, frame: &Frame, class: FrameClass) {
        let bssid = match frame.bssid() {
            Some(bssid) if !bssid.is_broadcast() => bssid,
            _ => return,
        };
        let ssid = match frame_ssid(frame) {
            Ok(ssid) => ssid,
            Err(e) => {
                self.encoding_failed(&bssid, &e);
                return;
            }
        };

        let channel = self.observe_channel(frame);
        let observation = ApObservation {
            ssid,
            channel,
            crypto: detect_crypto(frame),
            capability: frame.capability.map(capability_text),
            from_probe: false,
        };

        let (access_point, outcome) = match self.access_points.observe(bssid, &observation) {
            Ok(result) => result,
            Err(e) => {
                self.store_failed("update access point", &e);
                return;
            }
        };

        if outcome.crypto_added.contains(&Crypto::Opn) {
            info!(bssid = %bssid, ssid = %access_point.ssid, "Open network");
            self.publish(Event::Scan(Scan { bssid }));
        }
        if class == FrameClass::Beacon && access_point.target {
            self.publish(Event::TargetFound(TargetFound {
                bssid,
                channel: access_point.channel,
            }));
        }
    }

    /// Channel of a beacon, counted per interface when configured
    fn observe_channel(&mut self, frame: &Frame) -> Option<Channel> {
        let channel = frame_channel(frame, self.config.last_channel())?;
        if !self.config.count_channels {
            return Some(channel);
        }
        if let Some(iface) = self.config.interface.clone() {
            if let Err(e) = self.store.incr(&keys::channel_count(&iface, channel)) {
                self.store_failed("count channel", &e);
            }
        }
        Some(channel)
    }

    fn handle_probe_request(&mut self, frame: &Frame) {
        let client = match frame.addr2 {
            Some(client) => client,
            None => return,
        };
        let ssid = match frame_ssid(frame) {
            Ok(Some(ssid)) => ssid,
            Ok(None) => {
                debug!(client = %client, "Wildcard probe request");
                return;
            }
            Err(e) => {
                self.encoding_failed(&client, &e);
                return;
            }
        };

        let access_point = frame
            .addr3
            .filter(|addr| !addr.is_broadcast() && !addr.is_multicast());
        if let Some(bssid) = access_point {
            let observation = ApObservation {
                ssid: Some(ssid.clone()),
                from_probe: true,
                ..Default::default()
            };
            if let Err(e) = self.access_points.observe(bssid, &observation) {
                self.store_failed("update access point", &e);
            }
        }

        if self.config.is_ignored(&client) {
            return;
        }
        let sighting = ProbeSighting {
            ssid,
            client,
            access_point,
        };
        if let Err(e) = self.probes.record(&sighting) {
            self.store_failed("record probe", &e);
            return;
        }
        let ttl = self.config.probe_network_ttl;
        // past the ttl the set has expired and this probe recreated it
        let due = self
            .probe_expiry_applied
            .map_or(true, |applied| applied.elapsed() >= ttl);
        if due {
            match self.probes.expire_networks(ttl) {
                Ok(applied) => self.probe_expiry_applied = applied.then(Instant::now),
                Err(e) => self.store_failed("expire probed networks", &e),
            }
        }
    }

    fn handle_eapol(&mut self, frame: &Frame) {
        let bssid = match frame.bssid() {
            Some(bssid) => bssid,
            None => {
                debug!("EAPOL frame without a BSSID");
                return;
            }
        };
        let message = frame
            .eapol()
            .and_then(|packet| packet.key())
            .and_then(|key| key.message_number());

        let collected = self.handshakes.append(bssid, frame.clone());
        self.stats.handshake_frames += 1;
        info!(
            bssid = %bssid,
            message = ?message,
            collected = collected,
            "Handshake frame"
        );
    }

    fn handle_wep(&mut self, frame: &Frame) {
        let bssid = match frame.bssid() {
            Some(bssid) => bssid,
            None => return,
        };
        let client_addr = client_address(frame, bssid)
            .filter(|addr| !addr.is_broadcast() && !addr.is_multicast());
        let arp = frame.arp().map_or(false, |packet| packet.is_request());

        debug!(bssid = %bssid, client = ?client_addr, arp = arp, "WEP traffic");
        self.publish(Event::WepFound(WepFound {
            client_addr,
            bssid,
            arp: arp.then_some(true),
        }));
    }

    /// Record the (access point, client) pair a frame reveals
    fn register_client(&mut self, frame: &Frame) {
        let bssid = match frame.bssid() {
            Some(bssid) if !bssid.is_broadcast() => bssid,
            _ => return,
        };
        let client = match client_address(frame, bssid) {
            Some(client) => client,
            None => return,
        };
        if client.is_multicast() || self.config.is_ignored(&client) {
            return;
        }

        let seen = DateTime::<Utc>::from(frame.timestamp);
        match self.clients.observe(bssid, client, seen) {
            Ok(true) => {
                let channel = match self.access_points.get(&bssid) {
                    Ok(access_point) => access_point.and_then(|ap| ap.channel),
                    Err(e) => {
                        self.store_failed("load access point", &e);
                        None
                    }
                };
                self.publish(Event::ClientFound(ClientFound {
                    client_addr: client,
                    bssid,
                    channel,
                }));
            }
            Ok(false) => {}
            Err(e) => self.store_failed("update client", &e),
        }
    }

    fn publish(&mut self, event: Event) {
        match self.sink.publish_event(&event) {
            Ok(()) => self.stats.events_published += 1,
            Err(e) => {
                self.stats.publish_errors += 1;
                warn!(topic = %event.topic(), "Failed to publish event: {}", e);
            }
        }
    }

    fn store_failed(&mut self, operation: &str, error: &Error) {
        self.stats.store_errors += 1;
        warn!(operation = %operation, "Store operation failed: {}", error);
    }

    fn encoding_failed(&mut self, addr: &MacAddr, error: &Error) {
        self.stats.encoding_errors += 1;
        debug!(addr = %addr, "Skipping frame: {}", error);
    }
}

/// The non-AP address of a frame: `addr1`, or `addr2` when `addr1` is the
/// access point itself or the broadcast address
fn client_address(frame: &Frame, bssid: MacAddr) -> Option<MacAddr> {
    match frame.addr1 {
        Some(addr1) if addr1 != bssid && !addr1.is_broadcast() => Some(addr1),
        _ => frame.addr2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airscope_core::event::{TOPIC_CLIENT_FOUND, TOPIC_SCAN, TOPIC_TARGET_FOUND, TOPIC_WEP_FOUND};
    use airscope_core::{MemorySink, MemoryStore};
    use airscope_packet::eapol::key_info;
    use airscope_packet::llc::{ETHERTYPE_ARP, ETHERTYPE_IPV4};
    use airscope_packet::{ArpPacket, FrameBuilder};
    use bytes::Bytes;
    use std::net::Ipv4Addr;
    use std::time::{Duration, SystemTime};

    const AP: MacAddr = MacAddr::new([0xaa; 6]);
    const STA: MacAddr = MacAddr::new([0xbb; 6]);

    struct Fixture {
        store: Arc<MemoryStore>,
        sink: Arc<MemorySink>,
        analyzer: Analyzer,
    }

    fn fixture(config: AnalyzerConfig) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let sink = Arc::new(MemorySink::new());
        let analyzer = Analyzer::new(config, store.clone(), sink.clone()).unwrap();
        Fixture {
            store,
            sink,
            analyzer,
        }
    }

    fn frame(builder: FrameBuilder) -> Frame {
        Frame::parse(Bytes::from(builder.build()), SystemTime::now(), None).unwrap()
    }

    #[test]
    fn test_client_address() {
        let uplink = frame(FrameBuilder::data(AP, STA, MacAddr::new([1; 6])).to_ds());
        assert_eq!(client_address(&uplink, AP), Some(STA));

        let downlink = frame(FrameBuilder::data(STA, AP, AP).from_ds());
        assert_eq!(client_address(&downlink, AP), Some(STA));

        let beacon = frame(FrameBuilder::beacon(AP));
        assert_eq!(client_address(&beacon, AP), Some(AP));
    }

    #[test]
    fn test_open_beacon_publishes_scan_once() {
        let mut f = fixture(AnalyzerConfig::default());
        let beacon = frame(FrameBuilder::beacon(AP).ssid("HomeNet").channel(6));

        assert_eq!(f.analyzer.process(&beacon), FrameClass::Beacon);
        f.analyzer.process(&beacon);

        assert_eq!(f.sink.payloads(TOPIC_SCAN).len(), 1);
        let ap = f.analyzer.access_points().get(&AP).unwrap().unwrap();
        assert_eq!(ap.ssid, "HomeNet");
        assert_eq!(ap.channel, Some(6));
        assert_eq!(ap.capability.as_deref(), Some("ESS"));
        // an access point is not its own client
        assert!(f.sink.payloads(TOPIC_CLIENT_FOUND).is_empty());
    }

    #[test]
    fn test_protected_beacon_is_not_scanned() {
        let mut f = fixture(AnalyzerConfig::default());
        f.analyzer
            .process(&frame(FrameBuilder::beacon(AP).ssid("Corp").privacy(true).rsn()));

        assert!(f.sink.payloads(TOPIC_SCAN).is_empty());
        let ap = f.analyzer.access_points().get(&AP).unwrap().unwrap();
        assert_eq!(ap.crypto_label(), "WPA2");
    }

    #[test]
    fn test_invalid_ssid_skips_access_point() {
        let mut f = fixture(AnalyzerConfig::default());
        f.analyzer
            .process(&frame(FrameBuilder::beacon(AP).ssid_bytes(&[0xff, 0xfe])));

        assert!(f.analyzer.access_points().get(&AP).unwrap().is_none());
        assert_eq!(f.analyzer.stats().encoding_errors, 1);
    }

    #[test]
    fn test_channel_counter_per_interface() {
        let mut f = fixture(AnalyzerConfig::live("wlan0mon"));
        let beacon = frame(FrameBuilder::beacon(AP).ssid("n").channel(11));
        f.analyzer.process(&beacon);
        f.analyzer.process(&beacon);

        assert_eq!(
            f.store.get("iface_wlan0mon_channel_11_count").unwrap().as_deref(),
            Some("2")
        );
    }

    #[test]
    fn test_no_channel_counter_offline() {
        let mut f = fixture(AnalyzerConfig::offline());
        f.analyzer
            .process(&frame(FrameBuilder::beacon(AP).ssid("n").channel(13)));

        let ap = f.analyzer.access_points().get(&AP).unwrap().unwrap();
        assert_eq!(ap.channel, Some(13));
        assert_eq!(f.store.len(), 2);
    }

    #[test]
    fn test_target_found_on_beacon() {
        let mut f = fixture(AnalyzerConfig::default());
        f.analyzer.access_points().mark_target(AP).unwrap();

        f.analyzer
            .process(&frame(FrameBuilder::beacon(AP).ssid("T").channel(3)));
        f.analyzer
            .process(&frame(FrameBuilder::probe_response(AP, STA).ssid("T").channel(3)));

        let payloads = f.sink.payloads(TOPIC_TARGET_FOUND);
        assert_eq!(payloads, vec![r#"{"bssid":"aa:aa:aa:aa:aa:aa","channel":3}"#]);
    }

    #[test]
    fn test_probe_response_registers_client() {
        let mut f = fixture(AnalyzerConfig::default());
        f.analyzer
            .process(&frame(FrameBuilder::probe_response(AP, STA).ssid("n").channel(1)));

        assert!(f.analyzer.clients().clients_of(&AP).unwrap().contains(&STA));
        assert_eq!(
            f.sink.payloads(TOPIC_CLIENT_FOUND),
            vec![r#"{"client_addr":"bb:bb:bb:bb:bb:bb","bssid":"aa:aa:aa:aa:aa:aa","channel":1}"#]
        );
    }

    #[test]
    fn test_wildcard_probe_not_recorded() {
        let mut f = fixture(AnalyzerConfig::default());
        f.analyzer
            .process(&frame(FrameBuilder::probe_request(STA, MacAddr::BROADCAST).ssid("")));

        assert!(f.analyzer.probes().latest(&STA).unwrap().is_none());
        assert!(f.analyzer.access_points().bssids().unwrap().is_empty());
    }

    #[test]
    fn test_directed_probe_without_access_point() {
        let mut f = fixture(AnalyzerConfig::default());
        f.analyzer
            .process(&frame(FrameBuilder::probe_request(STA, MacAddr::BROADCAST).ssid("Cafe")));

        let sighting = f.analyzer.probes().latest(&STA).unwrap().unwrap();
        assert_eq!(sighting.ssid, "Cafe");
        assert_eq!(sighting.access_point, None);
        assert_eq!(f.analyzer.probes().recent_networks().unwrap(), vec!["Cafe"]);
    }

    #[test]
    fn test_probed_networks_expire_every_window() {
        let mut config = AnalyzerConfig::default();
        config.probe_network_ttl = Duration::from_millis(20);
        let mut f = fixture(config);
        let probe = |ssid: &str| frame(FrameBuilder::probe_request(STA, MacAddr::BROADCAST).ssid(ssid));

        f.analyzer.process(&probe("Cafe"));
        std::thread::sleep(Duration::from_millis(50));
        assert!(f.analyzer.probes().recent_networks().unwrap().is_empty());

        f.analyzer.process(&probe("Office"));
        assert_eq!(f.analyzer.probes().recent_networks().unwrap(), vec!["Office"]);
        std::thread::sleep(Duration::from_millis(50));
        assert!(f.analyzer.probes().recent_networks().unwrap().is_empty());
    }

    #[test]
    fn test_eapol_collected_per_bssid() {
        let mut f = fixture(AnalyzerConfig::default());
        let eapol = frame(
            FrameBuilder::data(STA, AP, AP)
                .from_ds()
                .eapol_key(key_info::PAIRWISE | key_info::ACK),
        );

        assert_eq!(f.analyzer.process(&eapol), FrameClass::EapolKeyExchange);
        assert_eq!(f.analyzer.handshakes().exchange_for(&AP).len(), 1);
        assert_eq!(f.analyzer.stats().handshake_frames, 1);

        f.analyzer.reset();
        assert!(f.analyzer.handshakes().is_empty());
        assert_eq!(f.analyzer.stats().frames_seen, 0);
    }

    #[test]
    fn test_wep_plaintext_arp_request() {
        let mut f = fixture(AnalyzerConfig::default());
        let request = ArpPacket::new_request(STA, Ipv4Addr::new(10, 0, 0, 2), Ipv4Addr::new(10, 0, 0, 1));
        let wep = frame(
            FrameBuilder::data(AP, STA, MacAddr::BROADCAST)
                .to_ds()
                .wep_llc(ETHERTYPE_ARP, &request.serialize()),
        );

        assert_eq!(f.analyzer.process(&wep), FrameClass::WepData);
        assert_eq!(
            f.sink.payloads(TOPIC_WEP_FOUND),
            vec![r#"{"client_addr":"bb:bb:bb:bb:bb:bb","bssid":"aa:aa:aa:aa:aa:aa","arp":true}"#]
        );
    }

    #[test]
    fn test_wep_other_payload_has_no_arp_flag() {
        let mut f = fixture(AnalyzerConfig::default());
        let wep = frame(
            FrameBuilder::data(STA, AP, AP)
                .from_ds()
                .wep_llc(ETHERTYPE_IPV4, &[0x45; 60]),
        );
        f.analyzer.process(&wep);

        assert_eq!(
            f.sink.payloads(TOPIC_WEP_FOUND),
            vec![r#"{"client_addr":"bb:bb:bb:bb:bb:bb","bssid":"aa:aa:aa:aa:aa:aa"}"#]
        );
    }

    #[test]
    fn test_ignored_client_not_registered() {
        let monitor = MacAddr::new([0x02, 0, 0, 0, 0, 0x01]);
        let mut f = fixture(AnalyzerConfig::default().ignore_mac(monitor));
        f.analyzer
            .process(&frame(FrameBuilder::data(monitor, AP, AP).from_ds().payload(&[0; 8])));

        assert!(f.analyzer.clients().clients_of(&AP).unwrap().is_empty());
        assert!(f.sink.published().is_empty());
    }

    #[test]
    fn test_multicast_destination_not_a_client() {
        let mut f = fixture(AnalyzerConfig::default());
        let mdns = MacAddr::new([0x01, 0x00, 0x5e, 0x00, 0x00, 0xfb]);
        let ipv6 = MacAddr::new([0x33, 0x33, 0x00, 0x01, 0x00, 0x03]);
        f.analyzer
            .process(&frame(FrameBuilder::data(mdns, AP, STA).from_ds().payload(&[0; 8])));
        f.analyzer
            .process(&frame(FrameBuilder::data(ipv6, AP, STA).from_ds().payload(&[0; 8])));

        assert!(f.analyzer.clients().clients_of(&AP).unwrap().is_empty());
    }

    #[test]
    fn test_stop_requested() {
        let mut f = fixture(AnalyzerConfig::default());
        assert!(!f.analyzer.stop_requested());
        f.store.set(keys::STOP_ANALYZER, "False").unwrap();
        assert!(!f.analyzer.stop_requested());
        f.store.set(keys::STOP_ANALYZER, STOP_VALUE).unwrap();
        assert!(f.analyzer.stop_requested());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AnalyzerConfig {
            stop_key: String::new(),
            ..Default::default()
        };
        let result = Analyzer::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(MemorySink::new()),
        );
        assert!(result.is_err());
    }
}
