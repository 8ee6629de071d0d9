//! Access point registry
//!
//! Records live in the shared store as JSON under `access_point_<bssid>`,
//! and every BSSID is added to the `access_points` set. Observations are
//! merged, never written over: the SSID only goes from empty to non-empty,
//! crypto is a union, and `hidden` only ever becomes true. Two analyzers
//! applying the same observation concurrently therefore converge.

use airscope_core::{
    crypto_label, keys, load_json, save_json, Channel, CryptoSet, KeyValueStore, MacAddr, Result,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// A discovered access point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPoint {
    pub bssid: MacAddr,
    #[serde(default)]
    pub ssid: String,
    #[serde(default)]
    pub channel: Option<Channel>,
    #[serde(default)]
    pub crypto: CryptoSet,
    /// SSID was recovered from a probe request
    #[serde(default)]
    pub hidden: bool,
    /// Capability field as text (`ESS+privacy`)
    #[serde(default)]
    pub capability: Option<String>,
    /// Marked as a target by an external controller
    #[serde(default)]
    pub target: bool,
}

/// Partial information about an access point from a single frame
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApObservation {
    pub ssid: Option<String>,
    pub channel: Option<Channel>,
    pub crypto: CryptoSet,
    pub capability: Option<String>,
    /// The SSID comes from a probe request rather than a beacon
    pub from_probe: bool,
}

/// What changed when an observation was merged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// The record did not exist before
    pub created: bool,
    /// The SSID went from empty to non-empty
    pub ssid_learned: bool,
    /// Crypto labels that were not known before
    pub crypto_added: CryptoSet,
    /// Anything at all was written
    pub changed: bool,
}

impl AccessPoint {
    /// Fresh record with default fields
    pub fn new(bssid: MacAddr) -> Self {
        Self {
            bssid,
            ssid: String::new(),
            channel: None,
            crypto: CryptoSet::new(),
            hidden: false,
            capability: None,
            target: false,
        }
    }

    /// Merge an observation into this record
    pub fn merge(&mut self, observation: &ApObservation) -> MergeOutcome {
        let before = self.clone();
        let mut outcome = MergeOutcome::default();

        if let Some(ssid) = observation.ssid.as_deref().filter(|s| !s.is_empty()) {
            if self.ssid.is_empty() {
                self.ssid = ssid.to_string();
                outcome.ssid_learned = true;
                if observation.from_probe {
                    self.hidden = true;
                }
            }
        }

        outcome.crypto_added = observation
            .crypto
            .difference(&self.crypto)
            .copied()
            .collect();
        self.crypto.extend(observation.crypto.iter().copied());

        if observation.channel.is_some() {
            self.channel = observation.channel;
        }
        if observation.capability.is_some() {
            self.capability = observation.capability.clone();
        }

        outcome.changed = *self != before;
        outcome
    }

    /// Comma-separated crypto labels
    pub fn crypto_label(&self) -> String {
        crypto_label(&self.crypto)
    }
}

/// Store-backed registry of access points
#[derive(Clone)]
pub struct AccessPointRegistry {
    store: Arc<dyn KeyValueStore>,
}

impl AccessPointRegistry {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load or create the record, merge the observation and persist it
    pub fn observe(
        &self,
        bssid: MacAddr,
        observation: &ApObservation,
    ) -> Result<(AccessPoint, MergeOutcome)> {
        let key = keys::access_point(&bssid);
        let existing: Option<AccessPoint> = load_json(self.store.as_ref(), &key)?;
        let created = existing.is_none();
        let mut access_point = existing.unwrap_or_else(|| AccessPoint::new(bssid));

        let mut outcome = access_point.merge(observation);
        outcome.created = created;

        if created || outcome.changed {
            save_json(self.store.as_ref(), &key, &access_point)?;
        }
        if created {
            self.store.add_to_set(keys::ACCESS_POINTS, &bssid.to_string())?;
            info!(
                bssid = %bssid,
                ssid = %access_point.ssid,
                crypto = %access_point.crypto_label(),
                "New access point"
            );
        } else if outcome.ssid_learned {
            info!(
                bssid = %bssid,
                ssid = %access_point.ssid,
                hidden = access_point.hidden,
                "Learned SSID of access point"
            );
        } else if outcome.changed {
            debug!(bssid = %bssid, "Updated access point");
        }

        Ok((access_point, outcome))
    }

    /// Look up a record
    pub fn get(&self, bssid: &MacAddr) -> Result<Option<AccessPoint>> {
        load_json(self.store.as_ref(), &keys::access_point(bssid))
    }

    /// Mark an access point as a target, creating the record if needed
    pub fn mark_target(&self, bssid: MacAddr) -> Result<AccessPoint> {
        let key = keys::access_point(&bssid);
        let mut access_point: AccessPoint = match load_json(self.store.as_ref(), &key)? {
            Some(existing) => existing,
            None => {
                self.store.add_to_set(keys::ACCESS_POINTS, &bssid.to_string())?;
                AccessPoint::new(bssid)
            }
        };
        access_point.target = true;
        save_json(self.store.as_ref(), &key, &access_point)?;
        info!(bssid = %bssid, "Access point marked as target");
        Ok(access_point)
    }

    /// Every known BSSID
    pub fn bssids(&self) -> Result<Vec<MacAddr>> {
        Ok(self
            .store
            .members(keys::ACCESS_POINTS)?
            .iter()
            .filter_map(|member| member.parse().ok())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use airscope_core::{Crypto, MemoryStore};

    const AP: MacAddr = MacAddr::new([0xaa; 6]);

    fn registry() -> (Arc<MemoryStore>, AccessPointRegistry) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), AccessPointRegistry::new(store))
    }

    fn beacon(ssid: &str, crypto: &[Crypto], channel: Option<Channel>) -> ApObservation {
        ApObservation {
            ssid: Some(ssid.to_string()),
            channel,
            crypto: crypto.iter().copied().collect(),
            capability: Some("ESS".to_string()),
            from_probe: false,
        }
    }

    #[test]
    fn test_create_and_get() {
        let (store, registry) = registry();
        assert!(registry.get(&AP).unwrap().is_none());

        let (ap, outcome) = registry
            .observe(AP, &beacon("HomeNet", &[Crypto::Opn], Some(6)))
            .unwrap();
        assert!(outcome.created);
        assert!(outcome.ssid_learned);
        assert_eq!(ap.ssid, "HomeNet");
        assert_eq!(ap.channel, Some(6));
        assert!(!ap.hidden);

        assert_eq!(registry.get(&AP).unwrap(), Some(ap));
        assert_eq!(registry.bssids().unwrap(), vec![AP]);
        assert!(store.get("access_point_aa:aa:aa:aa:aa:aa").unwrap().is_some());
    }

    #[test]
    fn test_ssid_never_overwritten() {
        let (_, registry) = registry();
        registry.observe(AP, &beacon("X", &[Crypto::Opn], None)).unwrap();
        let (ap, _) = registry.observe(AP, &beacon("", &[], None)).unwrap();
        assert_eq!(ap.ssid, "X");
        let (ap, _) = registry.observe(AP, &beacon("Y", &[], None)).unwrap();
        assert_eq!(ap.ssid, "X");
    }

    #[test]
    fn test_crypto_union() {
        let (_, registry) = registry();
        registry.observe(AP, &beacon("net", &[Crypto::Wep], None)).unwrap();
        let (ap, outcome) = registry
            .observe(AP, &beacon("net", &[Crypto::Wpa2], None))
            .unwrap();
        assert_eq!(ap.crypto_label(), "WEP,WPA2");
        assert_eq!(outcome.crypto_added.len(), 1);
        assert!(outcome.crypto_added.contains(&Crypto::Wpa2));
    }

    #[test]
    fn test_observe_is_idempotent() {
        let (_, once) = registry();
        let (_, twice) = registry();
        let obs = beacon("net", &[Crypto::Wpa], Some(3));

        let (a, _) = once.observe(AP, &obs).unwrap();
        twice.observe(AP, &obs).unwrap();
        let (b, outcome) = twice.observe(AP, &obs).unwrap();
        assert_eq!(a, b);
        assert!(!outcome.changed);
        assert!(!outcome.created);
    }

    #[test]
    fn test_latest_channel_wins_but_none_keeps() {
        let (_, registry) = registry();
        registry.observe(AP, &beacon("n", &[], Some(1))).unwrap();
        registry.observe(AP, &beacon("n", &[], Some(11))).unwrap();
        let (ap, _) = registry.observe(AP, &beacon("n", &[], None)).unwrap();
        assert_eq!(ap.channel, Some(11));
    }

    #[test]
    fn test_hidden_from_probe() {
        let (_, registry) = registry();
        registry.observe(AP, &beacon("", &[Crypto::Wpa2], None)).unwrap();

        let probe = ApObservation {
            ssid: Some("Hidden".to_string()),
            from_probe: true,
            ..Default::default()
        };
        let (ap, outcome) = registry.observe(AP, &probe).unwrap();
        assert!(outcome.ssid_learned);
        assert_eq!(ap.ssid, "Hidden");
        assert!(ap.hidden);

        // a later beacon never clears the flag
        let (ap, _) = registry.observe(AP, &beacon("", &[Crypto::Wpa2], None)).unwrap();
        assert!(ap.hidden);
    }

    #[test]
    fn test_probe_for_named_network_is_not_hidden() {
        let (_, registry) = registry();
        registry.observe(AP, &beacon("Visible", &[Crypto::Opn], None)).unwrap();
        let probe = ApObservation {
            ssid: Some("Visible".to_string()),
            from_probe: true,
            ..Default::default()
        };
        let (ap, _) = registry.observe(AP, &probe).unwrap();
        assert!(!ap.hidden);
    }

    #[test]
    fn test_mark_target() {
        let (_, registry) = registry();
        let ap = registry.mark_target(AP).unwrap();
        assert!(ap.target);

        let (ap, _) = registry.observe(AP, &beacon("T", &[Crypto::Opn], None)).unwrap();
        assert!(ap.target);
        assert_eq!(registry.bssids().unwrap(), vec![AP]);
    }

    #[test]
    fn test_record_json_layout() {
        let mut ap = AccessPoint::new(AP);
        ap.crypto.insert(Crypto::Opn);
        let json = serde_json::to_value(&ap).unwrap();
        assert_eq!(json["bssid"], "aa:aa:aa:aa:aa:aa");
        assert_eq!(json["crypto"], serde_json::json!(["OPN"]));
        assert_eq!(json["hidden"], false);

        // older records without the optional fields still load
        let minimal: AccessPoint = serde_json::from_str(r#"{"bssid":"aa:aa:aa:aa:aa:aa"}"#).unwrap();
        assert_eq!(minimal, AccessPoint::new(AP));
    }
}
