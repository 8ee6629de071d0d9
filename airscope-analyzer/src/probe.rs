//! Probe request sightings

use airscope_core::{keys, load_json, save_json, KeyValueStore, MacAddr, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// A network a client asked for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeSighting {
    pub ssid: String,
    pub client: MacAddr,
    /// Access point the probe was addressed to; `None` for wildcard probes
    pub access_point: Option<MacAddr>,
}

/// Latest probe per client plus the set of recently probed networks
#[derive(Clone)]
pub struct ProbeLog {
    store: Arc<dyn KeyValueStore>,
}

impl ProbeLog {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Put an expiry on the probed-networks set
    pub fn expire_networks(&self, ttl: Duration) -> Result<bool> {
        self.store.expire(keys::LAST_SEEN_PROBE_NETWORKS, ttl)
    }

    /// Store a sighting, replacing the client's previous one
    pub fn record(&self, sighting: &ProbeSighting) -> Result<()> {
        save_json(
            self.store.as_ref(),
            &keys::probe_ssid(&sighting.client),
            sighting,
        )?;
        self.store
            .add_to_set(keys::LAST_SEEN_PROBE_NETWORKS, &sighting.ssid)?;
        debug!(client = %sighting.client, ssid = %sighting.ssid, "Probe request");
        Ok(())
    }

    /// Latest sighting of a client
    pub fn latest(&self, client: &MacAddr) -> Result<Option<ProbeSighting>> {
        load_json(self.store.as_ref(), &keys::probe_ssid(client))
    }

    /// SSIDs probed recently
    pub fn recent_networks(&self) -> Result<Vec<String>> {
        self.store.members(keys::LAST_SEEN_PROBE_NETWORKS)
    }
}
