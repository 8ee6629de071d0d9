//! Client registry

use airscope_core::{keys, KeyValueStore, MacAddr, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Store-backed set of clients per access point, with last-seen times
#[derive(Clone)]
pub struct ClientRegistry {
    store: Arc<dyn KeyValueStore>,
}

impl ClientRegistry {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Record a sighting; returns true the first time the pair is seen
    ///
    /// Broadcast addresses and an access point's own address are never
    /// stored as clients.
    pub fn observe(&self, bssid: MacAddr, client: MacAddr, seen: DateTime<Utc>) -> Result<bool> {
        if client.is_broadcast() || bssid.is_broadcast() || client == bssid {
            return Ok(false);
        }

        let added = self
            .store
            .add_to_set(&keys::clients(&bssid), &client.to_string())?;
        self.store
            .set(&keys::client_last_seen(&bssid, &client), &seen.to_rfc3339())?;

        if added {
            info!(bssid = %bssid, client = %client, "New client");
        } else {
            debug!(bssid = %bssid, client = %client, "Client seen again");
        }
        Ok(added)
    }

    /// Clients recorded for an access point
    pub fn clients_of(&self, bssid: &MacAddr) -> Result<BTreeSet<MacAddr>> {
        Ok(self
            .store
            .members(&keys::clients(bssid))?
            .iter()
            .filter_map(|member| member.parse().ok())
            .collect())
    }

    /// Last time a client was seen with an access point
    pub fn last_seen(&self, bssid: &MacAddr, client: &MacAddr) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .store
            .get(&keys::client_last_seen(bssid, client))?
            .and_then(|text| DateTime::parse_from_rfc3339(&text).ok())
            .map(|time| time.with_timezone(&Utc)))
    }
}
