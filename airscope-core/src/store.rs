//! Key-value store abstraction
//!
//! Every piece of access point and client state lives behind
//! [`KeyValueStore`]. Several analyzers (one per monitored interface) may share
//! a single store; the store guarantees atomicity of each individual call and
//! nothing more, so callers merge instead of overwriting.
//!
//! [`MemoryStore`] is the in-process implementation, backed by a `DashMap`.
//! An external store (Redis or similar) only has to implement the trait.

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use crate::{Error, Result};

/// Operations the analyzer needs from a shared key-value store
pub trait KeyValueStore: Send + Sync {
    /// Read a string value
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a string value, clearing any expiry
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Add a member to a set; returns true if the member was not present
    fn add_to_set(&self, key: &str, member: &str) -> Result<bool>;

    /// All members of a set (empty when the key is absent)
    fn members(&self, key: &str) -> Result<Vec<String>>;

    /// Expire a key after `ttl`; returns false if the key does not exist
    fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Increment an integer counter, creating it at zero
    fn incr(&self, key: &str) -> Result<i64>;

    /// Remove a key; returns true if it existed
    fn delete(&self, key: &str) -> Result<bool>;
}

/// Deterministic key names derived from entity identifiers
pub mod keys {
    use crate::{Channel, MacAddr};

    /// Set of every BSSID ever observed
    pub const ACCESS_POINTS: &str = "access_points";

    /// Set of SSIDs seen in recent probe requests
    pub const LAST_SEEN_PROBE_NETWORKS: &str = "last_seen_probe_networks";

    /// Cooperative stop flag; `"True"` requests a stop
    pub const STOP_ANALYZER: &str = "stop_analyzer";

    /// JSON access point record
    pub fn access_point(bssid: &MacAddr) -> String {
        format!("access_point_{}", bssid)
    }

    /// Set of clients of an access point
    pub fn clients(bssid: &MacAddr) -> String {
        format!("clients_{}", bssid)
    }

    /// Last time a client was seen talking to an access point
    pub fn client_last_seen(bssid: &MacAddr, client: &MacAddr) -> String {
        format!("access_point_{}_client_{}_last_seen", bssid, client)
    }

    /// Latest probe sighting of a client
    pub fn probe_ssid(client: &MacAddr) -> String {
        format!("ssid_{}", client)
    }

    /// Per-interface channel sighting counter
    pub fn channel_count(iface: &str, channel: Channel) -> String {
        format!("iface_{}_channel_{}_count", iface, channel)
    }
}

/// Load a JSON record
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

/// Save a JSON record
pub fn save_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let text = serde_json::to_string(value)?;
    store.set(key, &text)
}

#[derive(Debug, Clone)]
enum Value {
    Str(String),
    Set(BTreeSet<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: Value) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map_or(false, |deadline| deadline <= now)
    }
}

fn wrong_type(key: &str) -> Error {
    Error::store(format!("key '{}' holds the wrong kind of value", key))
}

/// In-process store backed by a `DashMap`
///
/// Expired keys are dropped lazily on the next access.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| !e.is_expired(now)).count()
    }

    /// Check if the store holds no live keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn purge(&self, key: &str) {
        let now = Instant::now();
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.purge(key);
        match self.entries.get(key) {
            Some(entry) => match &entry.value {
                Value::Str(text) => Ok(Some(text.clone())),
                Value::Set(_) => Err(wrong_type(key)),
            },
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .insert(key.to_string(), Entry::new(Value::Str(value.to_string())));
        Ok(())
    }

    fn add_to_set(&self, key: &str, member: &str) -> Result<bool> {
        self.purge(key);
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::Set(BTreeSet::new())));
        match &mut entry.value {
            Value::Set(set) => Ok(set.insert(member.to_string())),
            Value::Str(_) => Err(wrong_type(key)),
        }
    }

    fn members(&self, key: &str) -> Result<Vec<String>> {
        self.purge(key);
        match self.entries.get(key) {
            Some(entry) => match &entry.value {
                Value::Set(set) => Ok(set.iter().cloned().collect()),
                Value::Str(_) => Err(wrong_type(key)),
            },
            None => Ok(Vec::new()),
        }
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.purge(key);
        match self.entries.get_mut(key) {
            Some(mut entry) => {
                entry.expires_at = Some(Instant::now() + ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn incr(&self, key: &str) -> Result<i64> {
        self.purge(key);
        let mut entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Value::Str("0".to_string())));
        match &mut entry.value {
            Value::Str(text) => {
                let current: i64 = text
                    .parse()
                    .map_err(|_| Error::store(format!("key '{}' is not an integer", key)))?;
                let next = current
                    .checked_add(1)
                    .ok_or_else(|| Error::store(format!("key '{}' would overflow", key)))?;
                *text = next.to_string();
                Ok(next)
            }
            Value::Set(_) => Err(wrong_type(key)),
        }
    }

    fn delete(&self, key: &str) -> Result<bool> {
        self.purge(key);
        Ok(self.entries.remove(key).is_some())
    }
}
