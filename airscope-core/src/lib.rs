//! Airscope Core Library
//!
//! This crate provides the fundamental types, error handling and the two
//! external collaborator interfaces of the airscope analyzer: the key-value
//! store that holds access point and client state, and the event sink that
//! receives published discoveries.

pub mod error;
pub mod event;
pub mod packet;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use event::{Event, EventSink, MemorySink, TracingSink};
pub use packet::{LinkType, Packet};
pub use store::{keys, load_json, save_json, KeyValueStore, MemoryStore};
pub use types::*;
