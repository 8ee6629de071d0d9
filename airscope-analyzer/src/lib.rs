//! Airscope Analyzer
//!
//! Passive analysis of 802.11 traffic. Frames are classified and the
//! analyzer keeps a registry of access points, the clients seen with each
//! of them, the networks clients probe for, and the EAPOL frames of
//! authentication exchanges. State lives in a shared key-value store so
//! other processes can read it; discoveries are published as events.
//!
//! # Example
//!
//! ```no_run
//! use airscope_analyzer::{Analyzer, AnalyzerConfig};
//! use airscope_capture::OfflineCapture;
//! use airscope_core::{MemoryStore, TracingSink};
//! use std::sync::Arc;
//!
//! # fn main() -> airscope_core::Result<()> {
//! let mut source = OfflineCapture::open("capture.pcap")?;
//! let mut analyzer = Analyzer::new(
//!     AnalyzerConfig::offline(),
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(TracingSink),
//! )?;
//! let summary = analyzer.run(&mut source)?;
//! println!("{}", summary.stats.format());
//! # Ok(())
//! # }
//! ```

pub mod access_point;
pub mod analyzer;
pub mod channel;
pub mod classify;
pub mod client;
pub mod config;
pub mod crypto;
pub mod handshake;
pub mod probe;
pub mod stats;

pub use access_point::{AccessPoint, AccessPointRegistry, ApObservation, MergeOutcome};
pub use analyzer::{Analyzer, STOP_VALUE};
pub use channel::frame_channel;
pub use classify::{classify, FrameClass};
pub use client::ClientRegistry;
pub use config::AnalyzerConfig;
pub use crypto::{decode_ssid, detect_crypto, frame_ssid};
pub use handshake::HandshakeTracker;
pub use probe::{ProbeLog, ProbeSighting};
pub use stats::{AnalyzerStats, RunSummary};
