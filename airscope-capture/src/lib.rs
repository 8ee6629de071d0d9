//! Frame sources for airscope
//!
//! This crate turns captured traffic into a stream of decoded 802.11 frames.
//!
//! ## Features
//!
//! - **Live capture**: pcap on a monitor-mode interface, with a
//!   Idle -> Capturing -> Stopping -> Stopped lifecycle
//! - **Offline replay**: pcap files or in-memory packet lists
//! - **BPF Filters**: default 802.11 capture filter
//! - **Statistics**: received, malformed and dropped packet counters
//!
//! ## Example
//!
//! ```no_run
//! use airscope_capture::{FrameSource, OfflineCapture};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut source = OfflineCapture::open("capture.pcap")?;
//! while let Some(frame) = source.next_frame()? {
//!     println!("{:?} from {:?}", frame.frame_type(), frame.addr2);
//! }
//! println!("{}", source.stats().format());
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod filters;
pub mod interface;
pub mod offline;
pub mod source;
pub mod stats;

// Re-export main types
pub use capture::{CaptureConfig, CaptureLifecycle, CaptureState, LiveCapture};
pub use interface::{
    get_interface, interface_mac, list_interfaces, list_wireless_interfaces, InterfaceInfo,
};
pub use offline::OfflineCapture;
pub use source::FrameSource;
pub use stats::{CaptureStats, StatsAccumulator};
