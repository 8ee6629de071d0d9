//! Example: Replay a capture file and print a line per frame
//!
//! Run with: cargo run --example replay -- capture.pcap

use airscope_capture::{FrameSource, OfflineCapture};
use airscope_packet::element_id;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .ok_or("usage: replay <capture.pcap>")?;

    let mut source = OfflineCapture::open(&path)?;
    let mut count = 0;

    while let Some(frame) = source.next_frame()? {
        count += 1;
        let ssid = frame
            .element(element_id::SSID)
            .map(|e| String::from_utf8_lossy(&e.data).into_owned())
            .unwrap_or_default();
        println!(
            "[{}] {:?}/{} bssid={} signal={} {}",
            count,
            frame.frame_type(),
            frame.subtype(),
            frame
                .bssid()
                .map(|b| b.to_string())
                .unwrap_or_else(|| "-".to_string()),
            frame
                .signal_dbm
                .map(|s| format!("{}dBm", s))
                .unwrap_or_else(|| "-".to_string()),
            ssid
        );
    }

    println!("\n=== Statistics ===");
    println!("{}", source.stats().format());

    Ok(())
}
