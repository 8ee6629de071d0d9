use airscope_analyzer::{Analyzer, AnalyzerConfig, RunSummary, STOP_VALUE};
use airscope_capture::{
    filters, interface_mac, list_interfaces, CaptureConfig, FrameSource, LiveCapture,
    OfflineCapture,
};
use airscope_cli::{archive_capture, Cli, Commands};
use airscope_core::{keys, KeyValueStore, MemoryStore, Result, TracingSink};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Interfaces { wireless } => show_interfaces(wireless),
        Commands::Live {
            interface,
            monitor,
            filter,
            world,
            duration,
            no_channel_counters,
        } => run_live(
            &interface,
            monitor,
            filter,
            world,
            duration.map(Duration::from_secs),
            !no_channel_counters,
        ),
        Commands::Offline {
            file,
            handshake_dir,
        } => run_offline(&file, handshake_dir.as_deref()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn show_interfaces(wireless_only: bool) -> Result<()> {
    let interfaces = list_interfaces()?;
    for iface in interfaces
        .iter()
        .filter(|iface| !wireless_only || iface.looks_wireless())
    {
        let mac = iface
            .mac
            .map(|mac| mac.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<16} {:<17} {:<4} {}",
            iface.name,
            mac,
            if iface.is_up { "up" } else { "down" },
            iface.description
        );
    }
    Ok(())
}

fn run_live(
    interface: &str,
    monitor: bool,
    filter: Option<String>,
    world: bool,
    duration: Option<Duration>,
    count_channels: bool,
) -> Result<()> {
    let mut config = AnalyzerConfig::live(interface);
    config.world_channels = world;
    config.count_channels = count_channels;
    match interface_mac(interface) {
        Ok(Some(mac)) => config = config.ignore_mac(mac),
        Ok(None) => warn!(interface = %interface, "Interface has no MAC address"),
        Err(e) => warn!(interface = %interface, "Could not read interface MAC: {}", e),
    }

    let capture_config = CaptureConfig {
        monitor_mode: monitor,
        filter: Some(filter.unwrap_or_else(filters::analyzer_filter)),
        ..Default::default()
    };
    let mut source = LiveCapture::new(interface, capture_config)?;

    let store = Arc::new(MemoryStore::new());
    let mut analyzer = Analyzer::new(config, store.clone(), Arc::new(TracingSink))?;

    if let Some(duration) = duration {
        let lifecycle = source.lifecycle();
        let stop_key = analyzer.config().stop_key.clone();
        thread::spawn(move || {
            thread::sleep(duration);
            if let Err(e) = store.set(&stop_key, STOP_VALUE) {
                warn!("Failed to set stop flag: {}", e);
            }
            // the capture may be waiting for traffic
            lifecycle.request_stop();
        });
    }

    let summary = analyzer.run(&mut source)?;
    report(&summary);
    Ok(())
}

fn run_offline(file: &Path, handshake_dir: Option<&Path>) -> Result<()> {
    let mut source = OfflineCapture::open(file)?;
    let store = Arc::new(MemoryStore::new());
    let mut analyzer = Analyzer::new(AnalyzerConfig::offline(), store.clone(), Arc::new(TracingSink))?;

    let summary = analyzer.run(&mut source)?;
    report(&summary);

    let access_points = store.members(keys::ACCESS_POINTS)?;
    info!(source = %source.name(), access_points = access_points.len(), "Replay complete");

    if summary.has_handshakes() {
        for bssid in &summary.handshake_bssids {
            info!(
                bssid = %bssid,
                frames = analyzer.handshakes().exchange_for(bssid).len(),
                "Possible handshake"
            );
        }
        if let Some(dir) = handshake_dir {
            archive_capture(file, dir)?;
        }
    }
    Ok(())
}

fn report(summary: &RunSummary) {
    println!("{}", summary.capture.format());
    println!("{}", summary.stats.format());
    if summary.stopped_by_request {
        println!("Stopped on request");
    }
}
