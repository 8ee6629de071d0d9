//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "airscope")]
#[command(version, about = "Passive 802.11 frame analyzer", long_about = None)]
pub struct Cli {
    /// Verbose output (-v, -vv, -vvv for increasing verbosity)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available network interfaces
    Interfaces {
        /// Only show interfaces that look wireless
        #[arg(short, long)]
        wireless: bool,
    },

    /// Analyze traffic on a monitor-mode interface
    Live {
        /// Network interface name (e.g. wlan0mon)
        #[arg(short, long)]
        interface: String,

        /// Ask libpcap to enable monitor mode
        #[arg(short, long)]
        monitor: bool,

        /// BPF filter expression (defaults to management and data frames)
        #[arg(short, long, value_name = "EXPR")]
        filter: Option<String>,

        /// Accept channels 12 and 13
        #[arg(short, long)]
        world: bool,

        /// Stop after this many seconds
        #[arg(short, long, value_name = "SECONDS")]
        duration: Option<u64>,

        /// Do not maintain per-interface channel counters
        #[arg(long)]
        no_channel_counters: bool,
    },

    /// Analyze a capture file
    Offline {
        /// pcap file to replay
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Copy the file here when handshake frames were captured
        #[arg(long, value_name = "DIR")]
        handshake_dir: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Default log level for the verbosity count
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
