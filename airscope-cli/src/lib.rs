//! CLI interface for airscope
//!
//! This crate provides the command-line interface for airscope,
//! including argument parsing and capture file archiving.

pub mod archive;
pub mod args;

pub use archive::{archive_capture, incremental_path};
pub use args::{Cli, Commands};
