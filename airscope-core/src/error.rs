//! Error types for airscope

use thiserror::Error;

/// Result type alias for airscope operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for airscope
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Capture device or capture file error
    #[error("Frame capture error: {0}")]
    Capture(String),

    /// Frame could not be decoded
    #[error("Frame parsing error: {0}")]
    FrameParsing(String),

    /// Text field (SSID, element payload) could not be decoded
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Key-value store failure
    #[error("Store error: {0}")]
    Store(String),

    /// Event sink failure
    #[error("Publish error on topic '{topic}': {reason}")]
    Publish { topic: String, reason: String },

    /// Interface not found
    #[error("Interface '{0}' not found")]
    InterfaceNotFound(String),

    /// Invalid MAC address text
    #[error("Invalid MAC address: {0}")]
    InvalidMac(String),

    /// Invalid configuration value
    #[error("Invalid configuration '{name}': {reason}")]
    InvalidConfig { name: String, reason: String },

    /// Invalid state transition
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Operation interrupted
    #[error("Operation interrupted: {0}")]
    Interrupted(String),
}

impl Error {
    /// Create a frame parsing error with a custom message
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Error::FrameParsing(msg.into())
    }

    /// Create a store error with a custom message
    pub fn store<S: Into<String>>(msg: S) -> Self {
        Error::Store(msg.into())
    }

    /// Create a publish error
    pub fn publish<S: Into<String>>(topic: S, reason: S) -> Self {
        Error::Publish {
            topic: topic.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config<S: Into<String>>(name: S, reason: S) -> Self {
        Error::InvalidConfig {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Store(format!("invalid record: {}", err))
    }
}
