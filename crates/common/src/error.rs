//! Common error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("USB error: {0}")]
    Usb(String),

    #[error("USB transfer to hub {hub} port {port} failed: {source}")]
    DeviceIo {
        /// Human-readable hub identity, e.g. "2109:0813 (bus 002, addr 005)"
        hub: String,
        port: u8,
        #[source]
        source: rusb::Error,
    },

    #[error("Save file error: {0}")]
    State(#[from] record::RecordError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Event source error: {0}")]
    EventSource(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
