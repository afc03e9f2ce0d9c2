//! Error types for the messaging crate

use thiserror::Error;

/// Transport-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Send failed: {0}")]
    Send(String),

    #[error("Channel closed")]
    ChannelClosed,

    #[error("Timeout waiting for {missing} replies to '{tag}'")]
    Timeout { tag: String, missing: usize },
}

pub type Result<T> = std::result::Result<T, TransportError>;
