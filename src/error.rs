//! Error types for the streaming engine

use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Container encoding errors
///
/// These indicate a corrupted container session and are fatal for the
/// current stream; the caller should reset or disconnect.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Container session initialization failed: {0}")]
    SessionInit(String),

    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Unsupported bit depth: {0}")]
    UnsupportedBitDepth(u16),
}

/// Transport errors
///
/// Connectivity faults are reported through the event channel and are
/// never fatal; the session reconnects on its own.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Publish failed: {0}")]
    PublishFailed(String),

    #[error("Subscribe failed: {0}")]
    SubscribeFailed(String),

    #[error("Invalid feedback payload: {0}")]
    InvalidFeedback(String),
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, Error>;
