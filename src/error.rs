//! # Error Types
//!
//! Custom error types for Pendant Bridge using `thiserror`.
//!
//! The jog core itself is fire-and-forget and has no error channel of its
//! own; errors only arise at the configuration and I/O surfaces.

use thiserror::Error;

/// Main error type for Pendant Bridge
#[derive(Debug, Error)]
pub enum PendantBridgeError {
    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Pendant Bridge
pub type Result<T> = std::result::Result<T, PendantBridgeError>;
