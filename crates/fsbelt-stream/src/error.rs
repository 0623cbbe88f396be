//! Error type shared by the stream transforms.

use thiserror::Error;

/// Errors from encryption, compression, encoding, and archiving.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An empty passphrase cannot derive a key.
    #[error("Passphrase cannot be empty")]
    EmptyPassphrase,

    /// The encrypted input ended before a full IV could be read.
    #[error("Encrypted input ended before the {expected}-byte IV")]
    MissingIv { expected: usize },

    /// Strict base64 decoding failed.
    #[error("Base64 decode failed: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Robust base64 decoding failed with every known alphabet.
    #[error("Base64 decode failed with every known alphabet")]
    Base64Exhausted,

    /// A tar package needs at least one input path.
    #[error("No input paths provided")]
    NoInputs,
}
