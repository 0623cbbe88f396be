//! Stream transforms for fsbelt.
//!
//! # Overview
//!
//! Four composable transforms over `std::io` streams:
//!
//! - AES-256-OFB encryption with a passphrase-derived key and a random
//!   IV prefix ([`EncryptingWriter`] / [`DecryptingReader`]).
//! - Gzip compression with optional header name and comment.
//! - Base64 with both alphabets, padded or not, plus a robust decoder
//!   that tries every alphabet.
//! - Tar packaging that layers gzip and encryption around the archive.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::fs::File;
//! use fsbelt_stream::{GzipLevel, PackOptions, pack};
//!
//! let output = File::create("backup.tar.gz.enc")?;
//! let options = PackOptions {
//!     gzip: Some(GzipLevel::Best),
//!     passphrase: Some(b"correct horse".to_vec()),
//! };
//! pack(&["/var/log".into()], output, &options)?;
//! # Ok::<(), fsbelt_stream::StreamError>(())
//! ```

mod archive;
mod b64;
mod crypt;
mod error;
mod gzip;

pub use archive::{PackOptions, pack, unpack};
pub use b64::{decode, encode, robust_decode};
pub use crypt::{DecryptingReader, EncryptingWriter, IV_LEN, decrypt, encrypt};
pub use error::StreamError;
pub use gzip::{GzipHeader, GzipLevel, compress, decompress};
