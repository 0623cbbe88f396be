//! Core types and codecs for fsbelt.
//!
//! This crate provides the fundamental data structures shared across the
//! fsbelt tool belt: filesystem entities, scan options and results, byte
//! formatting, and the streaming JSON codecs used at the CLI boundary.

mod bytes;
mod config;
mod entity;
mod error;
mod outcome;
mod sjson;

pub use bytes::pretty_bytes;
pub use config::{ScanOptions, ScanOptionsBuilder};
pub use entity::{EntityId, EntityKind, FsEntity};
pub use error::ScanError;
pub use outcome::{ScanOutcome, ScanStats};
pub use sjson::{
    DelimitedReader, DelimitedWriter, LengthPrefixReader, LengthPrefixWriter, SjsonError,
    write_entity_stream,
};
