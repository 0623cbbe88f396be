//! Gzip compression and decompression.

use std::io::{self, Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::{Compression, GzBuilder};
use tracing::debug;

use crate::error::StreamError;

/// Compression level presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GzipLevel {
    /// Store without compression.
    None,
    /// Fastest compression.
    Fast,
    /// Balanced default.
    #[default]
    Default,
    /// Smallest output.
    Best,
}

impl GzipLevel {
    fn to_compression(self) -> Compression {
        match self {
            GzipLevel::None => Compression::none(),
            GzipLevel::Fast => Compression::fast(),
            GzipLevel::Default => Compression::default(),
            GzipLevel::Best => Compression::best(),
        }
    }
}

/// Optional gzip header fields carried in the compressed stream.
#[derive(Debug, Clone, Default)]
pub struct GzipHeader {
    /// Original file name.
    pub name: Option<String>,
    /// Free-form comment.
    pub comment: Option<String>,
}

/// Build a compressing writer over `output`.
pub fn writer<W: Write>(output: W, level: GzipLevel, header: &GzipHeader) -> GzEncoder<W> {
    let mut builder = GzBuilder::new();
    if let Some(name) = &header.name {
        builder = builder.filename(name.as_str());
    }
    if let Some(comment) = &header.comment {
        builder = builder.comment(comment.as_str());
    }
    builder.write(output, level.to_compression())
}

/// Build a decompressing reader over `input`.
pub fn reader<R: Read>(input: R) -> GzDecoder<R> {
    GzDecoder::new(input)
}

/// Compress `input` to `output`, returning the uncompressed byte count.
pub fn compress<R: Read, W: Write>(
    input: &mut R,
    output: W,
    level: GzipLevel,
    header: &GzipHeader,
) -> Result<u64, StreamError> {
    let mut encoder = writer(output, level, header);
    let bytes = io::copy(input, &mut encoder)?;
    encoder.finish()?;
    Ok(bytes)
}

/// Decompress `input` to `output`, returning the uncompressed byte count.
///
/// Header name and comment, when present, are surfaced at debug level.
pub fn decompress<R: Read, W: Write>(input: R, output: &mut W) -> Result<u64, StreamError> {
    let mut decoder = reader(input);
    let bytes = io::copy(&mut decoder, output)?;
    if let Some(header) = decoder.header() {
        let name = header.filename().map(String::from_utf8_lossy);
        let comment = header.comment().map(String::from_utf8_lossy);
        debug!(?name, ?comment, "gzip header");
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let input = b"This is a test string".repeat(50);
        let mut compressed = Vec::new();
        compress(
            &mut input.as_slice(),
            &mut compressed,
            GzipLevel::Default,
            &GzipHeader::default(),
        )
        .unwrap();
        assert!(compressed.len() < input.len());

        let mut decompressed = Vec::new();
        let bytes = decompress(compressed.as_slice(), &mut decompressed).unwrap();
        assert_eq!(decompressed, input);
        assert_eq!(bytes, input.len() as u64);
    }

    #[test]
    fn test_header_fields_survive() {
        let mut compressed = Vec::new();
        let header = GzipHeader {
            name: Some("notes.txt".to_string()),
            comment: Some("scratch notes".to_string()),
        };
        compress(
            &mut b"hello".as_slice(),
            &mut compressed,
            GzipLevel::Best,
            &header,
        )
        .unwrap();

        let mut decoder = reader(compressed.as_slice());
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).unwrap();
        let parsed = decoder.header().unwrap();
        assert_eq!(parsed.filename(), Some(b"notes.txt".as_slice()));
        assert_eq!(parsed.comment(), Some(b"scratch notes".as_slice()));
    }

    #[test]
    fn test_no_compression_level_still_framed() {
        let input = b"incompressible?";
        let mut compressed = Vec::new();
        compress(
            &mut input.as_slice(),
            &mut compressed,
            GzipLevel::None,
            &GzipHeader::default(),
        )
        .unwrap();

        let mut decompressed = Vec::new();
        decompress(compressed.as_slice(), &mut decompressed).unwrap();
        assert_eq!(decompressed, input);
    }

    #[test]
    fn test_garbage_input_fails() {
        let mut out = Vec::new();
        assert!(decompress(&b"not gzip data"[..], &mut out).is_err());
    }
}
