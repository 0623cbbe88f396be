//! Streaming JSON codecs.
//!
//! Two framings for a stream of JSON objects, shared by the CLI and the
//! scan output path:
//!
//! - length-prefixed: each object is preceded by its byte length in
//!   ASCII decimal, `42{...}`, where the length counts the whole object
//!   including the opening brace;
//! - delimited: each object is followed by a fixed delimiter byte
//!   sequence.
//!
//! Readers yield `Ok(None)` at a clean end of stream and an error when
//! the stream ends mid-object.

use std::io::{ErrorKind, Read, Write};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::entity::FsEntity;

/// Errors from the streaming JSON codecs.
#[derive(Debug, Error)]
pub enum SjsonError {
    /// I/O failure on the underlying stream.
    #[error("I/O error in JSON stream: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// No length digits were present before the opening brace.
    #[error("No length prefix before JSON object")]
    MissingLength,

    /// The length prefix was not a usable decimal number.
    #[error("Invalid length prefix {text:?}")]
    InvalidLength { text: String },

    /// The stream ended before a complete JSON object was read.
    #[error("Stream ended before a complete JSON object")]
    Truncated,

    /// A delimiter appeared with no object in front of it.
    #[error("No object was present before delimiter")]
    EmptyFrame,

    /// A delimiter must be at least one byte.
    #[error("Delimiter must not be empty")]
    EmptyDelimiter,
}

/// Writes length-prefixed JSON objects to an underlying writer.
pub struct LengthPrefixWriter<W: Write> {
    inner: W,
}

impl<W: Write> LengthPrefixWriter<W> {
    /// Wrap a writer.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Serialize one object. Returns the total bytes written, prefix
    /// included.
    pub fn write_object<T: Serialize>(&mut self, value: &T) -> Result<usize, SjsonError> {
        let data = serde_json::to_vec(value)?;
        let prefix = data.len().to_string();
        self.inner.write_all(prefix.as_bytes())?;
        self.inner.write_all(&data)?;
        Ok(prefix.len() + data.len())
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(mut self) -> Result<W, SjsonError> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Reads length-prefixed JSON objects from an underlying reader.
pub struct LengthPrefixReader<R: Read> {
    inner: R,
}

impl<R: Read> LengthPrefixReader<R> {
    /// Wrap a reader.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Read the next object, or `None` at a clean end of stream.
    pub fn read_next<T: DeserializeOwned>(&mut self) -> Result<Option<T>, SjsonError> {
        let mut prefix: Vec<u8> = Vec::with_capacity(16);
        loop {
            match read_byte(&mut self.inner)? {
                None if prefix.is_empty() => return Ok(None),
                None => return Err(SjsonError::Truncated),
                Some(b'{') => break,
                Some(byte) => prefix.push(byte),
            }
        }
        if prefix.is_empty() {
            return Err(SjsonError::MissingLength);
        }
        let text = String::from_utf8_lossy(&prefix).into_owned();
        let length: usize = text
            .parse()
            .map_err(|_| SjsonError::InvalidLength { text: text.clone() })?;
        if length == 0 {
            return Err(SjsonError::InvalidLength { text });
        }
        let mut body = vec![0u8; length];
        body[0] = b'{';
        self.inner.read_exact(&mut body[1..]).map_err(|err| {
            if err.kind() == ErrorKind::UnexpectedEof {
                SjsonError::Truncated
            } else {
                SjsonError::Io(err)
            }
        })?;
        Ok(Some(serde_json::from_slice(&body)?))
    }

    /// Read every remaining object in the stream.
    pub fn read_all<T: DeserializeOwned>(&mut self) -> Result<Vec<T>, SjsonError> {
        let mut items = Vec::new();
        while let Some(item) = self.read_next()? {
            items.push(item);
        }
        Ok(items)
    }
}

/// Writes delimiter-separated JSON objects to an underlying writer.
pub struct DelimitedWriter<W: Write> {
    inner: W,
    delimiter: Vec<u8>,
}

impl<W: Write> DelimitedWriter<W> {
    /// Wrap a writer. The delimiter must be at least one byte.
    pub fn new(inner: W, delimiter: impl Into<Vec<u8>>) -> Result<Self, SjsonError> {
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            return Err(SjsonError::EmptyDelimiter);
        }
        Ok(Self { inner, delimiter })
    }

    /// Serialize one object followed by the delimiter. Returns the
    /// total bytes written.
    pub fn write_object<T: Serialize>(&mut self, value: &T) -> Result<usize, SjsonError> {
        let data = serde_json::to_vec(value)?;
        self.inner.write_all(&data)?;
        self.inner.write_all(&self.delimiter)?;
        Ok(data.len() + self.delimiter.len())
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(mut self) -> Result<W, SjsonError> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Reads delimiter-separated JSON objects from an underlying reader.
pub struct DelimitedReader<R: Read> {
    inner: R,
    delimiter: Vec<u8>,
}

impl<R: Read> DelimitedReader<R> {
    /// Wrap a reader. The delimiter must be at least one byte.
    pub fn new(inner: R, delimiter: impl Into<Vec<u8>>) -> Result<Self, SjsonError> {
        let delimiter = delimiter.into();
        if delimiter.is_empty() {
            return Err(SjsonError::EmptyDelimiter);
        }
        Ok(Self { inner, delimiter })
    }

    /// Read the next object, or `None` at a clean end of stream.
    pub fn read_next<T: DeserializeOwned>(&mut self) -> Result<Option<T>, SjsonError> {
        let mut frame: Vec<u8> = Vec::with_capacity(1024);
        loop {
            match read_byte(&mut self.inner)? {
                None if frame.is_empty() => return Ok(None),
                None => return Err(SjsonError::Truncated),
                Some(byte) => {
                    frame.push(byte);
                    if frame.ends_with(&self.delimiter) {
                        break;
                    }
                }
            }
        }
        let body_len = frame.len() - self.delimiter.len();
        if body_len == 0 {
            return Err(SjsonError::EmptyFrame);
        }
        Ok(Some(serde_json::from_slice(&frame[..body_len])?))
    }

    /// Read every remaining object in the stream.
    pub fn read_all<T: DeserializeOwned>(&mut self) -> Result<Vec<T>, SjsonError> {
        let mut items = Vec::new();
        while let Some(item) = self.read_next()? {
            items.push(item);
        }
        Ok(items)
    }
}

/// Write a whole entity tree as independent length-prefixed objects,
/// children before parents. Each emitted object has its `children`
/// cleared; parent linkage survives through `parentId`.
pub fn write_entity_stream<W: Write>(
    writer: &mut LengthPrefixWriter<W>,
    mut entity: FsEntity,
) -> Result<usize, SjsonError> {
    let children = std::mem::take(&mut entity.children);
    let mut written = 0;
    for child in children {
        written += write_entity_stream(writer, child)?;
    }
    written += writer.write_object(&entity)?;
    Ok(written)
}

fn read_byte<R: Read>(reader: &mut R) -> Result<Option<u8>, SjsonError> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(SjsonError::Io(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Cursor;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Pair {
        name: String,
        value: String,
    }

    fn pair(name: &str, value: &str) -> Pair {
        Pair {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_length_prefix_write() {
        let mut writer = LengthPrefixWriter::new(Vec::new());
        let written = writer.write_object(&pair("a", "b")).unwrap();
        assert_eq!(written, 26);
        let bytes = writer.into_inner().unwrap();
        assert_eq!(bytes, b"24{\"name\":\"a\",\"value\":\"b\"}");
    }

    #[test]
    fn test_length_prefix_read_multiple() {
        let data = b"24{\"name\":\"a\",\"value\":\"b\"}24{\"name\":\"c\",\"value\":\"d\"}26{\"name\":\"ef\",\"value\":\"gh\"}";
        let mut reader = LengthPrefixReader::new(Cursor::new(&data[..]));
        let items: Vec<Pair> = reader.read_all().unwrap();
        assert_eq!(items, vec![pair("a", "b"), pair("c", "d"), pair("ef", "gh")]);
        // Stream is exhausted now
        assert!(reader.read_next::<Pair>().unwrap().is_none());
    }

    #[test]
    fn test_length_prefix_truncated() {
        let data = b"24{\"name\":\"a\",\"val";
        let mut reader = LengthPrefixReader::new(Cursor::new(&data[..]));
        assert!(matches!(
            reader.read_next::<Pair>(),
            Err(SjsonError::Truncated)
        ));
    }

    #[test]
    fn test_length_prefix_missing_length() {
        let data = b"{\"name\":\"a\",\"value\":\"b\"}";
        let mut reader = LengthPrefixReader::new(Cursor::new(&data[..]));
        assert!(matches!(
            reader.read_next::<Pair>(),
            Err(SjsonError::MissingLength)
        ));
    }

    #[test]
    fn test_delimited_round_trip() {
        let mut writer = DelimitedWriter::new(Vec::new(), vec![0x30]).unwrap();
        let written = writer.write_object(&pair("a", "b")).unwrap();
        assert_eq!(written, 25);
        writer.write_object(&pair("c", "d")).unwrap();
        let bytes = writer.into_inner().unwrap();

        let mut reader = DelimitedReader::new(Cursor::new(bytes), vec![0x30]).unwrap();
        let items: Vec<Pair> = reader.read_all().unwrap();
        assert_eq!(items, vec![pair("a", "b"), pair("c", "d")]);
    }

    #[test]
    fn test_delimited_multi_byte_delimiter() {
        let mut writer = DelimitedWriter::new(Vec::new(), b"\r\n".to_vec()).unwrap();
        let written = writer.write_object(&pair("a", "b")).unwrap();
        assert_eq!(written, 26);
        let bytes = writer.into_inner().unwrap();

        let mut reader = DelimitedReader::new(Cursor::new(bytes), b"\r\n".to_vec()).unwrap();
        let item: Option<Pair> = reader.read_next().unwrap();
        assert_eq!(item, Some(pair("a", "b")));
    }

    #[test]
    fn test_delimited_empty_frame() {
        let data = [0x30u8];
        let mut reader = DelimitedReader::new(Cursor::new(&data[..]), vec![0x30]).unwrap();
        assert!(matches!(
            reader.read_next::<Pair>(),
            Err(SjsonError::EmptyFrame)
        ));
    }

    #[test]
    fn test_empty_delimiter_rejected() {
        assert!(matches!(
            DelimitedWriter::new(Vec::new(), Vec::new()),
            Err(SjsonError::EmptyDelimiter)
        ));
    }
}
