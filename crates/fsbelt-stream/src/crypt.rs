//! AES-256-OFB stream encryption.
//!
//! The key is the SHA-256 digest of the passphrase, so any passphrase
//! length works. Every encryption draws a fresh random IV and writes it
//! as a 16-byte plaintext prefix; decryption reads the prefix back
//! before the keystream starts. OFB mode makes encryption and
//! decryption the same keystream XOR, which is what lets both sides be
//! thin `Write`/`Read` adapters.

use std::io::{self, Read, Write};

use aes::Aes256;
use ofb::Ofb;
use ofb::cipher::{KeyIvInit, StreamCipher};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use crate::error::StreamError;

type Aes256Ofb = Ofb<Aes256>;

/// Length of the IV prefix in bytes.
pub const IV_LEN: usize = 16;

fn derive_key(passphrase: &[u8]) -> [u8; 32] {
    Sha256::digest(passphrase).into()
}

fn build_cipher(passphrase: &[u8], iv: &[u8; IV_LEN]) -> Aes256Ofb {
    let key = derive_key(passphrase);
    Aes256Ofb::new(&key.into(), &(*iv).into())
}

/// Writer adapter that encrypts everything written through it.
///
/// Construction writes the IV prefix, so the underlying writer must be
/// positioned at the start of the ciphertext stream.
pub struct EncryptingWriter<W: Write> {
    inner: W,
    cipher: Aes256Ofb,
    scratch: Vec<u8>,
}

impl<W: Write> EncryptingWriter<W> {
    /// Draw a random IV, write it to `inner`, and set up the keystream.
    pub fn new(mut inner: W, passphrase: &[u8]) -> Result<Self, StreamError> {
        if passphrase.is_empty() {
            return Err(StreamError::EmptyPassphrase);
        }
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);
        inner.write_all(&iv)?;
        Ok(Self {
            cipher: build_cipher(passphrase, &iv),
            inner,
            scratch: Vec::new(),
        })
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(mut self) -> Result<W, StreamError> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for EncryptingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.scratch.clear();
        self.scratch.extend_from_slice(buf);
        self.cipher.apply_keystream(&mut self.scratch);
        self.inner.write_all(&self.scratch)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Reader adapter that decrypts everything read through it.
pub struct DecryptingReader<R: Read> {
    inner: R,
    cipher: Aes256Ofb,
}

impl<R: Read> DecryptingReader<R> {
    /// Read the IV prefix from `inner` and set up the keystream.
    ///
    /// The prefix is read with `read_exact`, so a source that delivers
    /// it in several short reads still works.
    pub fn new(mut inner: R, passphrase: &[u8]) -> Result<Self, StreamError> {
        if passphrase.is_empty() {
            return Err(StreamError::EmptyPassphrase);
        }
        let mut iv = [0u8; IV_LEN];
        inner.read_exact(&mut iv).map_err(|err| {
            if err.kind() == io::ErrorKind::UnexpectedEof {
                StreamError::MissingIv { expected: IV_LEN }
            } else {
                StreamError::Io(err)
            }
        })?;
        Ok(Self {
            cipher: build_cipher(passphrase, &iv),
            inner,
        })
    }
}

impl<R: Read> Read for DecryptingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        self.cipher.apply_keystream(&mut buf[..read]);
        Ok(read)
    }
}

/// Encrypt `input` to `output`, returning the plaintext byte count.
pub fn encrypt<R: Read, W: Write>(
    input: &mut R,
    output: W,
    passphrase: &[u8],
) -> Result<u64, StreamError> {
    let mut writer = EncryptingWriter::new(output, passphrase)?;
    let bytes = io::copy(input, &mut writer)?;
    writer.into_inner()?;
    Ok(bytes)
}

/// Decrypt `input` to `output`, returning the plaintext byte count.
pub fn decrypt<R: Read, W: Write>(
    input: R,
    output: &mut W,
    passphrase: &[u8],
) -> Result<u64, StreamError> {
    let mut reader = DecryptingReader::new(input, passphrase)?;
    let bytes = io::copy(&mut reader, output)?;
    Ok(bytes)
}
