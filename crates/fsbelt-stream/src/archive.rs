//! Tar packaging with optional gzip and encryption layers.
//!
//! Byte streams compose as `tar -> gzip -> encryption -> sink`, so an
//! encrypted compressed package is decrypted first and decompressed
//! second on the way back out.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tar::{Archive, Builder};
use tracing::{debug, info, warn};

use crate::crypt::{DecryptingReader, EncryptingWriter};
use crate::error::StreamError;
use crate::gzip::{self, GzipHeader, GzipLevel};

/// Layer selection for `pack` and `unpack`.
///
/// `unpack` only cares whether the gzip layer is present; the level is
/// ignored on the way in.
#[derive(Debug, Clone, Default)]
pub struct PackOptions {
    /// Compress the archive, at this level.
    pub gzip: Option<GzipLevel>,
    /// Encrypt the archive with this passphrase.
    pub passphrase: Option<Vec<u8>>,
}

/// Package `inputs` into a tar archive written to `output`.
///
/// Directories contribute their contents relative to the directory
/// itself, so unpacking recreates them at the destination root. Plain
/// files are stored under their base name. Non-regular entries are
/// skipped.
pub fn pack<W: Write>(
    inputs: &[PathBuf],
    output: W,
    options: &PackOptions,
) -> Result<(), StreamError> {
    if inputs.is_empty() {
        return Err(StreamError::NoInputs);
    }
    match (&options.passphrase, options.gzip) {
        (Some(passphrase), Some(level)) => {
            let encrypted = EncryptingWriter::new(output, passphrase)?;
            let compressed = gzip::writer(encrypted, level, &GzipHeader::default());
            let compressed = pack_into(inputs, compressed)?;
            let encrypted = compressed.finish()?;
            encrypted.into_inner()?;
        }
        (Some(passphrase), None) => {
            let encrypted = EncryptingWriter::new(output, passphrase)?;
            let encrypted = pack_into(inputs, encrypted)?;
            encrypted.into_inner()?;
        }
        (None, Some(level)) => {
            let compressed = gzip::writer(output, level, &GzipHeader::default());
            let compressed = pack_into(inputs, compressed)?;
            compressed.finish()?;
        }
        (None, None) => {
            pack_into(inputs, output)?;
        }
    }
    Ok(())
}

/// Unpack a tar archive from `input` into the `dest` directory,
/// creating it when absent.
pub fn unpack<R: Read>(input: R, dest: &Path, options: &PackOptions) -> Result<(), StreamError> {
    fs::create_dir_all(dest)?;
    match (&options.passphrase, options.gzip.is_some()) {
        (Some(passphrase), true) => {
            let decrypted = DecryptingReader::new(input, passphrase)?;
            unpack_from(gzip::reader(decrypted), dest)
        }
        (Some(passphrase), false) => unpack_from(DecryptingReader::new(input, passphrase)?, dest),
        (None, true) => unpack_from(gzip::reader(input), dest),
        (None, false) => unpack_from(input, dest),
    }
}

fn pack_into<W: Write>(inputs: &[PathBuf], output: W) -> Result<W, StreamError> {
    let mut builder = Builder::new(output);
    for input in inputs {
        info!(path = %input.display(), "packing input path");
        append_input(&mut builder, input)?;
    }
    let mut output = builder.into_inner()?;
    output.flush()?;
    Ok(output)
}

fn unpack_from<R: Read>(input: R, dest: &Path) -> Result<(), StreamError> {
    let mut archive = Archive::new(input);
    archive.set_preserve_permissions(true);
    archive.unpack(dest)?;
    Ok(())
}

fn append_input<W: Write>(builder: &mut Builder<W>, input: &Path) -> Result<(), StreamError> {
    let metadata = fs::symlink_metadata(input)?;
    if metadata.is_dir() {
        append_dir_contents(builder, input, input)
    } else if metadata.is_file() {
        let name = input.file_name().unwrap_or(input.as_os_str());
        builder.append_path_with_name(input, name)?;
        Ok(())
    } else {
        warn!(path = %input.display(), "skipping non-regular input path");
        Ok(())
    }
}

fn append_dir_contents<W: Write>(
    builder: &mut Builder<W>,
    base: &Path,
    dir: &Path,
) -> Result<(), StreamError> {
    let mut entries: Vec<fs::DirEntry> = fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(fs::DirEntry::file_name);
    for entry in entries {
        let path = entry.path();
        // Archive names are relative to the input path itself
        let Ok(name) = path.strip_prefix(base) else {
            continue;
        };
        let metadata = fs::symlink_metadata(&path)?;
        if metadata.is_dir() {
            builder.append_path_with_name(&path, name)?;
            append_dir_contents(builder, base, &path)?;
        } else if metadata.is_file() {
            builder.append_path_with_name(&path, name)?;
        } else {
            debug!(path = %path.display(), "skipping non-regular entry");
        }
    }
    Ok(())
}
