//! Directory-model <-> byte-stream serialization, then gzip.
//!
//! The layout here is the plaintext that gets sealed as the container's
//! ciphertext body; nothing in this module knows about passwords or nonces.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::consts::CODEC_MAGIC;
use crate::model::{sha256_of, Directory, Entry, Kind};

/// Codec-level failures, scoped to this module. The caller (`vault::load`)
/// maps every variant to [`crate::error::VaultError::Corrupt`] — by the time
/// bytes reach here they have already passed AES-GCM authentication, so a
/// codec error means the plaintext itself doesn't parse, not that the key
/// was wrong.
#[derive(Debug)]
pub(crate) enum CodecError {
    Truncated,
    BadMagic,
    BadTrailer,
    BadEntry(String),
    Gzip(String),
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodecError::Truncated => write!(f, "truncated directory stream"),
            CodecError::BadMagic => write!(f, "bad codec magic"),
            CodecError::BadTrailer => write!(f, "trailer checksum mismatch"),
            CodecError::BadEntry(msg) => write!(f, "bad entry: {msg}"),
            CodecError::Gzip(msg) => write!(f, "gzip error: {msg}"),
        }
    }
}

/// Serialize `dir` to the codec's byte layout, then gzip it.
pub(crate) fn encode(dir: &Directory) -> Vec<u8> {
    let raw = encode_raw(dir);

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    // Writing to a Vec<u8> via flate2's GzEncoder cannot fail.
    encoder.write_all(&raw).expect("in-memory gzip write");
    encoder.finish().expect("in-memory gzip finish")
}

fn encode_raw(dir: &Directory) -> Vec<u8> {
    let entries = dir.entries();
    let mut buf = Vec::new();

    buf.extend_from_slice(CODEC_MAGIC);
    buf.extend_from_slice(&(entries.len() as u32).to_le_bytes());

    for entry in entries {
        let path_bytes = entry.path.as_bytes();
        buf.extend_from_slice(&(path_bytes.len() as u32).to_le_bytes());
        buf.extend_from_slice(path_bytes);

        buf.push(match entry.kind {
            Kind::File => 0,
            Kind::Directory => 1,
        });

        buf.extend_from_slice(&entry.mode.to_le_bytes());
        buf.extend_from_slice(&entry.mtime_secs.to_le_bytes());
        buf.extend_from_slice(&entry.mtime_nanos.to_le_bytes());
        buf.extend_from_slice(&entry.size.to_le_bytes());
        buf.extend_from_slice(&entry.sha256);
        buf.extend_from_slice(&entry.content);
    }

    let trailer = sha256_of(&buf);
    buf.extend_from_slice(&trailer);
    buf
}

/// Gunzip, then parse the codec's byte layout back into a [`Directory`].
pub(crate) fn decode(gzipped: &[u8]) -> Result<Directory, CodecError> {
    let mut raw = Vec::new();
    GzDecoder::new(gzipped)
        .read_to_end(&mut raw)
        .map_err(|e| CodecError::Gzip(e.to_string()))?;

    decode_raw(&raw)
}

fn decode_raw(raw: &[u8]) -> Result<Directory, CodecError> {
    if raw.len() < 32 {
        return Err(CodecError::Truncated);
    }
    let (body, trailer) = raw.split_at(raw.len() - 32);
    if sha256_of(body) != trailer {
        return Err(CodecError::BadTrailer);
    }

    let mut cursor = Cursor { buf: body, pos: 0 };

    let magic = cursor.take(8)?;
    if magic != CODEC_MAGIC.as_slice() {
        return Err(CodecError::BadMagic);
    }

    let count = cursor.take_u32()? as usize;
    let mut entries = Vec::with_capacity(count);

    for _ in 0..count {
        let path_len = cursor.take_u32()? as usize;
        let path_bytes = cursor.take(path_len)?;
        let path = String::from_utf8(path_bytes.to_vec())
            .map_err(|e| CodecError::BadEntry(format!("path is not UTF-8: {e}")))?;

        let kind_byte = cursor.take(1)?[0];
        let kind = match kind_byte {
            0 => Kind::File,
            1 => Kind::Directory,
            other => return Err(CodecError::BadEntry(format!("unknown kind byte {other}"))),
        };

        let mode = cursor.take_u32()?;
        let mtime_secs = cursor.take_i64()?;
        let mtime_nanos = cursor.take_u32()?;
        let size = cursor.take_u64()?;
        let sha256_bytes = cursor.take(32)?;
        let mut sha256 = [0u8; 32];
        sha256.copy_from_slice(sha256_bytes);

        let content = cursor.take(size as usize)?.to_vec();

        if kind == Kind::Directory && (size != 0 || sha256 != [0u8; 32]) {
            return Err(CodecError::BadEntry(format!(
                "directory entry {path} must have zero size and zero sha256"
            )));
        }
        if kind == Kind::File && size != content.len() as u64 {
            return Err(CodecError::BadEntry(format!(
                "entry {path} declares size {size} but has {} bytes of content",
                content.len()
            )));
        }

        entries.push(Entry {
            path,
            kind,
            mode,
            mtime_secs,
            mtime_nanos,
            size,
            content,
            sha256,
        });
    }

    if cursor.pos != cursor.buf.len() {
        return Err(CodecError::BadEntry("trailing bytes after last entry".to_string()));
    }

    Ok(Directory::from_entries(entries))
}

/// Minimal forward-only byte cursor with bounds checking on every read.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if self.pos + n > self.buf.len() {
            return Err(CodecError::Truncated);
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_u32(&mut self) -> Result<u32, CodecError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes(bytes.try_into().unwrap()))
    }

    fn take_u64(&mut self) -> Result<u64, CodecError> {
        let bytes = self.take(8)?;
        Ok(u64::from_le_bytes(bytes.try_into().unwrap()))
    }

    fn take_i64(&mut self) -> Result<i64, CodecError> {
        let bytes = self.take(8)?;
        Ok(i64::from_le_bytes(bytes.try_into().unwrap()))
    }
}
