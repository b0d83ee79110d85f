//! zlib framing for inventory files.
//!
//! An `objects.inv` file keeps its four header lines as plain text and
//! zlib-compresses only the record body that follows.  Some writers flush
//! the compressor periodically, which can leave several complete zlib
//! streams back to back; [`decompress`] concatenates all of them.
//!
//! Whether a body is compressed is decided up front from the zlib stream
//! header (see [`detect_form`]) rather than by trying to inflate and
//! catching the failure.

use std::io::{self, Read, Write};

use flate2::bufread::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use thiserror::Error;

use crate::header::HEADER_LINES;

/// Sphinx writes inventories at maximum compression.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 9;

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Compression error: {0}")]
    Compression(String),
    #[error("Decompression error: {0}")]
    Decompression(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

// ── Body form ────────────────────────────────────────────────────────────────

/// How the record body after the header is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyForm {
    Zlib,
    Plain,
}

/// Split raw inventory bytes after the fourth newline.
///
/// When fewer than four lines are present the whole input is returned as
/// the header and the body is empty.
pub fn split_header(data: &[u8]) -> (&[u8], &[u8]) {
    let mut seen = 0;
    for (i, b) in data.iter().enumerate() {
        if *b == b'\n' {
            seen += 1;
            if seen == HEADER_LINES {
                return data.split_at(i + 1);
            }
        }
    }
    (data, &[])
}

/// True when `body` starts with a valid zlib stream header: deflate method,
/// a window of at most 32 KiB, a correct FCHECK and no preset dictionary.
pub fn is_zlib_stream(body: &[u8]) -> bool {
    let (cmf, flg) = match body {
        [cmf, flg, ..] => (*cmf, *flg),
        _              => return false,
    };
    cmf & 0x0F == 8
        && cmf >> 4 <= 7
        && ((cmf as u16) << 8 | flg as u16) % 31 == 0
        && flg & 0x20 == 0
}

pub fn detect_form(data: &[u8]) -> BodyForm {
    let (_, body) = split_header(data);
    if is_zlib_stream(body) { BodyForm::Zlib } else { BodyForm::Plain }
}

// ── Codec ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct ZlibCodec {
    pub level: u32,
}

impl Default for ZlibCodec {
    fn default() -> Self {
        Self { level: DEFAULT_COMPRESSION_LEVEL }
    }
}

impl ZlibCodec {
    pub fn new(level: u32) -> Self {
        Self { level: level.min(9) }
    }

    /// Compress the body of a plaintext inventory, header kept verbatim.
    pub fn compress(&self, plaintext: &[u8]) -> Result<Vec<u8>, CodecError> {
        let (header, body) = split_header(plaintext);
        let mut out = header.to_vec();
        let mut enc = ZlibEncoder::new(&mut out, Compression::new(self.level));
        enc.write_all(body).map_err(|e| CodecError::Compression(e.to_string()))?;
        enc.finish().map_err(|e| CodecError::Compression(e.to_string()))?;
        Ok(out)
    }

    /// Inflate the body of a compressed inventory, header kept verbatim.
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        let (header, body) = split_header(data);
        let mut out = header.to_vec();
        inflate_streams(body, &mut out)?;
        Ok(out)
    }
}

/// Inflate every zlib stream found back to back in `body`.
fn inflate_streams(mut body: &[u8], out: &mut Vec<u8>) -> Result<(), CodecError> {
    if !is_zlib_stream(body) {
        return Err(CodecError::Decompression("body is not a zlib stream".into()));
    }
    let mut streams = 0usize;
    while is_zlib_stream(body) {
        let mut dec = ZlibDecoder::new(body);
        dec.read_to_end(out)
            .map_err(|e| CodecError::Decompression(e.to_string()))?;
        let rest = dec.into_inner();
        if rest.len() == body.len() {
            break;
        }
        body = rest;
        streams += 1;
    }
    if !body.iter().all(u8::is_ascii_whitespace) {
        return Err(CodecError::Decompression(format!(
            "{} trailing bytes after zlib stream {streams} are not a zlib stream",
            body.len()
        )));
    }
    tracing::trace!(streams, "inflated inventory body");
    Ok(())
}

pub fn compress(plaintext: &[u8]) -> Result<Vec<u8>, CodecError> {
    ZlibCodec::default().compress(plaintext)
}

pub fn decompress(data: &[u8]) -> Result<Vec<u8>, CodecError> {
    ZlibCodec::default().decompress(data)
}
