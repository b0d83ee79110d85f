//! Stream transcoder: inventory lines ⇄ structured header + records.
//!
//! # Reading
//! [`lines_to_structured`] checks the four-line preamble, then decodes every
//! non-empty line after it as a data line, in order.  Abbreviations are kept
//! exactly as written.
//!
//! # Writing
//! [`structured_to_lines`] emits the preamble followed by one data line per
//! record.  [`InventoryWriter`] does the same incrementally into any
//! [`Write`], optionally zlib-compressing the body as it goes.

use std::io::{self, Write};

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::codec::DEFAULT_COMPRESSION_LEVEL;
use crate::header::{trim_cr, Header, HEADER_LINES};
use crate::record::{decode_line, encode_line, InventoryRecord, ParseError};

// ── Reading ──────────────────────────────────────────────────────────────────

pub fn lines_to_structured<'a, I>(lines: I) -> Result<(Header, Vec<InventoryRecord>), ParseError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut lines = lines.into_iter();
    let head: Vec<&str> = lines.by_ref().take(HEADER_LINES).collect();
    let header = Header::parse(&head)?;

    let mut records = Vec::new();
    for line in lines {
        let line = trim_cr(line);
        if line.trim().is_empty() {
            continue;
        }
        records.push(decode_line(line)?);
    }
    tracing::trace!(project = %header.project, records = records.len(), "decoded inventory lines");
    Ok((header, records))
}

/// Decode a plaintext inventory held in memory.
pub fn bytes_to_structured(plain: &[u8]) -> Result<(Header, Vec<InventoryRecord>), ParseError> {
    let text = std::str::from_utf8(plain)?;
    lines_to_structured(text.split('\n'))
}

// ── Writing ──────────────────────────────────────────────────────────────────

/// Render header and records as lines (no terminators).
///
/// With `contract` set each record is abbreviated first; otherwise its
/// fields are written as stored.
pub fn structured_to_lines(header: &Header, records: &[InventoryRecord], contract: bool) -> Vec<String> {
    let mut out = header.to_lines();
    out.reserve(records.len());
    for rec in records {
        out.push(render(rec, contract));
    }
    out
}

/// Render the full plaintext inventory, every line `\n`-terminated.
pub fn structured_to_text(header: &Header, records: &[InventoryRecord], contract: bool) -> String {
    let mut text = String::new();
    for line in structured_to_lines(header, records, contract) {
        text.push_str(&line);
        text.push('\n');
    }
    text
}

fn render(rec: &InventoryRecord, contract: bool) -> String {
    if contract { encode_line(&rec.contracted()) } else { encode_line(rec) }
}

/// Incremental inventory writer.
pub struct InventoryWriter<W: Write> {
    sink:                W,
    zlib:                Option<ZlibEncoder<Vec<u8>>>,
    pub contract:        bool,
    pub records_written: usize,
}

impl<W: Write> InventoryWriter<W> {
    /// Plaintext writer; the header is written immediately.
    pub fn plain(writer: W, header: &Header) -> io::Result<Self> {
        Self::with_body(writer, header, None)
    }

    /// Writer that zlib-compresses everything after the header.
    pub fn zlib(writer: W, header: &Header) -> io::Result<Self> {
        Self::zlib_with_level(writer, header, DEFAULT_COMPRESSION_LEVEL)
    }

    pub fn zlib_with_level(writer: W, header: &Header, level: u32) -> io::Result<Self> {
        let enc = ZlibEncoder::new(Vec::new(), Compression::new(level.min(9)));
        Self::with_body(writer, header, Some(enc))
    }

    fn with_body(mut writer: W, header: &Header, zlib: Option<ZlibEncoder<Vec<u8>>>) -> io::Result<Self> {
        writer.write_all(header.to_text().as_bytes())?;
        Ok(Self {
            sink:            writer,
            zlib,
            contract:        true,
            records_written: 0,
        })
    }

    pub fn write_record(&mut self, rec: &InventoryRecord) -> io::Result<()> {
        let mut line = render(rec, self.contract);
        line.push('\n');
        match self.zlib.as_mut() {
            Some(enc) => enc.write_all(line.as_bytes())?,
            None      => self.sink.write_all(line.as_bytes())?,
        }
        self.records_written += 1;
        Ok(())
    }

    /// Flush the body and hand back the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(enc) = self.zlib.take() {
            let compressed = enc.finish()?;
            self.sink.write_all(&compressed)?;
        }
        self.sink.flush()?;
        tracing::trace!(records = self.records_written, "inventory stream finished");
        Ok(self.sink)
    }
}
