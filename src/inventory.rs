//! High-level [`Inventory`] API, the main embedding surface.
//!
//! ```no_run
//! use objinv::inventory::{Inventory, Source};
//!
//! // Read a compressed inventory from disk
//! let inv = Inventory::load(Some(Source::Path("objects.inv".into())))?;
//! println!("{} {} has {} objects", inv.project, inv.version, inv.count());
//!
//! // Re-render as plaintext, or as the structured JSON form
//! let text = inv.data_file(false, true)?;
//! let json = inv.json_dict();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::borrow::Cow;
use std::io::{self, Write};
use std::path::PathBuf;

use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::codec::{self, BodyForm, CodecError};
use crate::fetch::{FetchError, HttpFetcher, UrlFetcher};
use crate::fileops;
use crate::header::Header;
use crate::io_stream::{bytes_to_structured, InventoryWriter};
use crate::record::{InventoryRecord, ParseError, RecordError};
use crate::schema::{self, HeaderField, JsonSchemaValidator, SchemaError, SchemaValidator};
use crate::suggest::{self, SuggestOptions, Suggestion};

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Decompression(#[from] CodecError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error("Only one inventory source may be given; got {}", .0.join(", "))]
    SourceConflict(Vec<&'static str>),
    #[error("Declared count {declared} does not match {found} object entries")]
    RecordCountMismatch { declared: u64, found: usize },
    #[error("Inventory contains no objects")]
    NoObjects,
    #[error("Suggest threshold {0} is outside 0..=100")]
    InvalidThreshold(u8),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl InventoryError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, InventoryError::Fetch(FetchError::Timeout { .. }))
    }
}

// ── Sources ──────────────────────────────────────────────────────────────────

/// Where an inventory came from.  Diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceType {
    #[default]
    Unknown,
    Bytes,
    Plaintext,
    Fname,
    Url,
    DictJson,
}

/// Exactly one input an inventory can be built from.
#[derive(Debug, Clone)]
pub enum Source {
    /// Raw file contents; compressed or plain is detected from the body.
    Bytes(Vec<u8>),
    /// Contents known to be zlib-compressed.
    Zlib(Vec<u8>),
    /// Contents known to be plaintext.
    Plaintext(Vec<u8>),
    /// File on disk, compressed or plain.
    Path(PathBuf),
    /// Remote file, compressed or plain.
    Url(String),
    /// Structured form, as produced by [`Inventory::json_dict`].
    Dict(Value),
}

impl Source {
    pub fn source_type(&self) -> SourceType {
        match self {
            Source::Bytes(_) | Source::Zlib(_) => SourceType::Bytes,
            Source::Plaintext(_)               => SourceType::Plaintext,
            Source::Path(_)                    => SourceType::Fname,
            Source::Url(_)                     => SourceType::Url,
            Source::Dict(_)                    => SourceType::DictJson,
        }
    }
}

/// Keyword-style source selection, resolved to a single [`Source`].
#[derive(Debug, Clone, Default)]
pub struct SourceArgs {
    pub bytes:     Option<Vec<u8>>,
    pub zlib:      Option<Vec<u8>>,
    pub plaintext: Option<Vec<u8>>,
    pub path:      Option<PathBuf>,
    pub url:       Option<String>,
    pub dict_json: Option<Value>,
}

impl SourceArgs {
    /// `Ok(None)` when nothing was given; an error when more than one was.
    pub fn resolve(self) -> Result<Option<Source>, InventoryError> {
        let mut given: Vec<(&'static str, Source)> = Vec::new();
        if let Some(b) = self.bytes     { given.push(("bytes", Source::Bytes(b))); }
        if let Some(b) = self.zlib      { given.push(("zlib", Source::Zlib(b))); }
        if let Some(b) = self.plaintext { given.push(("plaintext", Source::Plaintext(b))); }
        if let Some(p) = self.path      { given.push(("path", Source::Path(p))); }
        if let Some(u) = self.url       { given.push(("url", Source::Url(u))); }
        if let Some(d) = self.dict_json { given.push(("dict_json", Source::Dict(d))); }

        if given.len() > 1 {
            return Err(InventoryError::SourceConflict(given.into_iter().map(|(n, _)| n).collect()));
        }
        Ok(given.pop().map(|(_, s)| s))
    }
}

// ── Inventory ────────────────────────────────────────────────────────────────

/// A parsed inventory: header plus objects in file order.
///
/// There is no finalize step; fields may be edited freely and every
/// rendering reflects the current contents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Inventory {
    pub project:     String,
    pub version:     String,
    pub objects:     Vec<InventoryRecord>,
    pub source_type: SourceType,
}

impl Inventory {
    // ── Constructors ─────────────────────────────────────────────────────────

    /// Empty inventory with the given header.
    pub fn new(project: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Build from one source, or an empty shell for `None`.  URLs are
    /// fetched with a default [`HttpFetcher`].
    pub fn load(source: Option<Source>) -> Result<Self, InventoryError> {
        Self::load_with(source, &HttpFetcher::default())
    }

    pub fn load_with(source: Option<Source>, fetcher: &dyn UrlFetcher) -> Result<Self, InventoryError> {
        let Some(source) = source else {
            return Ok(Self::default());
        };
        let source_type = source.source_type();
        tracing::debug!(?source_type, "importing inventory");

        let mut inv = match source {
            Source::Bytes(data)     => Self::import_bytes(&data, None)?,
            Source::Zlib(data)      => Self::import_bytes(&data, Some(BodyForm::Zlib))?,
            Source::Plaintext(data) => Self::import_bytes(&data, Some(BodyForm::Plain))?,
            Source::Path(path)      => Self::import_bytes(&fileops::read_bytes(&path)?, None)?,
            Source::Url(url)        => Self::import_bytes(&fetcher.fetch(&url)?, None)?,
            Source::Dict(doc)       => Self::import_dict(&doc, &JsonSchemaValidator::new()?)?,
        };
        inv.source_type = source_type;
        tracing::debug!(project = %inv.project, count = inv.count(), "inventory imported");
        Ok(inv)
    }

    pub fn from_args(args: SourceArgs) -> Result<Self, InventoryError> {
        Self::load(args.resolve()?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, InventoryError> {
        Self::load(Some(Source::Bytes(data.to_vec())))
    }

    pub fn from_plaintext(data: &[u8]) -> Result<Self, InventoryError> {
        Self::load(Some(Source::Plaintext(data.to_vec())))
    }

    pub fn from_zlib(data: &[u8]) -> Result<Self, InventoryError> {
        Self::load(Some(Source::Zlib(data.to_vec())))
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, InventoryError> {
        Self::load(Some(Source::Path(path.into())))
    }

    pub fn from_url(url: &str, fetcher: &dyn UrlFetcher) -> Result<Self, InventoryError> {
        Self::load_with(Some(Source::Url(url.to_string())), fetcher)
    }

    pub fn from_dict(doc: &Value) -> Result<Self, InventoryError> {
        Self::load(Some(Source::Dict(doc.clone())))
    }

    // ── Import pipelines ─────────────────────────────────────────────────────

    fn import_bytes(data: &[u8], expect: Option<BodyForm>) -> Result<Self, InventoryError> {
        let form = expect.unwrap_or_else(|| codec::detect_form(data));
        tracing::debug!(?form, bytes = data.len(), "decoding inventory bytes");

        let plain: Cow<'_, [u8]> = match (form, expect) {
            (BodyForm::Plain, _) => Cow::Borrowed(data),
            (BodyForm::Zlib, Some(_)) => Cow::Owned(codec::decompress(data)?),
            // Record text such as "XGB..." also passes the zlib header check.
            (BodyForm::Zlib, None) => match codec::decompress(data) {
                Ok(out) => Cow::Owned(out),
                Err(e) => {
                    tracing::debug!(error = %e, "body is not zlib after all, reading as plaintext");
                    Cow::Borrowed(data)
                }
            },
        };
        let (header, objects) = bytes_to_structured(&plain)?;
        if objects.is_empty() {
            return Err(InventoryError::NoObjects);
        }
        Ok(Self {
            project: header.project,
            version: header.version,
            objects,
            source_type: SourceType::Unknown,
        })
    }

    fn import_dict(doc: &Value, validator: &dyn SchemaValidator) -> Result<Self, InventoryError> {
        validator.validate(doc)?;
        let map = doc.as_object().ok_or_else(|| SchemaError::Invalid {
            path:    String::new(),
            message: "inventory document is not an object".into(),
        })?;

        let declared = map
            .get(HeaderField::Count.as_str())
            .and_then(count_value)
            .unwrap_or(0);
        let found = schema::count_entries(map);
        if found == 0 || found as u64 != declared {
            return Err(InventoryError::RecordCountMismatch { declared, found });
        }
        schema::check_entry_keys(map, found)?;

        let mut objects = Vec::with_capacity(found);
        for i in 0..found {
            let key = i.to_string();
            let entry = map.get(&key).cloned().unwrap_or(Value::Null);
            let rec: InventoryRecord = serde_json::from_value(entry).map_err(|e| SchemaError::Invalid {
                path:    format!("/{key}"),
                message: e.to_string(),
            })?;
            objects.push(rec.expanded());
        }

        Ok(Self {
            project: header_str(map, HeaderField::Project),
            version: header_str(map, HeaderField::Version),
            objects,
            source_type: SourceType::Unknown,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub fn count(&self) -> usize {
        self.objects.len()
    }

    pub fn header(&self) -> Header {
        Header::new(self.project.clone(), self.version.clone())
    }

    /// Full plaintext inventory.  `contract` abbreviates each record the way
    /// Sphinx writes it to disk, `expand` spells every abbreviation out, and
    /// neither writes records as stored.  Asking for both is an error.
    pub fn data_file(&self, expand: bool, contract: bool) -> Result<Vec<u8>, RecordError> {
        let mut text = self.header().to_text();
        for rec in &self.objects {
            text.push_str(&rec.data_line(expand, contract)?);
            text.push('\n');
        }
        Ok(text.into_bytes())
    }

    /// Compressed on-disk form (always contracted).
    pub fn zlib_file(&self) -> Result<Vec<u8>, InventoryError> {
        Ok(codec::compress(&self.data_file(false, true)?)?)
    }

    /// Stream the on-disk form into `writer`.
    pub fn write_to<W: Write>(&self, writer: W, form: BodyForm) -> io::Result<W> {
        let header = self.header();
        let mut w = match form {
            BodyForm::Zlib  => InventoryWriter::zlib(writer, &header)?,
            BodyForm::Plain => InventoryWriter::plain(writer, &header)?,
        };
        for rec in &self.objects {
            w.write_record(rec)?;
        }
        w.finish()
    }

    /// Structured form; records are fully expanded.
    pub fn json_dict(&self) -> Value {
        let mut map = Map::new();
        map.insert(HeaderField::Project.as_str().into(), Value::String(self.project.clone()));
        map.insert(HeaderField::Version.as_str().into(), Value::String(self.version.clone()));
        map.insert(HeaderField::Count.as_str().into(), Value::from(self.count() as u64));
        for (i, rec) in self.objects.iter().enumerate() {
            map.insert(i.to_string(), record_json(&rec.expanded()));
        }
        Value::Object(map)
    }

    /// Fuzzy-match `name` against every object.
    pub fn suggest(&self, name: &str, opts: SuggestOptions) -> Result<Vec<Suggestion>, InventoryError> {
        if opts.threshold > 100 {
            return Err(InventoryError::InvalidThreshold(opts.threshold));
        }
        Ok(suggest::rank(&self.objects, name, opts))
    }
}

/// `count` as an integer; JSON Schema's "integer" also admits `2.0`.
fn count_value(v: &Value) -> Option<u64> {
    v.as_u64().or_else(|| {
        v.as_f64()
            .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
            .map(|f| f as u64)
    })
}

fn header_str(map: &Map<String, Value>, field: HeaderField) -> String {
    map.get(field.as_str())
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn record_json(rec: &InventoryRecord) -> Value {
    json!({
        "name":     rec.name,
        "domain":   rec.domain,
        "role":     rec.role,
        "priority": rec.priority,
        "uri":      rec.uri,
        "dispname": rec.dispname,
    })
}
