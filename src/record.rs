//! One inventory object and its plaintext data-line form.
//!
//! A data line is `name domain:role priority uri dispname`, where `name`
//! may contain spaces and `dispname` runs to the end of the line.  Sphinx
//! shortens lines with two abbreviations:
//!
//! - a trailing `$` in `uri` stands for `name`;
//! - a `dispname` of `-` stands for `name`.
//!
//! This crate additionally writes a trailing `$` in `dispname` for the part
//! of `name` after its last `.`, when the dispname ends at that dot boundary.
//!
//! A name that itself ends in `$` is never abbreviated in `uri`, and a URI
//! already ending in such a name is left alone on expansion.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Placeholder standing in for (part of) the object name.
pub const PLACEHOLDER: char = '$';
/// Dispname meaning "same as name".
pub const DISPNAME_SAME: &str = "-";

const DATA_LINE_PATTERN: &str = r"^(?P<name>.+?)\s+(?P<domain>[^\s:]+):(?P<role>\S+)\s+(?P<priority>-?\d+)\s+?(?P<uri>\S*)\s+(?P<dispname>.+?)\r?$";

fn data_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DATA_LINE_PATTERN).expect("data line pattern is valid"))
}

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Data line has too few fields ({found} of 5): {line:?}")]
    TooFewFields { found: usize, line: String },
    #[error("Data line has no domain:role field: {0:?}")]
    MissingRoleSeparator(String),
    #[error("Malformed data line: {0:?}")]
    MalformedLine(String),
    #[error("Inventory header truncated after {0} line(s)")]
    TruncatedHeader(usize),
    #[error("Bad header line {line}: {text:?}")]
    BadHeaderLine { line: usize, text: String },
    #[error("Unsupported inventory version: {0} (only version 2 is supported)")]
    UnsupportedVersion(String),
    #[error("Inventory text is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("expand and contract are mutually exclusive")]
    ConflictingTransforms,
}

// ── InventoryRecord ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub name:     String,
    pub domain:   String,
    pub role:     String,
    pub priority: String,
    pub uri:      String,
    pub dispname: String,
}

impl InventoryRecord {
    pub fn new(
        name:     impl Into<String>,
        domain:   impl Into<String>,
        role:     impl Into<String>,
        priority: impl Into<String>,
        uri:      impl Into<String>,
        dispname: impl Into<String>,
    ) -> Self {
        Self {
            name:     name.into(),
            domain:   domain.into(),
            role:     role.into(),
            priority: priority.into(),
            uri:      uri.into(),
            dispname: dispname.into(),
        }
    }

    /// The part of `name` after its last `.`, or all of it.
    pub fn name_tail(&self) -> &str {
        match self.name.rfind('.') {
            Some(i) => &self.name[i + 1..],
            None    => &self.name,
        }
    }

    /// Resolve a trailing `$`.  For a name that itself ends in `$`, a URI
    /// already ending in the name counts as expanded.
    pub fn uri_expanded(&self) -> String {
        if self.name.ends_with(PLACEHOLDER) && self.uri.ends_with(self.name.as_str()) {
            return self.uri.clone();
        }
        match self.uri.strip_suffix(PLACEHOLDER) {
            Some(stem) => format!("{stem}{}", self.name),
            None       => self.uri.clone(),
        }
    }

    pub fn uri_contracted(&self) -> String {
        if self.name.is_empty() || self.uri.ends_with(PLACEHOLDER) {
            return self.uri.clone();
        }
        match self.uri.strip_suffix(self.name.as_str()) {
            Some(stem) => format!("{stem}{PLACEHOLDER}"),
            None       => self.uri.clone(),
        }
    }

    pub fn dispname_expanded(&self) -> String {
        if self.dispname == DISPNAME_SAME {
            return self.name.clone();
        }
        match self.dispname.strip_suffix(PLACEHOLDER) {
            Some(stem) if stem.is_empty() || stem.ends_with('.') => {
                format!("{stem}{}", self.name_tail())
            }
            _ => self.dispname.clone(),
        }
    }

    pub fn dispname_contracted(&self) -> String {
        if self.dispname == self.name {
            return DISPNAME_SAME.to_string();
        }
        if self.dispname == DISPNAME_SAME || self.dispname.ends_with(PLACEHOLDER) {
            return self.dispname.clone();
        }
        let tail = self.name_tail();
        if tail.is_empty() {
            return self.dispname.clone();
        }
        match self.dispname.strip_suffix(tail) {
            Some(stem) if stem.is_empty() || stem.ends_with('.') => format!("{stem}{PLACEHOLDER}"),
            _ => self.dispname.clone(),
        }
    }

    /// Copy with every abbreviation resolved.
    pub fn expanded(&self) -> Self {
        Self {
            uri:      self.uri_expanded(),
            dispname: self.dispname_expanded(),
            ..self.clone()
        }
    }

    /// Copy with every abbreviation applied.
    pub fn contracted(&self) -> Self {
        Self {
            uri:      self.uri_contracted(),
            dispname: self.dispname_contracted(),
            ..self.clone()
        }
    }

    /// Render as a data line, optionally expanding or contracting first.
    pub fn data_line(&self, expand: bool, contract: bool) -> Result<String, RecordError> {
        match (expand, contract) {
            (true, true)   => Err(RecordError::ConflictingTransforms),
            (true, false)  => Ok(encode_line(&self.expanded())),
            (false, true)  => Ok(encode_line(&self.contracted())),
            (false, false) => Ok(encode_line(self)),
        }
    }

    /// reST cross-reference form, e.g. ``:py:function:`pkg.func` ``.
    pub fn rst_string(&self) -> String {
        format!(":{}:{}:`{}`", self.domain, self.role, self.name)
    }
}

// ── Line codec ───────────────────────────────────────────────────────────────

/// Parse one data line.  Abbreviations are kept as written.
pub fn decode_line(line: &str) -> Result<InventoryRecord, ParseError> {
    let Some(caps) = data_line_regex().captures(line) else {
        return Err(diagnose(line));
    };
    Ok(InventoryRecord {
        name:     caps["name"].to_string(),
        domain:   caps["domain"].to_string(),
        role:     caps["role"].to_string(),
        priority: caps["priority"].to_string(),
        uri:      caps["uri"].to_string(),
        dispname: caps["dispname"].to_string(),
    })
}

fn diagnose(line: &str) -> ParseError {
    let found = line.split_whitespace().count();
    if found < 5 {
        ParseError::TooFewFields { found, line: line.to_string() }
    } else if !line.split_whitespace().skip(1).any(|tok| tok.contains(':')) {
        ParseError::MissingRoleSeparator(line.to_string())
    } else {
        ParseError::MalformedLine(line.to_string())
    }
}

/// Serialize fields exactly as stored; no abbreviation is applied.
pub fn encode_line(record: &InventoryRecord) -> String {
    format!(
        "{} {}:{} {} {} {}",
        record.name, record.domain, record.role, record.priority, record.uri, record.dispname,
    )
}

pub fn expand(record: &InventoryRecord) -> InventoryRecord {
    record.expanded()
}

pub fn contract(record: &InventoryRecord) -> InventoryRecord {
    record.contracted()
}
