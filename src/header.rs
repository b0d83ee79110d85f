//! The four-line preamble that opens every inventory, compressed or not.
//!
//! ```text
//! # Sphinx inventory version 2
//! # Project: <project>
//! # Version: <version>
//! # The remainder of this file is compressed using zlib.
//! ```
//!
//! The preamble is always stored as plain text; only the record body after
//! it is ever compressed.

use crate::record::ParseError;

pub const VERSION_PREFIX:  &str = "# Sphinx inventory version ";
pub const PROJECT_PREFIX:  &str = "# Project: ";
pub const VERSION_FIELD:   &str = "# Version: ";
pub const ZLIB_MARKER:     &str = "# The remainder of this file is compressed using zlib.";
/// The only inventory format version this crate reads or writes.
pub const FORMAT_VERSION:  &str = "2";
/// Number of lines making up the preamble.
pub const HEADER_LINES:    usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    pub project: String,
    pub version: String,
}

impl Header {
    pub fn new(project: impl Into<String>, version: impl Into<String>) -> Self {
        Self { project: project.into(), version: version.into() }
    }

    /// Render the preamble, one `\n`-terminated line each.
    pub fn to_lines(&self) -> Vec<String> {
        vec![
            format!("{VERSION_PREFIX}{FORMAT_VERSION}"),
            format!("{PROJECT_PREFIX}{}", self.project),
            format!("{VERSION_FIELD}{}", self.version),
            ZLIB_MARKER.to_string(),
        ]
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for line in self.to_lines() {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }

    /// Parse the preamble from the first four lines of an inventory.
    ///
    /// Any format version other than `2` is rejected outright.
    pub fn parse(lines: &[&str]) -> Result<Self, ParseError> {
        if lines.len() < HEADER_LINES {
            return Err(ParseError::TruncatedHeader(lines.len()));
        }

        let version_line = trim_cr(lines[0]);
        let format = version_line
            .strip_prefix(VERSION_PREFIX)
            .ok_or_else(|| ParseError::BadHeaderLine { line: 1, text: version_line.to_string() })?
            .trim();
        if format != FORMAT_VERSION {
            return Err(ParseError::UnsupportedVersion(format.to_string()));
        }

        let project = field(lines[1], PROJECT_PREFIX, 2)?;
        let version = field(lines[2], VERSION_FIELD, 3)?;

        let marker = lines[3].trim_end();
        if marker != ZLIB_MARKER {
            return Err(ParseError::BadHeaderLine { line: 4, text: marker.to_string() });
        }

        Ok(Self { project, version })
    }
}

fn field(line: &str, prefix: &str, lineno: usize) -> Result<String, ParseError> {
    let line = trim_cr(line);
    // An empty version is written as "# Version: " but editors often strip
    // the trailing space, so accept the bare label too.
    if let Some(rest) = line.strip_prefix(prefix) {
        return Ok(rest.to_string());
    }
    if line == prefix.trim_end() {
        return Ok(String::new());
    }
    Err(ParseError::BadHeaderLine { line: lineno, text: line.to_string() })
}

pub(crate) fn trim_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrip() {
        let h = Header::new("attrs", "22.1");
        let text = h.to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(Header::parse(&lines).unwrap(), h);
    }

    #[test]
    fn empty_version_is_allowed() {
        let lines = [
            "# Sphinx inventory version 2",
            "# Project: proj",
            "# Version:",
            ZLIB_MARKER,
        ];
        let h = Header::parse(&lines).unwrap();
        assert_eq!(h.version, "");
    }

    #[test]
    fn version_one_is_rejected() {
        let lines = [
            "# Sphinx inventory version 1",
            "# Project: proj",
            "# Version: 1.0",
            ZLIB_MARKER,
        ];
        match Header::parse(&lines) {
            Err(ParseError::UnsupportedVersion(v)) => assert_eq!(v, "1"),
            other => panic!("expected UnsupportedVersion, got {other:?}"),
        }
    }

    #[test]
    fn crlf_lines_are_tolerated() {
        let lines = [
            "# Sphinx inventory version 2\r",
            "# Project: proj\r",
            "# Version: 3.0\r",
            "# The remainder of this file is compressed using zlib.\r",
        ];
        let h = Header::parse(&lines).unwrap();
        assert_eq!(h, Header::new("proj", "3.0"));
    }

    #[test]
    fn fourth_line_must_be_the_zlib_marker() {
        let lines = [
            "# Sphinx inventory version 2",
            "# Project: proj",
            "# Version: 1.0",
            "# some other comment",
        ];
        match Header::parse(&lines) {
            Err(ParseError::BadHeaderLine { line, .. }) => assert_eq!(line, 4),
            other => panic!("expected BadHeaderLine, got {other:?}"),
        }
    }

    #[test]
    fn short_header_is_rejected() {
        let lines = ["# Sphinx inventory version 2", "# Project: proj"];
        assert!(matches!(Header::parse(&lines), Err(ParseError::TruncatedHeader(2))));
    }
}
