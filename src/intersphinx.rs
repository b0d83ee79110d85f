//! Intersphinx mapping inference.
//!
//! Given the URL of some page in a hosted documentation set and the
//! inventory for that set, work out the base URL of the docs and whether the
//! inventory lives at the conventional `<base>/objects.inv`.
//!
//! URL pieces are split on the raw string the way `urlsplit` does it, since
//! object URIs are relative references that a full URL parser rejects.
//! Absolute page and inventory URLs are still checked with [`url::Url`].

use thiserror::Error;
use url::Url;

use crate::inventory::Inventory;
use crate::record::InventoryRecord;

pub const OBJECTS_INV: &str = "objects.inv";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntersphinxError {
    #[error("Malformed URL {url:?}: {message}")]
    InvalidUrl { url: String, message: String },
    #[error("No inventory object matches {url}")]
    NoMatchingObject { url: String },
}

// ── URL splitting ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UrlParts<'a> {
    pub scheme:   &'a str,
    pub netloc:   &'a str,
    pub path:     &'a str,
    pub query:    &'a str,
    pub fragment: &'a str,
}

fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

pub fn split_url(url: &str) -> UrlParts<'_> {
    let mut parts = UrlParts::default();
    let mut rest = url;

    if let Some(i) = rest.find(':') {
        if is_scheme(&rest[..i]) {
            parts.scheme = &rest[..i];
            rest = &rest[i + 1..];
        }
    }
    if let Some(after) = rest.strip_prefix("//") {
        let end = after.find(['/', '?', '#']).unwrap_or(after.len());
        parts.netloc = &after[..end];
        rest = &after[end..];
    }
    if let Some(i) = rest.find('#') {
        parts.fragment = &rest[i + 1..];
        rest = &rest[..i];
    }
    if let Some(i) = rest.find('?') {
        parts.query = &rest[i + 1..];
        rest = &rest[..i];
    }
    parts.path = rest;
    parts
}

/// Reduce a URL to `//netloc/path` (or just `path` for a relative one),
/// dropping query and fragment, and the scheme unless `with_scheme`.
pub fn strip_to_netloc_path(url: &str, with_scheme: bool) -> String {
    let p = split_url(url);
    let mut out = String::new();
    if with_scheme && !p.scheme.is_empty() {
        out.push_str(p.scheme);
        out.push(':');
    }
    if !p.netloc.is_empty() {
        out.push_str("//");
        out.push_str(p.netloc);
        if !p.path.is_empty() && !p.path.starts_with('/') {
            out.push('/');
        }
    }
    out.push_str(p.path);
    out
}

/// Directory URL containing a known inventory file.
pub fn extract_objectsinv_base(inventory_url: &str) -> String {
    let stripped = strip_to_netloc_path(inventory_url, true);
    match stripped.rfind('/') {
        Some(i) => stripped[..=i].to_string(),
        None    => String::new(),
    }
}

fn check_absolute(url: &str) -> Result<(), IntersphinxError> {
    Url::parse(url)
        .map(|_| ())
        .map_err(|e| IntersphinxError::InvalidUrl { url: url.to_string(), message: e.to_string() })
}

// ── Matching ─────────────────────────────────────────────────────────────────

/// If `rec`'s URI path is a suffix of `page` starting at a path segment,
/// return the part of `page` before it.
fn base_if_match<'p>(page: &'p str, rec: &InventoryRecord) -> Option<&'p str> {
    let uri = strip_to_netloc_path(&rec.uri_expanded(), false);
    if uri.is_empty() || uri.starts_with("//") {
        return None;
    }
    let base = page.strip_suffix(uri.as_str())?;
    (base.ends_with('/') || uri.starts_with('/')).then_some(base)
}

/// First object, in inventory order, whose URI the page URL ends with.
pub fn find_matching_object<'i>(page_url: &str, inventory: &'i Inventory) -> Result<&'i InventoryRecord, IntersphinxError> {
    check_absolute(page_url)?;
    let page = strip_to_netloc_path(page_url, true);
    inventory
        .objects
        .iter()
        .find(|rec| base_if_match(&page, rec).is_some())
        .ok_or_else(|| IntersphinxError::NoMatchingObject { url: page_url.to_string() })
}

/// Base URL of the documentation set that `page_url` belongs to.
pub fn base_url_from_page(page_url: &str, inventory: &Inventory) -> Result<String, IntersphinxError> {
    let rec = find_matching_object(page_url, inventory)?;
    let page = strip_to_netloc_path(page_url, true);
    let base = base_if_match(&page, rec)
        .ok_or_else(|| IntersphinxError::NoMatchingObject { url: page_url.to_string() })?;
    tracing::debug!(object = %rec.name, %base, "matched page URL to inventory object");
    Ok(base.to_string())
}

/// Infer an intersphinx mapping entry.
///
/// Returns the docs base URL, plus the inventory URL when it is not at the
/// default `<base>objects.inv` location (compared without scheme).
pub fn infer_mapping(
    page_url:      &str,
    inventory_url: &str,
    inventory:     &Inventory,
) -> Result<(String, Option<String>), IntersphinxError> {
    check_absolute(inventory_url)?;
    let base = base_url_from_page(page_url, inventory)?;

    let default_inv = strip_to_netloc_path(&format!("{base}{OBJECTS_INV}"), false);
    let actual_inv  = strip_to_netloc_path(inventory_url, false);

    if default_inv == actual_inv {
        Ok((base, None))
    } else {
        Ok((base, Some(inventory_url.to_string())))
    }
}
