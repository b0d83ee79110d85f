//! Fuzzy lookup of inventory objects by approximate name.
//!
//! Each record gets a searchable string (its reST cross-reference, plus the
//! display name when that says something the name does not).  A query is
//! scored against that string, the bare name and the display name with
//! normalized Levenshtein similarity; the best of the three, scaled to
//! 0-100, is the record's score.

use crate::record::InventoryRecord;

pub const DEFAULT_SUGGEST_THRESHOLD: u8 = 75;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestOptions {
    pub threshold:  u8,
    pub with_score: bool,
    pub with_index: bool,
}

impl Default for SuggestOptions {
    fn default() -> Self {
        Self {
            threshold:  DEFAULT_SUGGEST_THRESHOLD,
            with_score: false,
            with_index: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub rst:   String,
    pub score: Option<u8>,
    pub index: Option<usize>,
}

pub fn searchable_string(rec: &InventoryRecord) -> String {
    let disp = rec.dispname_expanded();
    if disp == rec.name {
        rec.rst_string()
    } else {
        format!("{} {}", rec.rst_string(), disp)
    }
}

fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

pub fn score(query: &str, rec: &InventoryRecord) -> u8 {
    let q = query.to_lowercase();
    let best = [
        searchable_string(rec),
        rec.name.clone(),
        rec.dispname_expanded(),
    ]
    .iter()
    .map(|s| similarity(&q, &s.to_lowercase()))
    .fold(0.0_f64, f64::max);
    (best * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Score every record and keep those at or above the threshold, best first.
/// Equal scores keep their original inventory order.
pub fn rank(records: &[InventoryRecord], query: &str, opts: SuggestOptions) -> Vec<Suggestion> {
    let mut hits: Vec<(usize, u8)> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (i, score(query, r)))
        .filter(|(_, s)| *s >= opts.threshold)
        .collect();
    hits.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    hits.into_iter()
        .map(|(i, s)| Suggestion {
            rst:   records[i].rst_string(),
            score: opts.with_score.then_some(s),
            index: opts.with_index.then_some(i),
        })
        .collect()
}
