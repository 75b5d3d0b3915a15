//! Scoped substring search over archived records

use anyhow::{Context, Result};

use super::Scope;
use super::highlight::Matcher;
use crate::archive::{Archive, ScopedRecord};

/// A record that matched, with the resource it belongs to.
pub type SearchHit = ScopedRecord;

#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    /// Also match against record notes.
    pub include_notes: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            include_notes: true,
        }
    }
}

/// Records in `scope` whose source or target (and notes, when enabled)
/// contain `query` case-insensitively, shortest source first.
pub fn search(
    archive: &Archive,
    query: &str,
    scope: &Scope,
    options: SearchOptions,
) -> Result<Vec<SearchHit>> {
    let matcher = Matcher::new(query).context("Invalid search query")?;
    let mut hits = archive.matching_records(scope, matcher, options.include_notes)?;

    // Stable, so equal lengths keep insertion order.
    hits.sort_by_key(|hit| hit.record.source.chars().count());

    tracing::debug!("Search {:?} in {}: {} record(s) matched", query, scope, hits.len());

    Ok(hits)
}
