//! Row-to-record transformation and tag index building

use crate::record::{ConversionResult, QuoteRecord, RawRow};
use std::collections::HashSet;

/// Transform decoded rows into quote records plus the run's tag index
///
/// Emits exactly one record per row, in input order. Never fails.
pub fn transform(rows: &[RawRow]) -> ConversionResult {
    let records: Vec<QuoteRecord> = rows
        .iter()
        .map(|row| QuoteRecord::new(row.quote.clone(), filter_tags(row)))
        .collect();

    let tag_index = build_tag_index(&records);

    ConversionResult { records, tag_index }
}

/// Keep the tag slots that hold something other than whitespace, in slot order
pub fn filter_tags(row: &RawRow) -> Vec<String> {
    row.tags
        .iter()
        .flatten()
        .filter(|t| !t.trim().is_empty())
        .cloned()
        .collect()
}

/// Distinct tags across all records in first-seen order
pub fn build_tag_index(records: &[QuoteRecord]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut index = Vec::new();

    for tag in records.iter().flat_map(|r| r.tags.iter()) {
        if seen.insert(tag.as_str()) {
            index.push(tag.clone());
        }
    }

    index
}
