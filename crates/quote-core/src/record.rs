//! Core record types for quote tables

use serde::{Deserialize, Serialize};

/// Number of tag columns a quote row can carry
pub const TAG_SLOTS: usize = 8;

/// One decoded CSV row before tag filtering
///
/// A slot is `None` when its column is absent from the header or the row
/// is shorter than the header. Empty cells may arrive as `Some("")` or
/// `None` depending on the decoder; both are dropped by tag filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    /// Quote text, exactly as decoded
    pub quote: String,
    /// Tag slots 1 through 8
    pub tags: [Option<String>; TAG_SLOTS],
}

impl RawRow {
    /// Create a row with all tag slots absent
    pub fn new(quote: impl Into<String>) -> Self {
        Self {
            quote: quote.into(),
            tags: Default::default(),
        }
    }

    /// Create a row from a quote and up to eight tag slots
    ///
    /// Slots beyond the eighth are ignored.
    pub fn with_tags<I, S>(quote: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let mut row = Self::new(quote);
        for (slot, tag) in row.tags.iter_mut().zip(tags) {
            *slot = tag.map(Into::into);
        }
        row
    }

    /// Get a tag slot by 1-based slot number
    pub fn tag(&self, slot: usize) -> Option<&str> {
        slot.checked_sub(1)
            .and_then(|i| self.tags.get(i))
            .and_then(|t| t.as_deref())
    }
}

/// A quote with its filtered, ordered tags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub quote: String,
    pub tags: Vec<String>,
}

impl QuoteRecord {
    pub fn new(quote: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            quote: quote.into(),
            tags,
        }
    }

    /// Check whether the record carries a given tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Complete output of one conversion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    /// One record per input row, in input order
    pub records: Vec<QuoteRecord>,
    /// Distinct tags in first-seen order
    pub tag_index: Vec<String>,
}

impl ConversionResult {
    /// Get the number of records
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Get the number of distinct tags
    pub fn tag_count(&self) -> usize {
        self.tag_index.len()
    }

    /// Records carrying the given tag, in record order
    pub fn records_with_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a QuoteRecord> {
        self.records.iter().filter(move |r| r.has_tag(tag))
    }
}
