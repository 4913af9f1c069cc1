//! CSV decoders producing raw quote rows
//!
//! Two backends share the [`Decoder`] trait:
//! - [`HeaderDecoder`] resolves column positions from the header row and
//!   reads each `csv::StringRecord` by index
//! - [`TypedDecoder`] renames the header row to canonical field names and
//!   deserializes every record with serde

use crate::error::DecodeError;
use crate::record::{RawRow, TAG_SLOTS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// English column names accepted regardless of configuration
const QUOTE_ALIAS: &str = "quote";
const TAG_ALIAS_PREFIX: &str = "tag";

/// Capability to turn CSV text into raw rows
pub trait Decoder {
    /// Decode `text`; `source_name` is only used in error messages
    fn decode(&self, text: &str, source_name: &str) -> Result<Vec<RawRow>, DecodeError>;
}

/// Column names expected in the header row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderNames {
    /// Name of the quote column
    pub quote: String,
    /// Names of tag columns 1 through 8
    pub tags: [String; TAG_SLOTS],
}

impl Default for HeaderNames {
    fn default() -> Self {
        Self {
            quote: "セリフ".to_string(),
            tags: std::array::from_fn(|i| format!("タグ{}", i + 1)),
        }
    }
}

impl HeaderNames {
    /// Header names using the English aliases only
    #[cfg(test)]
    pub(crate) fn english() -> Self {
        Self {
            quote: QUOTE_ALIAS.to_string(),
            tags: std::array::from_fn(|i| format!("{}{}", TAG_ALIAS_PREFIX, i + 1)),
        }
    }

    fn is_quote(&self, header: &str) -> bool {
        let header = header.trim();
        header == self.quote || header.eq_ignore_ascii_case(QUOTE_ALIAS)
    }

    /// 0-based tag slot for a header cell, if it names one
    fn tag_slot(&self, header: &str) -> Option<usize> {
        let header = header.trim();
        if let Some(slot) = self.tags.iter().position(|t| t == header) {
            return Some(slot);
        }

        let prefix = header.get(..TAG_ALIAS_PREFIX.len())?;
        if !prefix.eq_ignore_ascii_case(TAG_ALIAS_PREFIX) {
            return None;
        }
        match header[TAG_ALIAS_PREFIX.len()..].parse::<usize>() {
            Ok(n) if (1..=TAG_SLOTS).contains(&n) => Some(n - 1),
            _ => None,
        }
    }

    /// Resolve column positions from a header record
    fn resolve(
        &self,
        headers: &csv::StringRecord,
        source_name: &str,
    ) -> Result<ColumnMap, DecodeError> {
        if headers.is_empty() {
            return Err(DecodeError::EmptyHeader {
                source_name: source_name.to_string(),
            });
        }

        let mut map = ColumnMap::default();
        for (idx, name) in headers.iter().enumerate() {
            if map.quote.is_none() && self.is_quote(name) {
                map.quote = Some(idx);
            } else if let Some(slot) = self.tag_slot(name) {
                // First matching column wins
                map.tags[slot].get_or_insert(idx);
            }
        }

        if map.quote.is_none() {
            return Err(DecodeError::MissingHeader {
                source_name: source_name.to_string(),
                column: self.quote.clone(),
            });
        }

        Ok(map)
    }
}

/// Header positions of the quote and tag columns
#[derive(Debug, Default)]
struct ColumnMap {
    quote: Option<usize>,
    tags: [Option<usize>; TAG_SLOTS],
}

fn csv_reader(text: &str) -> csv::Reader<&[u8]> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // Allow short rows; missing cells become absent slots
        .from_reader(text.as_bytes())
}

fn csv_error(source_name: &str, source: csv::Error) -> DecodeError {
    DecodeError::Csv {
        source_name: source_name.to_string(),
        source,
    }
}

/// Decoder reading fields by resolved header position
#[derive(Debug, Clone, Default)]
pub struct HeaderDecoder {
    headers: HeaderNames,
}

impl HeaderDecoder {
    pub fn new(headers: HeaderNames) -> Self {
        Self { headers }
    }
}

impl Decoder for HeaderDecoder {
    fn decode(&self, text: &str, source_name: &str) -> Result<Vec<RawRow>, DecodeError> {
        let mut reader = csv_reader(text);
        let header_record = reader
            .headers()
            .map_err(|e| csv_error(source_name, e))?
            .clone();
        let columns = self.headers.resolve(&header_record, source_name)?;

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| csv_error(source_name, e))?;

            let quote = columns
                .quote
                .and_then(|i| record.get(i))
                .unwrap_or_default()
                .to_string();

            let mut row = RawRow::new(quote);
            for (slot, column) in row.tags.iter_mut().zip(columns.tags.iter()) {
                *slot = column.and_then(|i| record.get(i)).map(str::to_string);
            }
            rows.push(row);
        }

        Ok(rows)
    }
}

/// Serde view of a quote row under canonical header names
#[derive(Debug, Deserialize)]
struct TypedRow {
    #[serde(default)]
    quote: String,
    #[serde(default)]
    tag1: Option<String>,
    #[serde(default)]
    tag2: Option<String>,
    #[serde(default)]
    tag3: Option<String>,
    #[serde(default)]
    tag4: Option<String>,
    #[serde(default)]
    tag5: Option<String>,
    #[serde(default)]
    tag6: Option<String>,
    #[serde(default)]
    tag7: Option<String>,
    #[serde(default)]
    tag8: Option<String>,
}

impl From<TypedRow> for RawRow {
    fn from(row: TypedRow) -> Self {
        RawRow {
            quote: row.quote,
            tags: [
                row.tag1, row.tag2, row.tag3, row.tag4, row.tag5, row.tag6, row.tag7, row.tag8,
            ],
        }
    }
}

/// Decoder deserializing each record into a typed row
///
/// Empty tag cells deserialize to `None` rather than `Some("")`.
#[derive(Debug, Clone, Default)]
pub struct TypedDecoder {
    headers: HeaderNames,
}

impl TypedDecoder {
    pub fn new(headers: HeaderNames) -> Self {
        Self { headers }
    }
}

impl Decoder for TypedDecoder {
    fn decode(&self, text: &str, source_name: &str) -> Result<Vec<RawRow>, DecodeError> {
        let mut reader = csv_reader(text);
        let original = reader
            .headers()
            .map_err(|e| csv_error(source_name, e))?
            .clone();
        let columns = self.headers.resolve(&original, source_name)?;

        // Rename recognised columns so serde sees canonical field names;
        // anything else gets a name no field matches.
        let mut canonical: Vec<String> = (0..original.len())
            .map(|i| format!("__ignored{}", i))
            .collect();
        if let Some(i) = columns.quote {
            canonical[i] = QUOTE_ALIAS.to_string();
        }
        for (slot, column) in columns.tags.iter().enumerate() {
            if let Some(i) = column {
                canonical[*i] = format!("{}{}", TAG_ALIAS_PREFIX, slot + 1);
            }
        }
        let canonical = csv::StringRecord::from(canonical);

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| csv_error(source_name, e))?;
            // Short rows only see the headers they reach
            let headers: csv::StringRecord = canonical.iter().take(record.len()).collect();
            let typed: TypedRow = record
                .deserialize(Some(&headers))
                .map_err(|e| csv_error(source_name, e))?;
            rows.push(typed.into());
        }

        Ok(rows)
    }
}

/// Selects one of the decoder backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoderKind {
    #[default]
    Headers,
    Typed,
}

impl DecoderKind {
    /// Build the selected decoder for the given header names
    pub fn build(self, headers: HeaderNames) -> Box<dyn Decoder> {
        match self {
            DecoderKind::Headers => Box::new(HeaderDecoder::new(headers)),
            DecoderKind::Typed => Box::new(TypedDecoder::new(headers)),
        }
    }
}

impl fmt::Display for DecoderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecoderKind::Headers => write!(f, "headers"),
            DecoderKind::Typed => write!(f, "typed"),
        }
    }
}

impl FromStr for DecoderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "headers" => Ok(DecoderKind::Headers),
            "typed" => Ok(DecoderKind::Typed),
            other => Err(format!(
                "unknown decoder '{}', expected 'headers' or 'typed'",
                other
            )),
        }
    }
}
