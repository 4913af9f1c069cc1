//! quote-core: Core library for converting tagged quote tables
//!
//! This library provides functionality to:
//! - Decode CSV quote tables into raw rows (two interchangeable backends)
//! - Filter each row's tag slots and build a deduplicated tag index
//! - Enumerate sources in a stable order, skipping empty slots
//! - Write complete conversion results to a destination store

pub mod config;
pub mod decoder;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod source;
pub mod store;
pub mod transform;

pub use config::ConvertConfig;
pub use decoder::{Decoder, DecoderKind, HeaderDecoder, HeaderNames, TypedDecoder};
pub use error::{DecodeError, Error, Result};
pub use pipeline::{run_config, ConversionSummary, Converter};
pub use record::{ConversionResult, QuoteRecord, RawRow, TAG_SLOTS};
pub use source::{Source, SourceList, SourceText};
pub use store::{DestinationStore, JsonAssetStore, MemoryStore, QuoteAsset};
pub use transform::{build_tag_index, filter_tags, transform};
