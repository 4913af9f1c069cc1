//! End-to-end conversion: load sources, decode, transform, store
//!
//! A run is all-or-nothing. Every source is decoded before the transform
//! runs, and the store is only touched once the full result exists.

use crate::config::ConvertConfig;
use crate::decoder::{Decoder, DecoderKind, HeaderNames};
use crate::error::Result;
use crate::record::{ConversionResult, RawRow};
use crate::source::{SourceList, SourceText};
use crate::store::{DestinationStore, JsonAssetStore};
use crate::transform::transform;
use serde::Serialize;
use tracing::{debug, error, info};

/// Counts reported after a successful run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConversionSummary {
    /// Sources that were decoded
    pub sources: usize,
    /// Records written
    pub records: usize,
    /// Distinct tags written
    pub tags: usize,
}

/// Drives conversion runs with a chosen decoder
pub struct Converter {
    decoder: Box<dyn Decoder>,
}

impl Converter {
    pub fn new(decoder: Box<dyn Decoder>) -> Self {
        Self { decoder }
    }

    /// Converter for a decoder backend and header layout
    pub fn with_kind(kind: DecoderKind, headers: HeaderNames) -> Self {
        Self::new(kind.build(headers))
    }

    /// Decode every text and concatenate rows in text order
    pub fn decode_all(&self, texts: &[SourceText]) -> Result<Vec<RawRow>> {
        let mut rows = Vec::new();
        for source in texts {
            let decoded = self.decoder.decode(&source.text, &source.name)?;
            debug!(source = %source.name, rows = decoded.len(), "decoded source");
            rows.extend(decoded);
        }
        Ok(rows)
    }

    /// Decode and transform already-loaded texts
    pub fn convert_texts(&self, texts: &[SourceText]) -> Result<ConversionResult> {
        let rows = self.decode_all(texts)?;
        Ok(transform(&rows))
    }

    /// Run a full conversion into `store`
    ///
    /// On failure the store is left untouched and the error is logged
    /// before being returned.
    pub fn run<S>(&self, sources: &SourceList, store: &mut S) -> Result<ConversionSummary>
    where
        S: DestinationStore + ?Sized,
    {
        match self.try_run(sources, store) {
            Ok(summary) => {
                info!(
                    sources = summary.sources,
                    records = summary.records,
                    tags = summary.tags,
                    "Convert completed"
                );
                Ok(summary)
            }
            Err(e) => {
                error!(error = %e, "Convert failed");
                Err(e)
            }
        }
    }

    fn try_run<S>(&self, sources: &SourceList, store: &mut S) -> Result<ConversionSummary>
    where
        S: DestinationStore + ?Sized,
    {
        let texts = sources.load()?;
        let result = self.convert_texts(&texts)?;
        store.write(&result)?;

        Ok(ConversionSummary {
            sources: texts.len(),
            records: result.record_count(),
            tags: result.tag_count(),
        })
    }
}

/// Run the conversion a manifest describes, writing a JSON asset
pub fn run_config(config: &ConvertConfig) -> Result<ConversionSummary> {
    config.validate()?;
    let converter = Converter::with_kind(config.decoder, config.headers.clone());
    let mut store = JsonAssetStore::new(&config.destination);
    debug!(destination = %store.path().display(), decoder = %config.decoder, "starting run");
    converter.run(&config.source_list(), &mut store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeError, Error};
    use crate::source::Source;
    use crate::store::MemoryStore;
    use std::fs;
    use tempfile::TempDir;

    const SOURCE_A: &str = "quote,tag1,tag2\na1,x,y\na2,y,z\n";
    const SOURCE_B: &str = "quote,tag1\nb1,x\nb2,\nb3,w\n";

    fn converter() -> Converter {
        Converter::with_kind(DecoderKind::Headers, HeaderNames::english())
    }

    #[test]
    fn test_sources_concatenate_in_list_order() {
        let sources: SourceList = vec![
            Some(Source::text("a.csv", SOURCE_A)),
            None,
            Some(Source::text("b.csv", SOURCE_B)),
        ]
        .into_iter()
        .collect();
        let mut store = MemoryStore::new();

        let summary = converter().run(&sources, &mut store).unwrap();
        let result = store.result().unwrap();

        assert_eq!(summary.sources, 2);
        assert_eq!(result.records.len(), 5);
        let quotes: Vec<&str> = result.records.iter().map(|r| r.quote.as_str()).collect();
        assert_eq!(quotes, vec!["a1", "a2", "b1", "b2", "b3"]);
        assert_eq!(result.tag_index, vec!["x", "y", "z", "w"]);
        assert!(result.records[3].tags.is_empty());
    }

    #[test]
    fn test_no_sources_writes_empty_result() {
        let mut store = MemoryStore::new();
        let summary = converter().run(&SourceList::new(), &mut store).unwrap();

        assert_eq!(summary, ConversionSummary::default());
        assert_eq!(store.result(), Some(&ConversionResult::default()));
    }

    #[test]
    fn test_decode_failure_leaves_store_untouched() {
        let sources: SourceList = vec![
            Some(Source::text("good.csv", SOURCE_A)),
            Some(Source::text("bad.csv", "text,tag1\nnope,x\n")),
        ]
        .into_iter()
        .collect();
        let mut store = MemoryStore::new();

        let err = converter().run(&sources, &mut store).unwrap_err();

        assert!(matches!(
            err,
            Error::Decode(DecodeError::MissingHeader { ref source_name, .. }) if source_name == "bad.csv"
        ));
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn test_deleted_source_file_is_skipped() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.csv"), SOURCE_A).unwrap();
        fs::write(temp.path().join("b.csv"), SOURCE_B).unwrap();

        let mut config = ConvertConfig::new(temp.path().join("quotes.json"));
        config.sources = vec![
            Some(temp.path().join("a.csv")),
            Some(temp.path().join("deleted.csv")),
            Some(temp.path().join("b.csv")),
        ];
        config.headers = HeaderNames::english();

        let summary = run_config(&config).unwrap();
        assert_eq!(summary.sources, 2);
        assert_eq!(summary.records, 5);

        let asset = JsonAssetStore::load(&config.destination).unwrap();
        assert_eq!(asset.quote_infos[0].quote, "a1");
        assert_eq!(asset.quote_infos[4].quote, "b3");
    }

    #[test]
    fn test_backends_agree_after_transform() {
        let texts = vec![SourceText {
            name: "a.csv".to_string(),
            text: SOURCE_B.to_string(),
        }];

        let headers = converter().convert_texts(&texts).unwrap();
        let typed = Converter::with_kind(DecoderKind::Typed, HeaderNames::english())
            .convert_texts(&texts)
            .unwrap();

        assert_eq!(headers, typed);
    }

    #[test]
    fn test_run_config_writes_asset() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.csv"), SOURCE_A).unwrap();
        fs::write(temp.path().join("b.csv"), SOURCE_B).unwrap();

        let mut config = ConvertConfig::new(temp.path().join("out").join("quotes.json"));
        config.sources = vec![
            Some(temp.path().join("b.csv")),
            None,
            Some(temp.path().join("a.csv")),
        ];
        config.headers = HeaderNames::english();

        let summary = run_config(&config).unwrap();
        assert_eq!(summary.records, 5);

        let asset = JsonAssetStore::load(&config.destination).unwrap();
        assert_eq!(asset.quote_infos[0].quote, "b1");
        assert_eq!(asset.total_tags, vec!["x", "w", "y", "z"]);
    }

    #[test]
    fn test_failed_run_keeps_previous_asset() {
        let temp = TempDir::new().unwrap();
        let destination = temp.path().join("quotes.json");
        fs::write(temp.path().join("a.csv"), SOURCE_A).unwrap();

        let mut config = ConvertConfig::new(&destination);
        config.sources = vec![Some(temp.path().join("a.csv"))];
        config.headers = HeaderNames::english();
        run_config(&config).unwrap();
        let before = fs::read_to_string(&destination).unwrap();

        fs::write(temp.path().join("bad.csv"), "text,tag1\nnope,x\n").unwrap();
        config.sources.push(Some(temp.path().join("bad.csv")));
        let err = run_config(&config).unwrap_err();
        assert!(matches!(err, Error::Decode(DecodeError::MissingHeader { .. })));

        assert_eq!(fs::read_to_string(&destination).unwrap(), before);
    }
}
