//! Destination stores for conversion results
//!
//! A store receives a complete [`ConversionResult`] and replaces whatever
//! it held before. Stores never see partial results.

use crate::error::{Error, Result};
use crate::record::{ConversionResult, QuoteRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Persistence target for conversion results
pub trait DestinationStore {
    /// Replace the store's contents with `result`
    fn write(&mut self, result: &ConversionResult) -> Result<()>;
}

/// On-disk layout of a quote table asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteAsset {
    /// When the asset was written
    pub generated_at: DateTime<Utc>,
    /// Quote entries in source order
    pub quote_infos: Vec<QuoteRecord>,
    /// Distinct tags in first-seen order
    pub total_tags: Vec<String>,
}

impl QuoteAsset {
    pub fn from_result(result: &ConversionResult) -> Self {
        Self {
            generated_at: Utc::now(),
            quote_infos: result.records.clone(),
            total_tags: result.tag_index.clone(),
        }
    }

    /// Convert back into a conversion result
    pub fn into_result(self) -> ConversionResult {
        ConversionResult {
            records: self.quote_infos,
            tag_index: self.total_tags,
        }
    }
}

/// Store writing a JSON asset file
#[derive(Debug, Clone)]
pub struct JsonAssetStore {
    path: PathBuf,
}

impl JsonAssetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load a previously written asset
    pub fn load<P: AsRef<Path>>(path: P) -> Result<QuoteAsset> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_temp(&self, temp: &Path, asset: &QuoteAsset) -> Result<()> {
        let store_err = |e: std::io::Error| Error::StoreWrite {
            path: self.path.clone(),
            source: e,
        };

        let file = File::create(temp).map_err(store_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, asset)?;
        writeln!(writer).map_err(store_err)?;
        writer.flush().map_err(store_err)?;
        Ok(())
    }
}

impl DestinationStore for JsonAssetStore {
    fn write(&mut self, result: &ConversionResult) -> Result<()> {
        if self.path.file_name().is_none() {
            return Err(Error::Config(format!(
                "destination '{}' is not a file path",
                self.path.display()
            )));
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::StoreWrite {
                path: self.path.clone(),
                source: e,
            })?;
        }

        // Write beside the target, then swap it in so readers never see a
        // half-written asset.
        let temp = self.temp_path();
        let asset = QuoteAsset::from_result(result);
        if let Err(e) = self.write_temp(&temp, &asset) {
            let _ = fs::remove_file(&temp);
            return Err(e);
        }
        fs::rename(&temp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp);
            Error::StoreWrite {
                path: self.path.clone(),
                source: e,
            }
        })?;

        debug!(path = %self.path.display(), "wrote asset");
        Ok(())
    }
}

/// Store keeping the last result in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    result: Option<ConversionResult>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last written result, if any
    pub fn result(&self) -> Option<&ConversionResult> {
        self.result.as_ref()
    }

    /// Number of successful writes
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl DestinationStore for MemoryStore {
    fn write(&mut self, result: &ConversionResult) -> Result<()> {
        self.result = Some(result.clone());
        self.writes += 1;
        Ok(())
    }
}
