//! Conversion manifest files

use crate::decoder::{DecoderKind, HeaderNames};
use crate::error::{Error, Result};
use crate::source::{Source, SourceList};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A conversion run described as JSON
///
/// Relative paths are resolved against the manifest's directory when
/// loaded from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// CSV files in conversion order; `null` entries are skipped
    #[serde(default)]
    pub sources: Vec<Option<PathBuf>>,
    /// Directories whose CSV files follow the listed sources
    #[serde(default)]
    pub dirs: Vec<PathBuf>,
    /// Asset file to write
    pub destination: PathBuf,
    /// Decoder backend
    #[serde(default)]
    pub decoder: DecoderKind,
    /// Expected header names
    #[serde(default)]
    pub headers: HeaderNames,
}

impl ConvertConfig {
    /// Create a config with no sources
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            sources: Vec::new(),
            dirs: Vec::new(),
            destination: destination.into(),
            decoder: DecoderKind::default(),
            headers: HeaderNames::default(),
        }
    }

    /// Load a manifest from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut config: Self = serde_json::from_str(&content)?;
        config.validate()?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    /// Save the manifest to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Check the manifest can drive a run
    pub fn validate(&self) -> Result<()> {
        if self.destination.as_os_str().is_empty() {
            return Err(Error::Config("destination is empty".to_string()));
        }
        if self.headers.quote.trim().is_empty() {
            return Err(Error::Config("quote header name is empty".to_string()));
        }
        if let Some(slot) = self.headers.tags.iter().position(|t| t.trim().is_empty()) {
            return Err(Error::Config(format!("tag header name {} is empty", slot + 1)));
        }
        Ok(())
    }

    /// Make relative paths relative to `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        let join = |p: &Path| {
            if p.is_relative() {
                base.join(p)
            } else {
                p.to_path_buf()
            }
        };

        for source in self.sources.iter_mut().flatten() {
            *source = join(source.as_path());
        }
        for dir in &mut self.dirs {
            *dir = join(dir.as_path());
        }
        self.destination = join(&self.destination);
    }

    /// Sources in conversion order: listed files, then directories
    pub fn source_list(&self) -> SourceList {
        let files: SourceList = self
            .sources
            .iter()
            .map(|s| s.clone().map(Source::File))
            .collect();
        self.dirs.iter().fold(files, |list, dir| list.dir(dir))
    }
}
