//! Source enumeration for conversion runs

use crate::error::{DecodeError, Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A single CSV input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A CSV file on disk
    File(PathBuf),
    /// Every `*.csv` file under a directory, sorted by path
    Dir(PathBuf),
    /// In-memory CSV text
    Text { name: String, text: String },
}

impl Source {
    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Source::Text {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// A loaded source text ready for decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    /// Display name used in logs and errors
    pub name: String,
    pub text: String,
}

/// Ordered list of sources; `None` entries are skipped
#[derive(Debug, Clone, Default)]
pub struct SourceList {
    entries: Vec<Option<Source>>,
}

impl SourceList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source slot; `None` marks an unassigned slot
    pub fn push(&mut self, source: Option<Source>) {
        self.entries.push(source);
    }

    /// Append a file source
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.push(Some(Source::File(path.into())));
        self
    }

    /// Append a directory source
    pub fn dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.push(Some(Source::Dir(path.into())));
        self
    }

    /// Number of slots, including empty ones
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load every source in list order
    ///
    /// Directory sources expand in place. Files or directories that no
    /// longer exist are skipped with a warning, like empty slots. Fails on
    /// the first source that exists but cannot be read.
    pub fn load(&self) -> Result<Vec<SourceText>> {
        let mut texts = Vec::new();

        for (slot, entry) in self.entries.iter().enumerate() {
            let Some(source) = entry else {
                debug!(slot, "skipping empty source slot");
                continue;
            };

            match source {
                Source::File(path) if !path.is_file() => {
                    warn!(slot, source = %path.display(), "skipping missing source");
                }
                Source::Dir(path) if !path.is_dir() => {
                    warn!(slot, source = %path.display(), "skipping missing source");
                }
                Source::File(path) => texts.push(read_source(path)?),
                Source::Dir(path) => {
                    for file in scan_csv_files(path)? {
                        texts.push(read_source(&file)?);
                    }
                }
                Source::Text { name, text } => texts.push(SourceText {
                    name: name.clone(),
                    text: text.clone(),
                }),
            }
        }

        Ok(texts)
    }
}

impl FromIterator<Option<Source>> for SourceList {
    fn from_iter<I: IntoIterator<Item = Option<Source>>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Read a CSV file as UTF-8 text
pub fn read_source(path: &Path) -> Result<SourceText> {
    if !path.is_file() {
        return Err(Error::SourceNotFound(path.to_path_buf()));
    }

    let bytes = fs::read(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let name = path.display().to_string();
    let text = String::from_utf8(bytes).map_err(|e| DecodeError::Encoding {
        source_name: name.clone(),
        source: e,
    })?;

    debug!(source = %name, bytes = text.len(), "loaded source");
    Ok(SourceText { name, text })
}

/// Find `*.csv` files under a directory, sorted by path
pub fn scan_csv_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::SourceNotFound(root.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry?;
        let path = entry.path();

        if entry.file_type().is_file()
            && path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    debug!(root = %root.display(), count = files.len(), "scanned directory");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_slots_are_skipped() {
        let list: SourceList = vec![
            None,
            Some(Source::text("a", "quote\nx\n")),
            None,
            Some(Source::text("b", "quote\ny\n")),
        ]
        .into_iter()
        .collect();

        let texts = list.load().unwrap();
        let names: Vec<&str> = texts.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(list.len(), 4);
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_missing_paths_are_skipped() {
        let temp = TempDir::new().unwrap();
        let list = SourceList::new()
            .file(temp.path().join("nope.csv"))
            .dir(temp.path().join("gone"));

        assert_eq!(list.len(), 2);
        assert!(list.load().unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_between_good_sources() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("last.csv");
        fs::write(&file, "quote\nlast\n").unwrap();

        let mut list = SourceList::new();
        list.push(Some(Source::text("first", "quote\nfirst\n")));
        let list = list.file(temp.path().join("deleted.csv")).file(&file);

        let texts = list.load().unwrap();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0].name, "first");
        assert_eq!(texts[1].text, "quote\nlast\n");
    }

    #[test]
    fn test_read_source_requires_existing_file() {
        let temp = TempDir::new().unwrap();
        let err = read_source(&temp.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, Error::SourceNotFound(_)));
    }

    #[test]
    fn test_invalid_utf8_is_a_decode_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.csv");
        fs::write(&path, [0x71, 0xff, 0xfe, 0x0a]).unwrap();

        let err = read_source(&path).unwrap_err();
        assert!(matches!(err, Error::Decode(DecodeError::Encoding { .. })));
    }

    #[test]
    fn test_dir_expands_sorted_csv_files() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("b.csv"), "quote\nb\n").unwrap();
        fs::write(temp.path().join("a.csv"), "quote\na\n").unwrap();
        fs::write(temp.path().join("sub").join("c.CSV"), "quote\nc\n").unwrap();
        fs::write(temp.path().join("notes.txt"), "ignored").unwrap();

        let files = scan_csv_files(temp.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.csv", "b.csv", "c.CSV"]);
    }

    #[test]
    fn test_list_order_is_preserved_across_kinds() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("z.csv");
        fs::write(&file, "quote\nfile\n").unwrap();

        let mut list = SourceList::new();
        list.push(Some(Source::text("first", "quote\nmem\n")));
        let list = list.dir(temp.path().join("sub")).file(&file);
        fs::create_dir(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("sub").join("d.csv"), "quote\ndir\n").unwrap();

        let texts = list.load().unwrap();
        assert_eq!(texts.len(), 3);
        assert_eq!(texts[0].name, "first");
        assert_eq!(texts[1].text, "quote\ndir\n");
        assert_eq!(texts[2].text, "quote\nfile\n");
    }
}
