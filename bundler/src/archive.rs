//! # Archive Utilities
//!
//! An in-memory zip archive modelled as an ordered map from entry path to
//! contents. Directory entries are not kept: a folder exists when at least
//! one entry lives under it.
//!
//! Serialization is deterministic: entries are written in path order, with
//! fixed compression and a fixed modification time, so identical archives
//! always produce identical bytes.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};

use serde_json::Value;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::error::{Error, malformed};
use crate::{Result, patch};

/// An editable archive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Archive {
    entries: BTreeMap<String, Vec<u8>>,
}

impl Archive {
    /// Create an empty archive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read an archive from zip-encoded bytes.
    ///
    /// # Errors
    ///
    /// Returns an `Error::Packaging` error if the bytes are not a readable zip
    /// archive.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut zip = ZipArchive::new(Cursor::new(bytes))?;
        let mut entries = BTreeMap::new();

        for i in 0..zip.len() {
            let mut file = zip.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let mut contents = Vec::with_capacity(usize::try_from(file.size()).unwrap_or_default());
            file.read_to_end(&mut contents)
                .map_err(|e| Error::Packaging(format!("cannot read {}: {e}", file.name())))?;
            entries.insert(file.name().to_string(), contents);
        }

        Ok(Self { entries })
    }

    /// Serialize the archive as zip-encoded bytes.
    ///
    /// # Errors
    ///
    /// Returns an `Error::Packaging` error if the archive cannot be written.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (path, contents) in &self.entries {
            zip.start_file(path.as_str(), entry_options())?;
            zip.write_all(contents)
                .map_err(|e| Error::Packaging(format!("cannot write {path}: {e}")))?;
        }
        Ok(zip.finish()?.into_inner())
    }

    /// Remove the single top-level directory wrapping every entry, as found
    /// in source-hosting archives (`project-main/...`). Archives with more
    /// than one top-level item are returned unchanged.
    #[must_use]
    pub fn strip_root(self) -> Self {
        let Some(root) = self.entries.keys().next().and_then(|p| p.split_once('/')).map(|(r, _)| r)
        else {
            return self;
        };
        let prefix = format!("{root}/");
        if !self.entries.keys().all(|p| p.starts_with(&prefix)) {
            return self;
        }
        let entries = self
            .entries
            .into_iter()
            .filter_map(|(path, contents)| {
                path.strip_prefix(&prefix).map(|p| (p.to_string(), contents))
            })
            .collect();
        Self { entries }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry paths, in order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Names of the folders at the archive root.
    #[must_use]
    pub fn top_level_folders(&self) -> Vec<&str> {
        let mut folders =
            self.entries.keys().filter_map(|p| p.split_once('/')).map(|(f, _)| f).collect::<Vec<_>>();
        folders.dedup();
        folders
    }

    /// Whether an entry exists at `path`.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Whether any entry lives under the folder `prefix`.
    #[must_use]
    pub fn has_folder(&self, prefix: &str) -> bool {
        let prefix = folder_prefix(prefix);
        self.entries.keys().any(|p| p.starts_with(&prefix))
    }

    /// Raw contents of an entry.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    /// The first entry (in path order) whose path contains `fragment`.
    ///
    /// # Errors
    ///
    /// Returns an `Error::MissingTemplateEntry` error if no path matches.
    pub fn find_by_fragment(&self, fragment: &str) -> Result<&str> {
        self.paths()
            .find(|p| p.contains(fragment))
            .ok_or_else(|| Error::MissingTemplateEntry(format!("no entry matching `{fragment}`")))
    }

    /// Contents of an entry as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns an `Error::MissingTemplateEntry` error if the entry does not
    /// exist, or an `Error::MalformedTemplate` error if it is not UTF-8.
    pub fn read_text(&self, path: &str) -> Result<String> {
        let contents = self.entries.get(path).ok_or_else(|| missing(path))?;
        String::from_utf8(contents.clone()).map_err(|e| malformed!("{path} is not UTF-8 text: {e}"))
    }

    /// Replace a JSON entry with a transformed copy of itself, substituting
    /// `placeholders` in its text before parsing. See [`patch::patch`].
    ///
    /// # Errors
    ///
    /// Returns an `Error::MissingTemplateEntry` error if the entry does not
    /// exist, an `Error::MalformedTemplate` error if it is not JSON, or the
    /// error returned by `transform`.
    pub fn replace_json(
        &mut self, path: &str, placeholders: &[(&str, &str)], indent: usize,
        transform: impl FnOnce(Value) -> Result<Value>,
    ) -> Result<()> {
        let source = self.read_text(path)?;
        let patched = patch::patch(&source, placeholders, indent, transform)
            .map_err(|e| in_entry(path, e))?;
        self.add_entry(path, patched);
        Ok(())
    }

    /// Replace a text entry with a transformed copy of itself.
    ///
    /// # Errors
    ///
    /// Returns an `Error::MissingTemplateEntry` error if the entry does not
    /// exist, or the error returned by `transform`.
    pub fn replace_text(
        &mut self, path: &str, transform: impl FnOnce(&str) -> Result<String>,
    ) -> Result<()> {
        let source = self.read_text(path)?;
        let replaced = transform(&source).map_err(|e| in_entry(path, e))?;
        self.add_entry(path, replaced);
        Ok(())
    }

    /// Copy the text entry at `from` to `to`, applying `transform` to its
    /// contents.
    ///
    /// # Errors
    ///
    /// Returns an `Error::MissingTemplateEntry` error if `from` does not
    /// exist, or the error returned by `transform`.
    pub fn copy_with_transform(
        &mut self, from: &str, to: &str, transform: impl FnOnce(&str) -> Result<String>,
    ) -> Result<()> {
        let source = self.read_text(from)?;
        let copied = transform(&source).map_err(|e| in_entry(from, e))?;
        self.add_entry(to, copied);
        Ok(())
    }

    /// Copy the entry at `from` to `to` unchanged.
    ///
    /// # Errors
    ///
    /// Returns an `Error::MissingTemplateEntry` error if `from` does not
    /// exist.
    pub fn copy_entry(&mut self, from: &str, to: &str) -> Result<()> {
        let contents = self.entries.get(from).ok_or_else(|| missing(from))?.clone();
        self.entries.insert(to.to_string(), contents);
        Ok(())
    }

    /// Add (or overwrite) an entry.
    pub fn add_entry(&mut self, path: &str, contents: impl Into<Vec<u8>>) {
        self.entries.insert(path.to_string(), contents.into());
    }

    /// Delete an entry, returning whether it existed.
    pub fn delete_entry(&mut self, path: &str) -> bool {
        self.entries.remove(path).is_some()
    }

    /// Delete every entry under the folder `prefix`, returning the number of
    /// entries removed.
    pub fn delete_folder(&mut self, prefix: &str) -> usize {
        let prefix = folder_prefix(prefix);
        let before = self.entries.len();
        self.entries.retain(|p, _| !p.starts_with(&prefix));
        before - self.entries.len()
    }

    /// Add every entry of `child` under the folder `prefix`.
    pub fn merge_as_subfolder(&mut self, child: Self, prefix: &str) {
        let prefix = folder_prefix(prefix);
        for (path, contents) in child.entries {
            self.entries.insert(format!("{prefix}{path}"), contents);
        }
    }
}

// Fixed compression and timestamp for reproducible output.
fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
}

fn folder_prefix(prefix: &str) -> String {
    format!("{}/", prefix.trim_end_matches('/'))
}

fn missing(path: &str) -> Error {
    Error::MissingTemplateEntry(format!("{path} not found in template archive"))
}

// Name the entry in template-side errors.
fn in_entry(path: &str, err: Error) -> Error {
    match err {
        Error::MalformedTemplate(e) => malformed!("{path}: {e}"),
        other => other,
    }
}
