//! Template archive rewrite pipeline
//!
//! A build never edits the template document in place. The pipeline
//! reads every template entry, runs a callback chain over them, and
//! writes a new archive in four ordered phases:
//!
//! 1. **before** - each before callback runs exactly once against the
//!    empty staging area (bookkeeping setup).
//! 2. **per item** - for every template entry, in physical order, the
//!    item callbacks are consulted in registration order; the first
//!    [`ItemDecision::Drop`] vetoes the entry and short-circuits the
//!    rest of the chain. Entries kept by the whole chain are staged
//!    verbatim.
//! 3. **after** - each after callback runs exactly once and injects
//!    brand-new entries (scripts, assets, the rewritten manifest).
//! 4. **write** - the staged entries are written to a temporary file and
//!    atomically renamed over the output path.
//!
//! Any failing phase aborts the build; the staged output is discarded
//! and an existing artifact at the output path is left untouched.
//!
//! Output entry order is the surviving template order followed by
//! appended entries in callback-registration order. Registration order
//! is part of the contract: reordering callbacks changes the output.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

use crate::error::{OdpackError, OdpackResult};

/// The package mimetype entry; stored uncompressed so document sniffers
/// can read it from a fixed offset.
pub const MIMETYPE_ENTRY: &str = "mimetype";

/// One archive entry: zip-internal filename plus raw content.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveEntry {
    pub filename: String,
    pub content: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// Verdict of an item callback for one template entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemDecision {
    Keep,
    Drop,
}

/// Staged output entries, in final archive order.
#[derive(Debug, Default)]
pub struct ArchiveStaging {
    entries: Vec<ArchiveEntry>,
    names: HashSet<String>,
}

impl ArchiveStaging {
    /// Append a brand-new entry. Filenames are unique within an archive;
    /// a duplicate is refused.
    pub fn append(&mut self, entry: ArchiveEntry) -> OdpackResult<()> {
        if !self.names.insert(entry.filename.clone()) {
            return Err(OdpackError::DuplicateEntry {
                filename: entry.filename,
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Replace an existing entry's content, keeping its position.
    ///
    /// Returns `false` when no entry with that filename is staged.
    pub fn replace(&mut self, filename: &str, content: Vec<u8>) -> bool {
        match self.entries.iter_mut().find(|e| e.filename == filename) {
            Some(entry) => {
                entry.content = content;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.names.contains(filename)
    }

    pub fn get(&self, filename: &str) -> Option<&ArchiveEntry> {
        self.entries.iter().find(|e| e.filename == filename)
    }

    /// Staged entries in output order
    pub fn entries(&self) -> impl Iterator<Item = &ArchiveEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Runs once before any template entry is staged.
pub trait BeforeCallback {
    fn run(&mut self, staging: &mut ArchiveStaging) -> OdpackResult<()>;
}

/// Consulted once per template entry, in registration order.
///
/// The first callback returning [`ItemDecision::Drop`] vetoes the entry;
/// later callbacks in the chain are not consulted for it.
pub trait ItemCallback {
    fn decide(&mut self, entry: &ArchiveEntry) -> ItemDecision;
}

/// Runs once after every template entry has been staged.
pub trait AfterCallback {
    fn run(&mut self, staging: &mut ArchiveStaging) -> OdpackResult<()>;
}

/// Callback-driven rewrite of a template archive.
#[derive(Default)]
pub struct ArchivePipeline {
    before: Vec<Box<dyn BeforeCallback>>,
    items: Vec<Box<dyn ItemCallback>>,
    after: Vec<Box<dyn AfterCallback>>,
}

impl ArchivePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_before(mut self, callback: impl BeforeCallback + 'static) -> Self {
        self.before.push(Box::new(callback));
        self
    }

    pub fn with_item(mut self, callback: impl ItemCallback + 'static) -> Self {
        self.items.push(Box::new(callback));
        self
    }

    pub fn with_after(mut self, callback: impl AfterCallback + 'static) -> Self {
        self.after.push(Box::new(callback));
        self
    }

    /// Run all phases and atomically write the output archive.
    ///
    /// Returns the output entry filenames in archive order.
    pub fn run(mut self, template: &Path, output: &Path) -> OdpackResult<Vec<String>> {
        let entries = read_archive(template)?;

        let mut staging = ArchiveStaging::default();
        for callback in &mut self.before {
            callback.run(&mut staging)?;
        }

        'entry: for entry in entries {
            for callback in &mut self.items {
                if callback.decide(&entry) == ItemDecision::Drop {
                    continue 'entry;
                }
            }
            staging.append(entry)?;
        }

        for callback in &mut self.after {
            callback.run(&mut staging)?;
        }

        write_archive(&staging, output)?;
        Ok(staging.entries().map(|e| e.filename.clone()).collect())
    }
}

/// Read every file entry of a zip archive into memory, in physical
/// order. Directory placeholders are dropped; readers recreate them
/// from entry paths.
pub fn read_archive(path: &Path) -> OdpackResult<Vec<ArchiveEntry>> {
    let file = File::open(path)?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|source| OdpackError::ArchiveRead {
            path: path.to_path_buf(),
            source,
        })?;

    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|source| OdpackError::ArchiveRead {
                path: path.to_path_buf(),
                source,
            })?;
        if entry.is_dir() {
            continue;
        }
        let mut content = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut content)?;
        entries.push(ArchiveEntry::new(entry.name().to_string(), content));
    }
    Ok(entries)
}

/// Write staged entries to a temporary file in the output directory and
/// atomically rename it over the output path.
fn write_archive(staging: &ArchiveStaging, output: &Path) -> OdpackResult<()> {
    let dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    let tmp = tempfile::NamedTempFile::new_in(dir)?;

    let mut zip = zip::ZipWriter::new(tmp.as_file());
    for entry in staging.entries() {
        // The mimetype entry must stay uncompressed per the package format.
        let method = if entry.filename == MIMETYPE_ENTRY {
            CompressionMethod::Stored
        } else {
            CompressionMethod::Deflated
        };
        let options = SimpleFileOptions::default().compression_method(method);
        zip.start_file(entry.filename.as_str(), options)
            .map_err(|source| OdpackError::ArchiveWrite {
                path: output.to_path_buf(),
                source,
            })?;
        zip.write_all(&entry.content)?;
    }
    zip.finish().map_err(|source| OdpackError::ArchiveWrite {
        path: output.to_path_buf(),
        source,
    })?;

    tmp.persist(output).map_err(|e| OdpackError::Io(e.error))?;
    Ok(())
}
