//! Extraction of selected entries to a destination directory
//!
//! A selection of folders and files is first flattened into a list of
//! [`ExtractionItem`]s, each with the path it will be written to relative
//! to the destination. The [`Extractor`] then streams every item from the
//! backend to disk, reporting progress after each one. Per-item problems are
//! collected in the [`ExtractionSummary`]; only destination-level failures
//! abort the batch.

use crate::backend::ArchiveBackend;
use crate::entry::{Entry, File};
use crate::error::{ExplorerError, Result};
use crate::flags::LocaleFlags;
use crate::resolver::LocaleResolver;
use crate::task::{CancellationToken, Progress};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry as Slot;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{self, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Options controlling where extracted files are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    /// Write every file at its full archive path below the destination
    pub preserve_full_paths: bool,
}

impl ExtractOptions {
    /// Set whether full archive paths are preserved
    #[must_use]
    pub const fn with_full_paths(mut self, enabled: bool) -> Self {
        self.preserve_full_paths = enabled;
        self
    }
}

/// One file scheduled for extraction
#[derive(Debug, Clone)]
pub struct ExtractionItem<'a> {
    /// File to extract
    pub file: &'a File,
    /// Output path relative to the destination
    pub relative_path: PathBuf,
    /// Archive path of an earlier item planned for the same output path
    pub conflicts_with: Option<String>,
}

/// Why a single item could not be extracted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureCause {
    /// The file's name hash has no root variants
    #[error("root entry missing")]
    MissingRootEntry,
    /// Reading from the archive failed
    #[error("read failed: {0}")]
    Read(String),
    /// Writing the output file failed
    #[error("write failed: {0}")]
    Write(String),
    /// Another file in the batch is written to the same output path
    #[error("output path already used by {0}")]
    PathConflict(String),
}

/// A failed item and its cause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionFailure {
    /// Full archive path of the file
    pub path: String,
    /// Failure cause
    pub cause: FailureCause,
}

/// Outcome of an extraction batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    /// Files written
    pub succeeded: usize,
    /// Files without a variant for the active locale
    pub skipped: usize,
    /// Files that failed
    pub failed: usize,
    /// Full archive paths of the skipped files
    pub skipped_paths: Vec<String>,
    /// Failure details, one per failed file
    pub failures: Vec<ExtractionFailure>,
    /// Whether the batch stopped on cancellation
    pub cancelled: bool,
    /// Bytes written across all succeeded files
    pub bytes_written: u64,
}

impl ExtractionSummary {
    /// Items handled, whatever their outcome
    pub const fn processed(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }

    fn fail(&mut self, path: &str, cause: FailureCause) {
        warn!("Failed to extract {}: {}", path, cause);
        self.failed += 1;
        self.failures.push(ExtractionFailure {
            path: path.to_string(),
            cause,
        });
    }
}

/// Archive path segments, with empty and dot segments removed
fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
}

/// Case-insensitive comparison key of a segment sequence
fn folded<'s>(parts: impl Iterator<Item = &'s str>) -> String {
    parts
        .map(str::to_ascii_uppercase)
        .collect::<Vec<_>>()
        .join("\\")
}

/// Flatten a selection into the files to extract
///
/// Folders contribute all their descendant files, placed relative to the
/// folder itself; a selected file is placed by its name. Files reached more
/// than once (compared case-insensitively) are kept at their first position.
/// A different file landing on an output path that is already taken keeps
/// its place in the plan with `conflicts_with` set and is never written.
pub fn plan<'a>(selection: &[&'a Entry], options: ExtractOptions) -> Vec<ExtractionItem<'a>> {
    let mut seen = HashSet::new();
    let mut outputs: HashMap<String, &'a str> = HashMap::new();
    let mut items = Vec::new();

    let mut push = |file: &'a File, skip: usize| {
        if !seen.insert(folded(segments(file.full_path()))) {
            return;
        }
        let skip = if options.preserve_full_paths { 0 } else { skip };
        let relative_path: PathBuf = segments(file.full_path()).skip(skip).collect();
        let conflicts_with = match outputs.entry(folded(segments(file.full_path()).skip(skip))) {
            Slot::Occupied(first) => Some((*first.get()).to_string()),
            Slot::Vacant(slot) => {
                slot.insert(file.full_path());
                None
            }
        };
        items.push(ExtractionItem {
            file,
            relative_path,
            conflicts_with,
        });
    };

    for &entry in selection {
        match entry {
            Entry::Folder(folder) => {
                let depth = segments(folder.full_path()).count();
                for file in folder.descendant_files() {
                    push(file, depth);
                }
            }
            Entry::File(file) => {
                let depth = segments(file.full_path()).count().saturating_sub(1);
                push(file, depth);
            }
        }
    }

    debug!(
        "Planned {} files from {} selected entries",
        items.len(),
        selection.len()
    );
    items
}

/// Streams planned items from a backend to disk
#[derive(Clone, Copy)]
pub struct Extractor<'a> {
    backend: &'a dyn ArchiveBackend,
    resolver: &'a LocaleResolver,
    locale: LocaleFlags,
}

impl std::fmt::Debug for Extractor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("locale", &self.locale)
            .finish_non_exhaustive()
    }
}

impl<'a> Extractor<'a> {
    /// Create an extractor reading `locale` variants from `backend`
    pub const fn new(
        backend: &'a dyn ArchiveBackend,
        resolver: &'a LocaleResolver,
        locale: LocaleFlags,
    ) -> Self {
        Self {
            backend,
            resolver,
            locale,
        }
    }

    /// Extract `items` below `destination`
    ///
    /// `progress` is called after every item. Cancellation is checked
    /// before each item; files already written stay on disk.
    pub fn run<F>(
        &self,
        items: &[ExtractionItem<'_>],
        destination: &Path,
        cancel: &CancellationToken,
        mut progress: F,
    ) -> Result<ExtractionSummary>
    where
        F: FnMut(Progress),
    {
        let mut summary = ExtractionSummary::default();
        let total = items.len();

        if cancel.is_cancelled() {
            info!("Extraction cancelled before start");
            summary.cancelled = true;
            return Ok(summary);
        }

        fs::create_dir_all(destination).map_err(|source| ExplorerError::ExtractionFatal {
            path: destination.to_path_buf(),
            source,
        })?;

        info!(
            "Extracting {} files to {} for {}",
            total,
            destination.display(),
            self.locale
        );

        for (index, item) in items.iter().enumerate() {
            if cancel.is_cancelled() {
                info!("Extraction cancelled after {} of {} files", index, total);
                summary.cancelled = true;
                break;
            }

            self.extract_one(item, destination, &mut summary)?;
            progress(Progress {
                completed: index + 1,
                total,
            });
        }

        info!(
            "Extraction finished: {} written, {} skipped, {} failed, {} bytes",
            summary.succeeded, summary.skipped, summary.failed, summary.bytes_written
        );
        Ok(summary)
    }

    fn extract_one(
        &self,
        item: &ExtractionItem<'_>,
        destination: &Path,
        summary: &mut ExtractionSummary,
    ) -> Result<()> {
        let path = item.file.full_path();

        if let Some(first) = &item.conflicts_with {
            summary.fail(path, FailureCause::PathConflict(first.clone()));
            return Ok(());
        }

        match self.resolver.has_variant(item.file.name_hash(), self.locale) {
            Ok(true) => {}
            Ok(false) => {
                warn!("Skipping {}: no variant for {}", path, self.locale);
                summary.skipped += 1;
                summary.skipped_paths.push(path.to_string());
                return Ok(());
            }
            Err(ExplorerError::MissingRootEntry(_)) => {
                summary.fail(path, FailureCause::MissingRootEntry);
                return Ok(());
            }
            Err(e) => {
                summary.fail(path, FailureCause::Read(e.to_string()));
                return Ok(());
            }
        }

        let mut reader = match self.backend.open_read(path, self.locale) {
            Ok(reader) => reader,
            Err(e) => {
                summary.fail(path, FailureCause::Read(e.to_string()));
                return Ok(());
            }
        };

        let target = destination.join(&item.relative_path);
        match write_stream(&mut reader, &target) {
            Ok(bytes) => {
                debug!("Extracted {} ({} bytes) to {}", path, bytes, target.display());
                summary.succeeded += 1;
                summary.bytes_written += bytes;
                Ok(())
            }
            Err(CopyError::Read(e)) => {
                summary.fail(path, FailureCause::Read(e.to_string()));
                Ok(())
            }
            Err(CopyError::Write(e)) if is_fatal(&e, &target, destination) => {
                Err(ExplorerError::ExtractionFatal {
                    path: target,
                    source: e,
                })
            }
            Err(CopyError::Write(e)) => {
                summary.fail(path, FailureCause::Write(e.to_string()));
                Ok(())
            }
        }
    }
}

enum CopyError {
    Read(io::Error),
    Write(io::Error),
}

/// Copy `reader` into a new file at `target`, returning the byte count
///
/// A partially written file is removed on failure.
fn write_stream(reader: &mut dyn Read, target: &Path) -> std::result::Result<u64, CopyError> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(CopyError::Write)?;
    }
    let file = fs::File::create(target).map_err(CopyError::Write)?;
    let mut writer = BufWriter::new(file);

    let result = copy_chunks(reader, &mut writer).and_then(|bytes| {
        writer.flush().map_err(CopyError::Write)?;
        Ok(bytes)
    });
    if result.is_err() {
        drop(writer);
        let _ = fs::remove_file(target);
    }
    result
}

fn copy_chunks(
    reader: &mut dyn Read,
    writer: &mut impl Write,
) -> std::result::Result<u64, CopyError> {
    let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(CopyError::Read(e)),
        };
        writer.write_all(&buffer[..n]).map_err(CopyError::Write)?;
        total += n as u64;
    }
}

/// Whether a write error means no further file can be written either
fn is_fatal(error: &io::Error, target: &Path, destination: &Path) -> bool {
    match error.kind() {
        ErrorKind::ReadOnlyFilesystem | ErrorKind::StorageFull => true,
        ErrorKind::PermissionDenied => target
            .parent()
            .is_none_or(|parent| parent == destination || !parent.starts_with(destination)),
        _ => false,
    }
}
