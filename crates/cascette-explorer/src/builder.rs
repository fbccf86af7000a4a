//! Storage tree construction from flat root entries
//!
//! Each root name hash becomes a file at the path given by the name table,
//! or at `<unknown folder>\<HASH>` when the table has no name for it. Folders
//! are created on demand while walking path segments. When two records land
//! on the same path (compared case-insensitively) the first one wins; its
//! name hash still reaches every variant the backend layers under it.

use crate::backend::ArchiveBackend;
use crate::config::ExplorerConfig;
use crate::entry::{Entry, File, Folder, PATH_SEPARATOR};
use crate::error::{ExplorerError, Result};
use crate::keys::NameHash;
use crate::listfile::NameTable;
use crate::task::{CancellationToken, TaskOutcome};
use crate::tree::StorageTree;
use std::time::Instant;
use tracing::{debug, info};

/// Records processed between cancellation checks
const CANCEL_CHECK_INTERVAL: usize = 4096;

/// Counters collected while building a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildStats {
    /// Files inserted into the tree
    pub files: usize,
    /// Folders created, excluding the root
    pub folders: usize,
    /// Files named from their hash because the name table lacks them
    pub unknown_names: usize,
    /// Records dropped because their path was already taken
    pub duplicates: usize,
}

/// Builds a [`StorageTree`] from root name hashes
#[derive(Debug, Clone, Copy)]
pub struct StorageTreeBuilder<'a> {
    config: &'a ExplorerConfig,
    names: Option<&'a NameTable>,
    cancel: Option<&'a CancellationToken>,
}

impl<'a> StorageTreeBuilder<'a> {
    /// Create a builder for the given configuration
    pub const fn new(config: &'a ExplorerConfig) -> Self {
        Self {
            config,
            names: None,
            cancel: None,
        }
    }

    /// Use a name table for human-readable paths
    #[must_use]
    pub const fn with_names(mut self, names: &'a NameTable) -> Self {
        self.names = Some(names);
        self
    }

    /// Stop early when `token` is cancelled
    #[must_use]
    pub const fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Enumerate the backend's root entries and build the tree
    pub fn build(&self, backend: &dyn ArchiveBackend) -> Result<TaskOutcome<StorageTree>> {
        let hashes = backend
            .root_name_hashes()
            .map_err(|e| ExplorerError::Build(e.to_string()))?;
        self.build_from(hashes)
    }

    /// Build the tree from an explicit list of root name hashes
    pub fn build_from<I>(&self, hashes: I) -> Result<TaskOutcome<StorageTree>>
    where
        I: IntoIterator<Item = NameHash>,
    {
        self.config.validate()?;

        let started = Instant::now();
        let mut root = Folder::new(String::new(), String::new());
        let mut stats = BuildStats::default();

        for (processed, hash) in hashes.into_iter().enumerate() {
            if processed % CANCEL_CHECK_INTERVAL == 0 && self.is_cancelled() {
                info!("Tree build cancelled after {} records", processed);
                return Ok(TaskOutcome::Cancelled);
            }

            match self.names.and_then(|names| names.get(hash)) {
                Some(path) if has_segments(path) => insert(&mut root, path, hash, &mut stats),
                _ => {
                    let path = format!(
                        "{}{}{}",
                        self.config.unknown_folder,
                        PATH_SEPARATOR,
                        hash.placeholder_name()
                    );
                    stats.unknown_names += 1;
                    insert(&mut root, &path, hash, &mut stats);
                }
            }
        }

        info!(
            "Built storage tree for {}: {} files, {} folders, {} unnamed, {} duplicates in {:?}",
            self.config.locale,
            stats.files,
            stats.folders,
            stats.unknown_names,
            stats.duplicates,
            started.elapsed()
        );

        Ok(TaskOutcome::Completed(StorageTree::new(
            root,
            self.config.clone(),
            stats,
        )))
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(CancellationToken::is_cancelled)
    }
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split(['/', '\\']).filter(|segment| !segment.is_empty())
}

fn has_segments(path: &str) -> bool {
    segments(path).next().is_some()
}

/// Insert one record, creating folders along its path
fn insert(root: &mut Folder, path: &str, hash: NameHash, stats: &mut BuildStats) {
    let parts: Vec<&str> = segments(path).collect();
    let Some((file_name, dirs)) = parts.split_last() else {
        return;
    };

    let mut folder = root;
    let mut folder_path = String::new();
    for dir in dirs {
        if !folder_path.is_empty() {
            folder_path.push(PATH_SEPARATOR);
        }
        folder_path.push_str(dir);

        let key = NameHash::of_segment(dir);
        let position = if let Some(position) = folder.position(key) {
            position
        } else {
            stats.folders += 1;
            folder.push_child(
                key,
                Entry::Folder(Folder::new((*dir).to_string(), folder_path.clone())),
            )
        };

        match &mut folder.raw_children_mut()[position] {
            Entry::Folder(sub) => folder = sub,
            Entry::File(existing) => {
                debug!(
                    "Dropping {}: '{}' is a file, not a folder",
                    path,
                    existing.full_path()
                );
                stats.duplicates += 1;
                return;
            }
        }
    }

    let key = NameHash::of_segment(file_name);
    if folder.position(key).is_some() {
        debug!("Dropping duplicate path {} ({})", path, hash);
        stats.duplicates += 1;
        return;
    }

    folder.push_child(
        key,
        Entry::File(File::new((*file_name).to_string(), path.to_string(), hash)),
    );
    stats.files += 1;
}
