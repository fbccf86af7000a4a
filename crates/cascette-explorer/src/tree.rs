//! The built namespace tree for one (archive, locale) pair

use crate::builder::BuildStats;
use crate::config::ExplorerConfig;
use crate::entry::{Entry, Folder};
use crate::flags::LocaleFlags;

/// Root folder plus the configuration it was built with
///
/// A tree is immutable once built apart from write-once per-folder caches.
/// A locale change produces a new tree instead of mutating this one.
#[derive(Debug)]
pub struct StorageTree {
    root: Folder,
    config: ExplorerConfig,
    stats: BuildStats,
}

impl StorageTree {
    pub(crate) fn new(root: Folder, config: ExplorerConfig, stats: BuildStats) -> Self {
        Self {
            root,
            config,
            stats,
        }
    }

    /// Root folder
    pub const fn root(&self) -> &Folder {
        &self.root
    }

    /// Configuration the tree was built with
    pub const fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// Active locale of this tree
    pub const fn locale(&self) -> LocaleFlags {
        self.config.locale
    }

    /// Build counters
    pub const fn stats(&self) -> BuildStats {
        self.stats
    }

    /// Status line summarizing the load
    pub fn status_line(&self) -> String {
        let named = self.stats.files.saturating_sub(self.stats.unknown_names);
        format!(
            "Loaded {} files ({} names missing)",
            named, self.stats.unknown_names
        )
    }

    /// Find an entry by path (`/` or `\` separated, case-insensitive)
    ///
    /// The empty path is the root folder and is returned by
    /// [`StorageTree::find_folder`] only.
    pub fn find(&self, path: &str) -> Option<&Entry> {
        let mut parts = path.split(['/', '\\']).filter(|s| !s.is_empty()).peekable();
        let mut folder = &self.root;
        while let Some(part) = parts.next() {
            let entry = folder.child(part)?;
            if parts.peek().is_none() {
                return Some(entry);
            }
            folder = entry.as_folder()?;
        }
        None
    }

    /// Find a folder by path; the empty path is the root
    pub fn find_folder(&self, path: &str) -> Option<&Folder> {
        if path.split(['/', '\\']).all(str::is_empty) {
            return Some(&self.root);
        }
        self.find(path).and_then(Entry::as_folder)
    }

    /// Folder containing the entry at `path`; `None` for the root itself
    pub fn parent_of(&self, path: &str) -> Option<&Folder> {
        let trimmed = path.trim_end_matches(['/', '\\']);
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.rfind(['/', '\\']) {
            Some(split) => self.find_folder(&trimmed[..split]),
            None => Some(&self.root),
        }
    }
}
