//! Namespace entries: folders, files and root variants
//!
//! The tree topology is fully linked when the builder finishes. What stays
//! lazy is the per-folder presentation data ([`FolderSummary`]) and the
//! visibility of a folder's children: a folder reports `None` from
//! [`Folder::children`] until it has been expanded, so "empty" and
//! "not yet expanded" can never be confused.

use crate::flags::{ContentFlags, LocaleFlags};
use crate::keys::{ContentAddress, NameHash};
use crate::projection::CachedOrder;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;
use tracing::debug;

/// Separator used when composing folder paths
pub const PATH_SEPARATOR: char = '\\';

/// One locale/content flagged pointer from a file name to its content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootVariant {
    /// Content address of this variant
    pub content_address: ContentAddress,
    /// Locales this variant applies to
    pub locale_flags: LocaleFlags,
    /// Content flags of this variant
    pub content_flags: ContentFlags,
}

impl RootVariant {
    /// Create a new root variant
    pub const fn new(
        content_address: ContentAddress,
        locale_flags: LocaleFlags,
        content_flags: ContentFlags,
    ) -> Self {
        Self {
            content_address,
            locale_flags,
            content_flags,
        }
    }
}

/// Kind of a namespace entry, as shown in a type column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryKind {
    /// Folder
    Folder,
    /// File
    File,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Folder => f.write_str("Folder"),
            Self::File => f.write_str("File"),
        }
    }
}

/// A node of the namespace tree
#[derive(Debug)]
pub enum Entry {
    /// Folder node
    Folder(Folder),
    /// File node
    File(File),
}

impl Entry {
    /// Display name of the entry
    pub fn name(&self) -> &str {
        match self {
            Self::Folder(folder) => folder.name(),
            Self::File(file) => file.name(),
        }
    }

    /// Full archive path of the entry
    pub fn full_path(&self) -> &str {
        match self {
            Self::Folder(folder) => folder.full_path(),
            Self::File(file) => file.full_path(),
        }
    }

    /// Entry kind
    pub const fn kind(&self) -> EntryKind {
        match self {
            Self::Folder(_) => EntryKind::Folder,
            Self::File(_) => EntryKind::File,
        }
    }

    /// Folder view of this entry
    pub const fn as_folder(&self) -> Option<&Folder> {
        match self {
            Self::Folder(folder) => Some(folder),
            Self::File(_) => None,
        }
    }

    /// File view of this entry
    pub const fn as_file(&self) -> Option<&File> {
        match self {
            Self::File(file) => Some(file),
            Self::Folder(_) => None,
        }
    }

    /// Expand a folder; files are left untouched
    pub fn expand(&self) -> Option<&FolderSummary> {
        match self {
            Self::Folder(folder) => Some(folder.expand()),
            Self::File(_) => None,
        }
    }
}

/// A file node; its root variants are fetched on demand by name hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    name: String,
    full_path: String,
    name_hash: NameHash,
}

impl File {
    pub(crate) fn new(name: String, full_path: String, name_hash: NameHash) -> Self {
        Self {
            name,
            full_path,
            name_hash,
        }
    }

    /// File name (last path segment)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full archive path
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// Root table lookup key
    pub const fn name_hash(&self) -> NameHash {
        self.name_hash
    }

    /// Lowercase file extension without the dot
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        (!stem.is_empty() && !ext.is_empty()).then(|| ext.to_ascii_lowercase())
    }
}

/// Expansion state of a folder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionState {
    /// Children not yet visited
    Unexpanded,
    /// Presentation data is being computed
    Expanding,
    /// Children visible and summary available
    Expanded,
}

/// Presentation data computed once per folder on first expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FolderSummary {
    /// Number of direct child folders
    pub folder_count: usize,
    /// Number of direct child files
    pub file_count: usize,
}

impl FolderSummary {
    fn of(children: &[Entry]) -> Self {
        children
            .iter()
            .fold(Self::default(), |mut summary, child| {
                match child {
                    Entry::Folder(_) => summary.folder_count += 1,
                    Entry::File(_) => summary.file_count += 1,
                }
                summary
            })
    }

    /// Whether a navigation pane should offer to expand this folder
    pub const fn has_subfolders(&self) -> bool {
        self.folder_count > 0
    }

    /// Total number of direct children
    pub const fn total(&self) -> usize {
        self.folder_count + self.file_count
    }
}

/// A folder node owning its children in insertion order
pub struct Folder {
    name: String,
    full_path: String,
    children: Vec<Entry>,
    /// Child position keyed by the hash of the normalized child name
    index: HashMap<NameHash, usize>,
    state: Mutex<ExpansionState>,
    summary: OnceLock<FolderSummary>,
    sort_cache: Mutex<Option<CachedOrder>>,
}

impl Folder {
    pub(crate) fn new(name: String, full_path: String) -> Self {
        Self {
            name,
            full_path,
            children: Vec::new(),
            index: HashMap::new(),
            state: Mutex::new(ExpansionState::Unexpanded),
            summary: OnceLock::new(),
            sort_cache: Mutex::new(None),
        }
    }

    /// Folder name; empty for the root
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full archive path; empty for the root
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// Current expansion state
    pub fn state(&self) -> ExpansionState {
        *self.state.lock()
    }

    /// Whether the folder has been expanded
    pub fn is_expanded(&self) -> bool {
        self.summary.get().is_some()
    }

    /// Expand the folder, computing its summary on first call
    ///
    /// Idempotent: later calls return the same summary without touching the
    /// children. The work is O(children) and never recursive.
    pub fn expand(&self) -> &FolderSummary {
        if let Some(summary) = self.summary.get() {
            return summary;
        }

        {
            let mut state = self.state.lock();
            if *state == ExpansionState::Unexpanded {
                *state = ExpansionState::Expanding;
            }
        }

        let summary = self.summary.get_or_init(|| {
            let summary = FolderSummary::of(&self.children);
            debug!(
                "Expanded folder '{}': {} folders, {} files",
                self.full_path, summary.folder_count, summary.file_count
            );
            summary
        });
        *self.state.lock() = ExpansionState::Expanded;
        summary
    }

    /// Children in insertion order, or `None` while unexpanded
    pub fn children(&self) -> Option<&[Entry]> {
        self.is_expanded().then_some(self.children.as_slice())
    }

    /// Expand if needed and return the children
    pub fn expanded_children(&self) -> &[Entry] {
        self.expand();
        &self.children
    }

    /// Find a direct child by name (case-insensitive), expanding first
    pub fn child(&self, name: &str) -> Option<&Entry> {
        self.expand();
        self.index
            .get(&NameHash::of_segment(name))
            .map(|&position| &self.children[position])
    }

    /// Child folders in ascending name order, for a navigation pane
    pub fn subfolders(&self) -> Vec<&Self> {
        let mut folders: Vec<&Self> = self
            .expanded_children()
            .iter()
            .filter_map(Entry::as_folder)
            .collect();
        folders.sort_by(|a, b| crate::projection::compare_names(a.name(), b.name()));
        folders
    }

    /// Files below this folder, depth first, in insertion order
    pub fn descendant_files(&self) -> Vec<&File> {
        let mut files = Vec::new();
        let mut stack = vec![self];
        while let Some(folder) = stack.pop() {
            // Push folders in reverse so they are visited in insertion order
            let children = folder.expanded_children();
            for child in children {
                if let Entry::File(file) = child {
                    files.push(file);
                }
            }
            for child in children.iter().rev() {
                if let Entry::Folder(sub) = child {
                    stack.push(sub);
                }
            }
        }
        files
    }

    pub(crate) fn sort_cache(&self) -> &Mutex<Option<CachedOrder>> {
        &self.sort_cache
    }

    pub(crate) fn raw_children(&self) -> &[Entry] {
        &self.children
    }

    pub(crate) fn raw_children_mut(&mut self) -> &mut Vec<Entry> {
        &mut self.children
    }

    /// Position of the child keyed by `key`, if any
    pub(crate) fn position(&self, key: NameHash) -> Option<usize> {
        self.index.get(&key).copied()
    }

    /// Append a child under `key` and return its position
    pub(crate) fn push_child(&mut self, key: NameHash, entry: Entry) -> usize {
        let position = self.children.len();
        self.children.push(entry);
        self.index.insert(key, position);
        position
    }
}

impl fmt::Debug for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Folder")
            .field("name", &self.name)
            .field("full_path", &self.full_path)
            .field("children", &self.children.len())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn file(name: &str, path: &str) -> Entry {
        Entry::File(File::new(
            name.to_string(),
            path.to_string(),
            NameHash::of_path(path),
        ))
    }

    fn sample() -> Folder {
        let mut root = Folder::new(String::new(), String::new());
        let mut sub = Folder::new("b".to_string(), "a\\b".to_string());
        sub.push_child(NameHash::of_segment("c.txt"), file("c.txt", "a/b/c.txt"));
        root.push_child(NameHash::of_segment("b"), Entry::Folder(sub));
        root.push_child(NameHash::of_segment("d.txt"), file("d.txt", "a/d.txt"));
        root
    }

    #[test]
    fn test_children_hidden_until_expanded() {
        let folder = sample();
        assert_eq!(folder.state(), ExpansionState::Unexpanded);
        assert!(folder.children().is_none());

        let summary = *folder.expand();
        assert_eq!(folder.state(), ExpansionState::Expanded);
        assert_eq!(summary.folder_count, 1);
        assert_eq!(summary.file_count, 1);
        assert!(summary.has_subfolders());
        assert_eq!(folder.children().map(<[Entry]>::len), Some(2));
    }

    #[test]
    fn test_empty_folder_expands_to_empty_children() {
        let folder = Folder::new("empty".to_string(), "empty".to_string());
        assert!(folder.children().is_none());
        assert!(!folder.expand().has_subfolders());
        assert_eq!(folder.children().map(<[Entry]>::len), Some(0));
    }

    #[test]
    fn test_expand_is_idempotent() {
        let folder = sample();
        let first: *const FolderSummary = folder.expand();
        let names_before: Vec<String> = folder
            .children()
            .expect("expanded")
            .iter()
            .map(|e| e.name().to_string())
            .collect();

        let second: *const FolderSummary = folder.expand();
        let names_after: Vec<String> = folder
            .children()
            .expect("expanded")
            .iter()
            .map(|e| e.name().to_string())
            .collect();

        assert_eq!(first, second);
        assert_eq!(names_before, names_after);
    }

    #[test]
    fn test_expansion_is_not_recursive() {
        let folder = sample();
        folder.expand();
        let sub = folder.child("B").and_then(Entry::as_folder).expect("b");
        assert_eq!(sub.state(), ExpansionState::Unexpanded);
    }

    #[test]
    fn test_expanding_file_is_noop() {
        let entry = file("x.txt", "x.txt");
        assert!(entry.expand().is_none());
        assert_eq!(entry.kind(), EntryKind::File);
    }

    #[test]
    fn test_descendant_files_order() {
        let folder = sample();
        let paths: Vec<&str> = folder
            .descendant_files()
            .iter()
            .map(|f| f.full_path())
            .collect();
        assert_eq!(paths, vec!["a/d.txt", "a/b/c.txt"]);
    }

    #[test]
    fn test_file_extension() {
        let f = File::new("Icon.BLP".to_string(), "x/Icon.BLP".to_string(), NameHash::new(1));
        assert_eq!(f.extension().as_deref(), Some("blp"));
        let f = File::new(".hidden".to_string(), ".hidden".to_string(), NameHash::new(2));
        assert_eq!(f.extension(), None);
        let f = File::new("README".to_string(), "README".to_string(), NameHash::new(3));
        assert_eq!(f.extension(), None);
    }
}
