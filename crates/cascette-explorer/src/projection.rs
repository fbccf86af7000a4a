//! Sorted, randomly indexable views of a folder's children
//!
//! A list widget in virtual mode asks for rows by index, so a projection is
//! an array of child positions sorted once in O(n log n) and read in O(1).
//! The folder's canonical child order is never changed; the last sorted
//! order is cached on the folder and reused while key and direction match.

use crate::entry::{Entry, Folder};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

/// Column a projection is sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Case-insensitive name
    #[default]
    Name,
    /// Folders before files; entries of the same kind keep insertion order
    Kind,
}

/// Sort direction of a projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Smallest first
    #[default]
    Ascending,
    /// Largest first
    Descending,
}

impl SortDirection {
    /// The opposite direction
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Sorted order cached on a folder
#[derive(Debug, Clone)]
pub(crate) struct CachedOrder {
    key: SortKey,
    direction: SortDirection,
    order: Arc<[usize]>,
}

/// Compare two names case-insensitively, falling back to a byte comparison
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| a.cmp(b))
}

fn compare_entries(key: SortKey, a: &Entry, b: &Entry) -> Ordering {
    match key {
        SortKey::Name => compare_names(a.name(), b.name()),
        SortKey::Kind => a.kind().cmp(&b.kind()),
    }
}

/// Stably sorted view of one folder's children
#[derive(Debug, Clone)]
pub struct Projection<'a> {
    folder: &'a Folder,
    key: SortKey,
    direction: SortDirection,
    order: Arc<[usize]>,
}

impl<'a> Projection<'a> {
    /// Project `folder`, expanding it first if needed
    pub fn new(folder: &'a Folder, key: SortKey, direction: SortDirection) -> Self {
        let children = folder.expanded_children();
        let mut cache = folder.sort_cache().lock();

        if let Some(cached) = cache.as_ref()
            && cached.key == key
            && cached.direction == direction
        {
            return Self {
                folder,
                key,
                direction,
                order: Arc::clone(&cached.order),
            };
        }

        // Descending reverses the comparator, not the ascending result, so
        // equal entries keep insertion order in both directions.
        let mut order: Vec<usize> = (0..children.len()).collect();
        order.sort_by(|&a, &b| {
            let ordering = compare_entries(key, &children[a], &children[b]);
            match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
        debug!(
            "Sorted {} children of '{}' by {:?} {:?}",
            order.len(),
            folder.full_path(),
            key,
            direction
        );

        let order: Arc<[usize]> = order.into();
        *cache = Some(CachedOrder {
            key,
            direction,
            order: Arc::clone(&order),
        });

        Self {
            folder,
            key,
            direction,
            order,
        }
    }

    /// Projection of the same folder in the opposite direction
    #[must_use]
    pub fn toggle(&self) -> Self {
        Self::new(self.folder, self.key, self.direction.toggled())
    }

    /// Projected folder
    pub const fn folder(&self) -> &'a Folder {
        self.folder
    }

    /// Sort key
    pub const fn key(&self) -> SortKey {
        self.key
    }

    /// Sort direction
    pub const fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the folder has no children
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Row at `index`; `None` when out of range
    pub fn get(&self, index: usize) -> Option<&'a Entry> {
        let position = *self.order.get(index)?;
        self.folder.raw_children().get(position)
    }

    /// Rows in projected order
    pub fn iter(&self) -> impl Iterator<Item = &'a Entry> + '_ {
        let children = self.folder.raw_children();
        self.order.iter().map(move |&position| &children[position])
    }

    /// Row index of the child named `name` (case-insensitive)
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.iter()
            .position(|entry| entry.name().eq_ignore_ascii_case(name))
    }

    /// Entries at the selected row indices; out of range indices are skipped
    pub fn select(&self, indices: &[usize]) -> Vec<&'a Entry> {
        indices.iter().filter_map(|&index| self.get(index)).collect()
    }

    /// Full paths of the selected files, ignoring selected folders
    pub fn file_paths(&self, indices: &[usize]) -> Vec<&'a str> {
        self.select(indices)
            .into_iter()
            .filter_map(Entry::as_file)
            .map(crate::entry::File::full_path)
            .collect()
    }
}
