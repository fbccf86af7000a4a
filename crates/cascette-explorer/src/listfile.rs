//! Name table mapping root name hashes to human-readable paths
//!
//! Root tables only store hashes. Names come from a listfile: a plain text
//! file with one archive path per line. Paths absent from the table get a
//! synthetic name when the tree is built.

use crate::error::Result;
use crate::keys::NameHash;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// Mapping from name hash to full archive path
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    paths: HashMap<NameHash, String>,
}

impl NameTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path, returning its hash; the first spelling of a path wins
    pub fn insert(&mut self, path: &str) -> NameHash {
        let hash = NameHash::of_path(path);
        if let Entry::Vacant(slot) = self.paths.entry(hash) {
            slot.insert(path.to_string());
        }
        hash
    }

    /// Look up the path for a hash
    pub fn get(&self, hash: NameHash) -> Option<&str> {
        self.paths.get(&hash).map(String::as_str)
    }

    /// Number of known paths
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Parse a listfile from a reader
    ///
    /// Lines are trimmed; blank lines are ignored.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut table = Self::new();
        let mut lines = 0usize;
        for line in reader.lines() {
            let line = line?;
            let path = line.trim();
            if path.is_empty() {
                continue;
            }
            table.insert(path);
            lines += 1;
        }
        debug!("Parsed {} listfile lines into {} names", lines, table.len());
        Ok(table)
    }

    /// Load a listfile from disk
    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading listfile {}", path.display());
        let file = File::open(path)?;
        Self::parse(BufReader::new(file))
    }
}

impl<'a> FromIterator<&'a str> for NameTable {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut table = Self::new();
        for path in iter {
            table.insert(path);
        }
        table
    }
}
