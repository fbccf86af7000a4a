//! Configuration for an explorer session
//!
//! The configuration is an immutable value handed to the tree builder and the
//! resolver. Changing the locale means building a new tree with a new
//! configuration, never mutating a shared setting.

use crate::error::{ExplorerError, Result};
use crate::flags::LocaleFlags;
use crate::projection::{SortDirection, SortKey};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default folder holding files whose names are not in the name table
pub const DEFAULT_UNKNOWN_FOLDER: &str = "unknown";

/// Configuration for an explorer session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Active locale used to resolve file variants
    pub locale: LocaleFlags,

    /// Top-level folder for files without a known name
    pub unknown_folder: String,

    /// Listfile providing names for root hashes
    pub listfile: Option<PathBuf>,

    /// Initial sort column of folder listings
    pub sort_key: SortKey,

    /// Initial sort direction of folder listings
    pub sort_direction: SortDirection,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            locale: LocaleFlags::new(LocaleFlags::ENUS),
            unknown_folder: DEFAULT_UNKNOWN_FOLDER.to_string(),
            listfile: None,
            sort_key: SortKey::Name,
            sort_direction: SortDirection::Ascending,
        }
    }
}

impl ExplorerConfig {
    /// Create a configuration for the given locale
    pub fn new(locale: LocaleFlags) -> Self {
        Self {
            locale,
            ..Default::default()
        }
    }

    /// Set the active locale
    #[must_use]
    pub const fn with_locale(mut self, locale: LocaleFlags) -> Self {
        self.locale = locale;
        self
    }

    /// Set the listfile path
    #[must_use]
    pub fn with_listfile<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.listfile = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the folder used for unnamed files
    #[must_use]
    pub fn with_unknown_folder(mut self, name: impl Into<String>) -> Self {
        self.unknown_folder = name.into();
        self
    }

    /// Set the initial sort column and direction
    #[must_use]
    pub const fn with_sort(mut self, key: SortKey, direction: SortDirection) -> Self {
        self.sort_key = key;
        self.sort_direction = direction;
        self
    }

    /// Check the configuration for values the builder cannot use
    pub fn validate(&self) -> Result<()> {
        if self.locale.is_empty() {
            return Err(ExplorerError::Config(
                "locale must select at least one locale".to_string(),
            ));
        }
        let folder = self.unknown_folder.trim();
        if folder.is_empty() || folder.contains(['/', '\\']) {
            return Err(ExplorerError::Config(format!(
                "unknown folder must be a single path segment, got '{}'",
                self.unknown_folder
            )));
        }
        Ok(())
    }
}
