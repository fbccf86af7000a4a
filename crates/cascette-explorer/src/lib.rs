//! Browsing and extraction core for CASC game archives.
//!
//! A CASC root table maps 64-bit name hashes to content, with several
//! locale- and content-flagged variants per file. This crate turns that flat
//! table into a navigable folder tree and provides what a file browser
//! needs on top of it:
//!
//! - **Tree building**: name hashes plus an optional listfile become a
//!   rooted tree of folders and files
//! - **Lazy expansion**: folder presentation data is computed on first visit
//! - **Locale resolution**: variants are filtered by the active locale and
//!   rendered as listing rows
//! - **Virtual lists**: stable sorted views with O(1) row access
//! - **Extraction**: selections are streamed to disk on a worker with
//!   progress and cancellation
//!
//! Archive decoding stays behind the [`ArchiveBackend`] trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use cascette_explorer::{
//!     Explorer, ExplorerConfig, LocaleFlags, MemoryBackend, Projection, SortDirection, SortKey,
//! };
//! use std::sync::Arc;
//!
//! # fn example() -> cascette_explorer::Result<()> {
//! let backend = MemoryBackend::new()
//!     .with_file("Interface/readme.txt", LocaleFlags::new(LocaleFlags::ENUS), "hello");
//! let names = backend.name_table();
//! let explorer = Explorer::new(Arc::new(backend), names, &ExplorerConfig::default())?;
//!
//! let tree = explorer.tree();
//! let folder = tree.find_folder("Interface").expect("folder exists");
//! let projection = Projection::new(folder, SortKey::Name, SortDirection::Ascending);
//! for row in explorer.rows(&tree, &projection)? {
//!     println!("{} {} {}", row.name, row.flags, row.size);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![allow(clippy::must_use_candidate)]

// Hashing and keys
pub mod jenkins;
pub mod keys;

// Locale and content flags
pub mod flags;

// Errors
pub mod error;

// Configuration
pub mod config;

// Archive access
pub mod backend;
pub mod listfile;

// Namespace tree
pub mod builder;
pub mod entry;
pub mod tree;

// Listing
pub mod projection;
pub mod resolver;

// Extraction and preview
pub mod extract;
pub mod preview;

// Background tasks and sessions
pub mod explorer;
pub mod task;

pub use backend::{ArchiveBackend, MemoryBackend, ReadStream};
pub use builder::{BuildStats, StorageTreeBuilder};
pub use config::ExplorerConfig;
pub use entry::{Entry, EntryKind, ExpansionState, File, Folder, FolderSummary, RootVariant};
pub use error::{BackendError, ExplorerError, Result};
pub use explorer::{ExtractionHandle, Explorer, LoadHandle};
pub use extract::{
    ExtractOptions, ExtractionFailure, ExtractionItem, ExtractionSummary, Extractor, FailureCause,
};
pub use flags::{ContentFlags, LocaleFlags};
pub use keys::{ContentAddress, NameHash};
pub use listfile::NameTable;
pub use preview::{Preview, PreviewKind};
pub use projection::{Projection, SortDirection, SortKey};
pub use resolver::{FileDetails, ListRow, LocaleResolver, Resolution};
pub use task::{CancellationToken, Progress, TaskHandle, TaskOutcome};
pub use tree::StorageTree;
