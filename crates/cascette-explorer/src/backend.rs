//! Archive backend contract and an in-memory implementation
//!
//! The explorer never decodes archives itself. Everything it needs from the
//! storage container goes through [`ArchiveBackend`]: the list of root name
//! hashes, the root variants behind each hash, decoded sizes, and byte
//! streams for extraction and preview.

use crate::entry::RootVariant;
use crate::error::BackendError;
use crate::flags::{ContentFlags, LocaleFlags};
use crate::keys::{ContentAddress, NameHash};
use crate::listfile::NameTable;
use std::collections::HashMap;
use std::io::{Cursor, Read};

/// Readable byte stream returned by a backend
pub type ReadStream = Box<dyn Read + Send>;

/// Storage container access required by the explorer
pub trait ArchiveBackend: Send + Sync {
    /// Enumerate every name hash present in the root table
    fn root_name_hashes(&self) -> Result<Vec<NameHash>, BackendError>;

    /// All root variants for a name hash; empty when the hash is unknown
    fn root_variants(&self, name_hash: NameHash) -> Vec<RootVariant>;

    /// Decoded size of the content behind `address`
    fn decoded_size(&self, address: &ContentAddress) -> Result<u64, BackendError>;

    /// Open a byte stream for `full_path` restricted to `locale`
    fn open_read(&self, full_path: &str, locale: LocaleFlags) -> Result<ReadStream, BackendError>;
}

/// Backend holding all content in memory
///
/// Used by tests and tooling that need a populated archive without a real
/// storage container on disk.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    roots: HashMap<NameHash, Vec<RootVariant>>,
    order: Vec<NameHash>,
    blobs: HashMap<ContentAddress, Vec<u8>>,
    names: NameTable,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variant of `path` and return its content address
    ///
    /// Adding the same path again layers another variant under the same
    /// name hash.
    pub fn insert(
        &mut self,
        path: &str,
        locale: LocaleFlags,
        content: ContentFlags,
        data: impl Into<Vec<u8>>,
    ) -> ContentAddress {
        let data = data.into();
        let address = ContentAddress::from_data(&data);
        let name_hash = NameHash::of_path(path);

        let variants = self.roots.entry(name_hash).or_insert_with(|| {
            self.order.push(name_hash);
            Vec::new()
        });
        variants.push(RootVariant::new(address, locale, content));
        self.blobs.insert(address, data);
        self.names.insert(path);
        address
    }

    /// Builder form of [`MemoryBackend::insert`]
    #[must_use]
    pub fn with_file(mut self, path: &str, locale: LocaleFlags, data: impl Into<Vec<u8>>) -> Self {
        self.insert(path, locale, ContentFlags::default(), data);
        self
    }

    /// Name table listing every inserted path
    pub fn name_table(&self) -> NameTable {
        self.names.clone()
    }
}

impl ArchiveBackend for MemoryBackend {
    fn root_name_hashes(&self) -> Result<Vec<NameHash>, BackendError> {
        Ok(self.order.clone())
    }

    fn root_variants(&self, name_hash: NameHash) -> Vec<RootVariant> {
        self.roots.get(&name_hash).cloned().unwrap_or_default()
    }

    fn decoded_size(&self, address: &ContentAddress) -> Result<u64, BackendError> {
        self.blobs
            .get(address)
            .map(|data| data.len() as u64)
            .ok_or_else(|| BackendError::NotFound(address.to_hex()))
    }

    fn open_read(&self, full_path: &str, locale: LocaleFlags) -> Result<ReadStream, BackendError> {
        let variants = self
            .roots
            .get(&NameHash::of_path(full_path))
            .ok_or_else(|| BackendError::NotFound(full_path.to_string()))?;

        let variant = variants
            .iter()
            .find(|v| v.locale_flags.matches(locale))
            .ok_or_else(|| BackendError::LocaleMismatch {
                path: full_path.to_string(),
                locale: locale.to_string(),
            })?;

        let data = self
            .blobs
            .get(&variant.content_address)
            .ok_or_else(|| BackendError::NotFound(variant.content_address.to_hex()))?;
        Ok(Box::new(Cursor::new(data.clone())))
    }
}
