//! Content addresses and path name hashes

use crate::jenkins;
use std::fmt;

/// Content address (MD5 of the decoded content) identifying a content blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentAddress([u8; 16]);

impl ContentAddress {
    /// Create a content address from raw bytes
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Compute the content address of `data`
    pub fn from_data(data: &[u8]) -> Self {
        Self(md5::compute(data).0)
    }

    /// Parse a content address from a 32 character hex string
    pub fn from_hex(hex: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; 16];
        hex::decode_to_slice(hex, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Raw bytes
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Lowercase hex representation
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ContentAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Hash of a normalized full path, the lookup key into the root table
///
/// Paths are normalized to uppercase with `\` separators before hashing, so
/// `Interface/Icons/a.blp` and `INTERFACE\ICONS\A.BLP` share a hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameHash(pub u64);

impl NameHash {
    /// Wrap a raw hash value
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Raw value
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Hash a full archive path
    pub fn of_path(path: &str) -> Self {
        Self(jenkins::hash64(normalize_path(path).as_bytes()))
    }

    /// Hash a single path segment, used to key folder children
    pub fn of_segment(name: &str) -> Self {
        Self(jenkins::hash64(name.to_ascii_uppercase().as_bytes()))
    }

    /// Deterministic placeholder file name for hashes missing from the name table
    pub fn placeholder_name(self) -> String {
        format!("{:016X}", self.0)
    }
}

impl fmt::Display for NameHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl From<u64> for NameHash {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Uppercase a path and convert `/` separators to `\`
pub fn normalize_path(path: &str) -> String {
    path.chars()
        .map(|c| if c == '/' { '\\' } else { c.to_ascii_uppercase() })
        .collect()
}
