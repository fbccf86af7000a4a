//! Locale-aware resolution of files to content
//!
//! A file name hash maps to any number of root variants, each tagged with
//! locale and content flags. The resolver keeps the variants that intersect
//! the active locale, merges their flags, and looks up the decoded size of
//! the first match. It also renders the rows of a folder listing.

use crate::backend::ArchiveBackend;
use crate::entry::{Entry, EntryKind};
use crate::error::{ExplorerError, Result};
use crate::flags::{ContentFlags, LocaleFlags};
use crate::keys::{ContentAddress, NameHash};
use crate::projection::Projection;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Size column text for folders
pub const DIRECTORY_MARKER: &str = "<DIR>";

/// Merged view of the root variants matching a locale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileDetails {
    /// Union of the matching variants' locale flags
    pub locale_flags: LocaleFlags,
    /// Union of the matching variants' content flags
    pub content_flags: ContentFlags,
    /// Content address of the first matching variant
    pub content_address: ContentAddress,
    /// Decoded size of that content
    pub size: u64,
}

impl FileDetails {
    /// Flags column text, e.g. `enUS, enGB (Install)`
    pub fn flags_text(&self) -> String {
        format!("{} ({})", self.locale_flags, self.content_flags)
    }
}

/// Outcome of resolving a file under a locale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// At least one variant matches the locale
    Matched(FileDetails),
    /// Variants exist, but none for this locale
    NoLocaleVariant,
}

impl Resolution {
    /// Details of a matched resolution
    pub const fn details(&self) -> Option<&FileDetails> {
        match self {
            Self::Matched(details) => Some(details),
            Self::NoLocaleVariant => None,
        }
    }
}

/// One rendered row of a folder listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    /// Entry name
    pub name: String,
    /// Folder or file
    pub kind: EntryKind,
    /// Flags text; empty for folders and files without a locale variant
    pub flags: String,
    /// Size text: grouped digits, `<DIR>`, or empty
    pub size: String,
}

/// Resolves files against the backend's root table
///
/// Decoded sizes are cached per content address. The cache does not depend
/// on the locale, so one resolver serves every tree of a session.
pub struct LocaleResolver {
    backend: Arc<dyn ArchiveBackend>,
    sizes: DashMap<ContentAddress, u64>,
}

impl std::fmt::Debug for LocaleResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocaleResolver")
            .field("cached_sizes", &self.sizes.len())
            .finish_non_exhaustive()
    }
}

impl LocaleResolver {
    /// Create a resolver over `backend`
    pub fn new(backend: Arc<dyn ArchiveBackend>) -> Self {
        Self {
            backend,
            sizes: DashMap::new(),
        }
    }

    /// Resolve `name_hash` under `locale`
    ///
    /// Fails with [`ExplorerError::MissingRootEntry`] when the hash has no
    /// variants at all; that is an archive inconsistency, not a locale miss.
    pub fn resolve(&self, name_hash: NameHash, locale: LocaleFlags) -> Result<Resolution> {
        let Some((locale_flags, content_flags, content_address)) =
            self.match_variants(name_hash, locale)?
        else {
            return Ok(Resolution::NoLocaleVariant);
        };

        let size = self.decoded_size(&content_address)?;
        Ok(Resolution::Matched(FileDetails {
            locale_flags,
            content_flags,
            content_address,
            size,
        }))
    }

    /// Resolve `name_hash`, treating a locale miss as an error
    pub fn require(&self, name_hash: NameHash, locale: LocaleFlags) -> Result<FileDetails> {
        match self.resolve(name_hash, locale)? {
            Resolution::Matched(details) => Ok(details),
            Resolution::NoLocaleVariant => Err(ExplorerError::NoLocaleVariant(name_hash)),
        }
    }

    /// Whether `name_hash` has a variant for `locale`, without a size lookup
    pub fn has_variant(&self, name_hash: NameHash, locale: LocaleFlags) -> Result<bool> {
        Ok(self.match_variants(name_hash, locale)?.is_some())
    }

    /// Decoded size of `address`, cached after the first lookup
    pub fn decoded_size(&self, address: &ContentAddress) -> Result<u64> {
        if let Some(size) = self.sizes.get(address) {
            return Ok(*size);
        }
        let size = self.backend.decoded_size(address)?;
        self.sizes.insert(*address, size);
        Ok(size)
    }

    /// Number of cached sizes
    pub fn cached_sizes(&self) -> usize {
        self.sizes.len()
    }

    /// Render one listing row under `locale`
    pub fn row(&self, entry: &Entry, locale: LocaleFlags) -> Result<ListRow> {
        let (flags, size) = match entry {
            Entry::Folder(_) => (String::new(), DIRECTORY_MARKER.to_string()),
            Entry::File(file) => match self.resolve(file.name_hash(), locale)? {
                Resolution::Matched(details) => (details.flags_text(), format_size(details.size)),
                Resolution::NoLocaleVariant => (String::new(), String::new()),
            },
        };
        Ok(ListRow {
            name: entry.name().to_string(),
            kind: entry.kind(),
            flags,
            size,
        })
    }

    /// Render every row of a projection in projected order
    pub fn rows(&self, projection: &Projection<'_>, locale: LocaleFlags) -> Result<Vec<ListRow>> {
        projection
            .iter()
            .map(|entry| self.row(entry, locale))
            .collect()
    }

    /// Merged flags and first content address of the matching variants
    fn match_variants(
        &self,
        name_hash: NameHash,
        locale: LocaleFlags,
    ) -> Result<Option<(LocaleFlags, ContentFlags, ContentAddress)>> {
        let variants = self.backend.root_variants(name_hash);
        if variants.is_empty() {
            return Err(ExplorerError::MissingRootEntry(name_hash));
        }

        let mut matching = variants.iter().filter(|v| v.locale_flags.matches(locale));
        let Some(first) = matching.next() else {
            debug!(
                "{} has {} variants, none for {}",
                name_hash,
                variants.len(),
                locale
            );
            return Ok(None);
        };

        let (locale_flags, content_flags) = matching.fold(
            (first.locale_flags, first.content_flags),
            |(locales, content), v| (locales | v.locale_flags, content | v.content_flags),
        );
        Ok(Some((locale_flags, content_flags, first.content_address)))
    }
}

/// Format a byte count with space-separated thousands, e.g. `1 234 567`
pub fn format_size(size: u64) -> String {
    let digits = size.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(' ');
        }
        out.push(digit);
    }
    out
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::entry::{File, Folder};
    use pretty_assertions::assert_eq;

    fn locale(value: u32) -> LocaleFlags {
        LocaleFlags::new(value)
    }

    fn backend() -> Arc<MemoryBackend> {
        let mut backend = MemoryBackend::new();
        backend.insert(
            "sound/music.mp3",
            locale(LocaleFlags::ENUS),
            ContentFlags::new(ContentFlags::INSTALL),
            vec![0u8; 1_234_567],
        );
        backend.insert(
            "sound/music.mp3",
            locale(LocaleFlags::ENGB),
            ContentFlags::new(ContentFlags::BUNDLE),
            vec![1u8; 10],
        );
        backend.insert(
            "sound/music.mp3",
            locale(LocaleFlags::DEDE),
            ContentFlags::default(),
            vec![2u8; 5],
        );
        Arc::new(backend)
    }

    #[test]
    fn test_merges_matching_variants() {
        let resolver = LocaleResolver::new(backend());
        let hash = NameHash::of_path("sound/music.mp3");
        let mask = locale(LocaleFlags::ENUS | LocaleFlags::ENGB);

        let details = resolver.require(hash, mask).expect("resolve");
        assert_eq!(
            details.locale_flags,
            locale(LocaleFlags::ENUS | LocaleFlags::ENGB)
        );
        assert!(details.content_flags.has(ContentFlags::INSTALL));
        assert!(details.content_flags.has(ContentFlags::BUNDLE));
        assert_eq!(details.size, 1_234_567);
    }

    #[test]
    fn test_missing_entry_and_locale_miss_are_distinct() {
        let resolver = LocaleResolver::new(backend());

        let miss = resolver
            .resolve(NameHash::of_path("sound/music.mp3"), locale(LocaleFlags::KOKR))
            .expect("resolve");
        assert_eq!(miss, Resolution::NoLocaleVariant);

        let missing = resolver.resolve(NameHash::new(42), locale(LocaleFlags::ENUS));
        assert!(matches!(missing, Err(ExplorerError::MissingRootEntry(h)) if h == NameHash::new(42)));

        let required = resolver.require(
            NameHash::of_path("sound/music.mp3"),
            locale(LocaleFlags::KOKR),
        );
        assert!(matches!(required, Err(ExplorerError::NoLocaleVariant(_))));
    }

    #[test]
    fn test_sizes_are_cached() {
        let resolver = LocaleResolver::new(backend());
        let hash = NameHash::of_path("sound/music.mp3");
        resolver.resolve(hash, locale(LocaleFlags::ENUS)).expect("first");
        resolver.resolve(hash, locale(LocaleFlags::ENUS)).expect("second");
        assert_eq!(resolver.cached_sizes(), 1);
        resolver.resolve(hash, locale(LocaleFlags::DEDE)).expect("other locale");
        assert_eq!(resolver.cached_sizes(), 2);
    }

    #[test]
    fn test_rows() {
        let resolver = LocaleResolver::new(backend());
        let hash = NameHash::of_path("sound/music.mp3");
        let file = Entry::File(File::new(
            "music.mp3".to_string(),
            "sound/music.mp3".to_string(),
            hash,
        ));

        let row = resolver.row(&file, locale(LocaleFlags::ENUS)).expect("row");
        assert_eq!(
            row,
            ListRow {
                name: "music.mp3".to_string(),
                kind: EntryKind::File,
                flags: "enUS (Install)".to_string(),
                size: "1 234 567".to_string(),
            }
        );

        let row = resolver.row(&file, locale(LocaleFlags::FRFR)).expect("row");
        assert!(row.flags.is_empty());
        assert!(row.size.is_empty());

        let folder = Entry::Folder(Folder::new("sound".to_string(), "sound".to_string()));
        let row = resolver.row(&folder, locale(LocaleFlags::ENUS)).expect("row");
        assert_eq!(row.size, DIRECTORY_MARKER);
        assert_eq!(row.kind, EntryKind::Folder);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0");
        assert_eq!(format_size(999), "999");
        assert_eq!(format_size(1000), "1 000");
        assert_eq!(format_size(1_234_567), "1 234 567");
        assert_eq!(format_size(123_456), "123 456");
    }
}
