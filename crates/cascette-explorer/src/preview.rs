//! Preview classification and loading
//!
//! Decoding images and rendering text belong to the caller; this module
//! only decides which viewer applies and fetches the bytes.

use crate::backend::ArchiveBackend;
use crate::entry::File;
use crate::error::Result;
use crate::flags::LocaleFlags;
use std::borrow::Cow;
use std::io::Read;
use tracing::debug;

/// Largest preview read into memory
pub const MAX_PREVIEW_SIZE: u64 = 16 * 1024 * 1024;

const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "ini", "wtf", "lua", "toc", "xml", "htm", "html", "lst",
];

/// Viewer suited to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    /// Plain text
    Text,
    /// BLP texture
    Image,
    /// No viewer available
    Unsupported,
}

impl PreviewKind {
    /// Classify by lowercase extension
    pub fn of_extension(extension: Option<&str>) -> Self {
        match extension {
            Some("blp") => Self::Image,
            Some(ext) if TEXT_EXTENSIONS.contains(&ext) => Self::Text,
            _ => Self::Unsupported,
        }
    }

    /// Classify a file by its name
    pub fn of_file(file: &File) -> Self {
        Self::of_extension(file.extension().as_deref())
    }
}

/// Loaded preview content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    /// Viewer to use
    pub kind: PreviewKind,
    /// Raw bytes, empty for unsupported files
    pub data: Vec<u8>,
    /// Whether the content was cut at [`MAX_PREVIEW_SIZE`]
    pub truncated: bool,
}

impl Preview {
    /// Text content with invalid UTF-8 replaced; `None` unless a text preview
    pub fn text(&self) -> Option<Cow<'_, str>> {
        (self.kind == PreviewKind::Text).then(|| String::from_utf8_lossy(&self.data))
    }
}

/// Load a preview of `file`
///
/// Previews read the first variant of any locale, so a file shows even when
/// the active locale has no variant for it.
pub fn load_preview(backend: &dyn ArchiveBackend, file: &File) -> Result<Preview> {
    let kind = PreviewKind::of_file(file);
    if kind == PreviewKind::Unsupported {
        debug!("No preview for {}", file.full_path());
        return Ok(Preview {
            kind,
            data: Vec::new(),
            truncated: false,
        });
    }

    let stream = backend.open_read(file.full_path(), LocaleFlags::new(LocaleFlags::ALL))?;
    let mut data = Vec::new();
    stream.take(MAX_PREVIEW_SIZE + 1).read_to_end(&mut data)?;

    let truncated = data.len() as u64 > MAX_PREVIEW_SIZE;
    if truncated {
        data.truncate(usize::try_from(MAX_PREVIEW_SIZE).unwrap_or(usize::MAX));
    }
    debug!("Loaded {:?} preview of {} ({} bytes)", kind, file.full_path(), data.len());
    Ok(Preview {
        kind,
        data,
        truncated,
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::keys::NameHash;

    fn file(path: &str) -> File {
        let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
        File::new(name.to_string(), path.to_string(), NameHash::of_path(path))
    }

    #[test]
    fn test_classification() {
        assert_eq!(PreviewKind::of_file(&file("Interface/Icon.BLP")), PreviewKind::Image);
        assert_eq!(PreviewKind::of_file(&file("WTF/Config.wtf")), PreviewKind::Text);
        assert_eq!(PreviewKind::of_file(&file("a/page.HTML")), PreviewKind::Text);
        assert_eq!(PreviewKind::of_file(&file("a/model.m2")), PreviewKind::Unsupported);
        assert_eq!(PreviewKind::of_file(&file("a/README")), PreviewKind::Unsupported);
    }

    #[test]
    fn test_text_preview_ignores_active_locale() {
        let backend = MemoryBackend::new().with_file(
            "docs/readme.txt",
            LocaleFlags::new(LocaleFlags::KOKR),
            "hello",
        );
        let preview = load_preview(&backend, &file("docs/readme.txt")).expect("preview");
        assert_eq!(preview.kind, PreviewKind::Text);
        assert_eq!(preview.text().as_deref(), Some("hello"));
        assert!(!preview.truncated);
    }

    #[test]
    fn test_unsupported_preview_reads_nothing() {
        let backend = MemoryBackend::new();
        let preview = load_preview(&backend, &file("a/model.m2")).expect("preview");
        assert_eq!(preview.kind, PreviewKind::Unsupported);
        assert!(preview.data.is_empty());
        assert!(preview.text().is_none());
    }

    #[test]
    fn test_missing_file_is_backend_error() {
        let backend = MemoryBackend::new();
        let err = load_preview(&backend, &file("a/missing.txt")).expect_err("missing");
        assert!(matches!(err, crate::ExplorerError::Backend(_)));
    }
}
