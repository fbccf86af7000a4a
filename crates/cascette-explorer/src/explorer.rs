//! Explorer session: one archive, one name table, one current tree
//!
//! The current [`StorageTree`] sits behind a replace-on-write reference.
//! Readers take an `Arc` snapshot and keep working on it while a locale
//! change builds the next tree; the swap happens only once that build is
//! complete. Rebuilds are serialized so two locale changes never race.

use crate::backend::ArchiveBackend;
use crate::builder::StorageTreeBuilder;
use crate::config::ExplorerConfig;
use crate::entry::{Entry, File};
use crate::error::{BackendError, ExplorerError, Result};
use crate::extract::{self, ExtractOptions, ExtractionSummary, Extractor};
use crate::flags::LocaleFlags;
use crate::listfile::NameTable;
use crate::preview::{self, Preview};
use crate::projection::Projection;
use crate::resolver::{ListRow, LocaleResolver, Resolution};
use crate::task::{CancellationToken, Progress, TaskHandle, TaskOutcome};
use crate::tree::StorageTree;
use parking_lot::{Mutex, RwLock};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Load progress after the backend has been opened
pub const LOAD_BACKEND_OPENED: u8 = 10;
/// Load progress after the name table has been read
pub const LOAD_NAMES_READ: u8 = 40;
/// Load progress after the tree has been built
pub const LOAD_TREE_BUILT: u8 = 70;
/// Load progress when the session is ready
pub const LOAD_DONE: u8 = 100;

/// Handle to a running load; progress is a percentage
pub type LoadHandle = TaskHandle<TaskOutcome<Explorer>, u8>;

/// Handle to a running extraction
pub type ExtractionHandle = TaskHandle<ExtractionSummary, Progress>;

/// A browsing session over one archive
pub struct Explorer {
    backend: Arc<dyn ArchiveBackend>,
    names: NameTable,
    resolver: Arc<LocaleResolver>,
    tree: RwLock<Arc<StorageTree>>,
    rebuild: Mutex<()>,
}

impl std::fmt::Debug for Explorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Explorer")
            .field("names", &self.names.len())
            .field("locale", &self.locale())
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

impl Explorer {
    /// Build a session synchronously from an opened backend
    pub fn new(
        backend: Arc<dyn ArchiveBackend>,
        names: NameTable,
        config: &ExplorerConfig,
    ) -> Result<Self> {
        let tree = match StorageTreeBuilder::new(config)
            .with_names(&names)
            .build(backend.as_ref())?
        {
            TaskOutcome::Completed(tree) => tree,
            TaskOutcome::Cancelled => {
                return Err(ExplorerError::Task("tree build cancelled".to_string()));
            }
        };
        Ok(Self::from_parts(backend, names, tree))
    }

    fn from_parts(backend: Arc<dyn ArchiveBackend>, names: NameTable, tree: StorageTree) -> Self {
        Self {
            resolver: Arc::new(LocaleResolver::new(Arc::clone(&backend))),
            backend,
            names,
            tree: RwLock::new(Arc::new(tree)),
            rebuild: Mutex::new(()),
        }
    }

    /// Open the backend, read the listfile and build the tree
    ///
    /// `report` receives the percentages 0, 10, 40, 70 and 100 as each phase
    /// completes. Cancellation is checked between phases and during the
    /// build; a cancelled load discards everything it produced.
    pub fn load<F, R>(
        config: &ExplorerConfig,
        open: F,
        cancel: &CancellationToken,
        mut report: R,
    ) -> Result<TaskOutcome<Self>>
    where
        F: FnOnce() -> Result<Arc<dyn ArchiveBackend>>,
        R: FnMut(u8),
    {
        config.validate()?;
        report(0);

        if cancel.is_cancelled() {
            info!("Load cancelled before opening storage");
            return Ok(TaskOutcome::Cancelled);
        }
        let backend = open()?;
        report(LOAD_BACKEND_OPENED);

        if cancel.is_cancelled() {
            info!("Load cancelled before reading the name table");
            return Ok(TaskOutcome::Cancelled);
        }
        let names = match &config.listfile {
            Some(path) => NameTable::load(path)?,
            None => NameTable::new(),
        };
        report(LOAD_NAMES_READ);

        if cancel.is_cancelled() {
            info!("Load cancelled before building the tree");
            return Ok(TaskOutcome::Cancelled);
        }
        let outcome = StorageTreeBuilder::new(config)
            .with_names(&names)
            .with_cancellation(cancel)
            .build(backend.as_ref())?;
        let TaskOutcome::Completed(tree) = outcome else {
            return Ok(TaskOutcome::Cancelled);
        };
        report(LOAD_TREE_BUILT);

        info!("{}", tree.status_line());
        let explorer = Self::from_parts(backend, names, tree);
        report(LOAD_DONE);
        Ok(TaskOutcome::Completed(explorer))
    }

    /// Run [`Explorer::load`] on the blocking pool
    pub fn spawn_load<F>(config: ExplorerConfig, open: F) -> LoadHandle
    where
        F: FnOnce() -> Result<Arc<dyn ArchiveBackend>> + Send + 'static,
    {
        TaskHandle::spawn(0, move |token, progress| {
            Self::load(&config, open, &token, |percent| {
                progress.send_replace(percent);
            })
        })
    }

    /// Snapshot of the current tree
    pub fn tree(&self) -> Arc<StorageTree> {
        Arc::clone(&self.tree.read())
    }

    /// Active locale
    pub fn locale(&self) -> LocaleFlags {
        self.tree.read().locale()
    }

    /// Backend of this session
    pub fn backend(&self) -> &Arc<dyn ArchiveBackend> {
        &self.backend
    }

    /// Name table used for every build
    pub const fn names(&self) -> &NameTable {
        &self.names
    }

    /// Resolver shared by all trees of the session
    pub fn resolver(&self) -> &LocaleResolver {
        &self.resolver
    }

    /// Rebuild the tree for `locale` and make it current
    ///
    /// Snapshots taken before the call stay valid and keep the old locale.
    pub fn set_locale(&self, locale: LocaleFlags) -> Result<Arc<StorageTree>> {
        let _rebuild = self.rebuild.lock();
        let current = self.tree();
        if current.locale() == locale {
            return Ok(current);
        }

        let config = current.config().clone().with_locale(locale);
        let tree = match StorageTreeBuilder::new(&config)
            .with_names(&self.names)
            .build(self.backend.as_ref())?
        {
            TaskOutcome::Completed(tree) => Arc::new(tree),
            TaskOutcome::Cancelled => {
                return Err(ExplorerError::Task("tree rebuild cancelled".to_string()));
            }
        };

        *self.tree.write() = Arc::clone(&tree);
        info!("Switched locale from {} to {}", current.locale(), locale);
        Ok(tree)
    }

    /// Resolve the file at `path` under the active locale
    pub fn resolve(&self, path: &str) -> Result<Resolution> {
        let tree = self.tree();
        let file = find_file(&tree, path)?;
        self.resolver.resolve(file.name_hash(), tree.locale())
    }

    /// Rows of a projection taken from `tree`
    ///
    /// Rows are resolved under the locale `tree` was built for, so a view
    /// over a snapshot from before a locale switch stays consistent.
    pub fn rows(&self, tree: &StorageTree, projection: &Projection<'_>) -> Result<Vec<ListRow>> {
        self.resolver.rows(projection, tree.locale())
    }

    /// Extract the entries at `paths` on the calling thread
    pub fn extract<F>(
        &self,
        paths: &[&str],
        destination: &Path,
        options: ExtractOptions,
        cancel: &CancellationToken,
        progress: F,
    ) -> Result<ExtractionSummary>
    where
        F: FnMut(Progress),
    {
        let tree = self.tree();
        run_extraction(
            self.backend.as_ref(),
            &self.resolver,
            &tree,
            paths,
            destination,
            options,
            cancel,
            progress,
        )
    }

    /// Extract the entries at `paths` on the blocking pool
    ///
    /// The selection is checked against the current tree before the task
    /// starts; the worker keeps that tree alive while it runs.
    pub fn spawn_extraction(
        &self,
        paths: Vec<String>,
        destination: PathBuf,
        options: ExtractOptions,
    ) -> Result<ExtractionHandle> {
        let tree = self.tree();
        select(&tree, &paths)?;

        let backend = Arc::clone(&self.backend);
        let resolver = Arc::clone(&self.resolver);
        Ok(TaskHandle::spawn(Progress::default(), move |token, progress| {
            let paths: Vec<&str> = paths.iter().map(String::as_str).collect();
            run_extraction(
                backend.as_ref(),
                &resolver,
                &tree,
                &paths,
                &destination,
                options,
                &token,
                |p| {
                    progress.send_replace(p);
                },
            )
        }))
    }

    /// Load a preview of the file at `path`
    pub fn preview(&self, path: &str) -> Result<Preview> {
        let tree = self.tree();
        let file = find_file(&tree, path)?;
        preview::load_preview(self.backend.as_ref(), file)
    }
}

fn find_file<'t>(tree: &'t StorageTree, path: &str) -> Result<&'t File> {
    tree.find(path)
        .and_then(Entry::as_file)
        .ok_or_else(|| ExplorerError::from(BackendError::NotFound(path.to_string())))
}

fn select<'t, S: AsRef<str>>(tree: &'t StorageTree, paths: &[S]) -> Result<Vec<&'t Entry>> {
    paths
        .iter()
        .map(|path| {
            let path = path.as_ref();
            tree.find(path)
                .ok_or_else(|| ExplorerError::from(BackendError::NotFound(path.to_string())))
        })
        .collect()
}

#[allow(clippy::too_many_arguments)]
fn run_extraction<F>(
    backend: &dyn ArchiveBackend,
    resolver: &LocaleResolver,
    tree: &StorageTree,
    paths: &[&str],
    destination: &Path,
    options: ExtractOptions,
    cancel: &CancellationToken,
    progress: F,
) -> Result<ExtractionSummary>
where
    F: FnMut(Progress),
{
    let selection = select(tree, paths)?;
    let items = extract::plan(&selection, options);
    debug!(
        "Extraction of {} entries expands to {} files",
        selection.len(),
        items.len()
    );
    Extractor::new(backend, resolver, tree.locale()).run(&items, destination, cancel, progress)
}
