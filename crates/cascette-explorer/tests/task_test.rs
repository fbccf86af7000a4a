//! Background task tests: loading and extraction on the blocking pool.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use cascette_explorer::{
    ArchiveBackend, Explorer, ExplorerConfig, ExplorerError, ExtractOptions, LocaleFlags,
    MemoryBackend, Progress,
};
use std::io::Write;
use std::sync::Arc;
use std::sync::mpsc;
use tempfile::{NamedTempFile, TempDir};

fn enus() -> LocaleFlags {
    LocaleFlags::new(LocaleFlags::ENUS)
}

fn sample_backend() -> MemoryBackend {
    MemoryBackend::new()
        .with_file("Interface/readme.txt", enus(), "hello")
        .with_file("Interface/Icons/a.blp", enus(), "blp")
}

fn listfile(paths: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create listfile");
    for path in paths {
        writeln!(file, "{path}").expect("Failed to write listfile");
    }
    file
}

#[tokio::test]
async fn test_spawned_load_completes() {
    let names = listfile(&["Interface/readme.txt", "Interface/Icons/a.blp"]);
    let config = ExplorerConfig::default().with_listfile(names.path());

    let handle = Explorer::spawn_load(config, || {
        Ok(Arc::new(sample_backend()) as Arc<dyn ArchiveBackend>)
    });
    let mut progress = handle.subscribe();
    let explorer = handle
        .join()
        .await
        .expect("load")
        .completed()
        .expect("not cancelled");

    assert_eq!(*progress.borrow_and_update(), 100);
    let tree = explorer.tree();
    assert!(tree.find("interface/icons/A.BLP").is_some());
    assert_eq!(tree.status_line(), "Loaded 2 files (0 names missing)");
}

#[tokio::test]
async fn test_load_cancelled_while_opening() {
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let (opened_tx, opened_rx) = mpsc::channel::<()>();

    let handle = Explorer::spawn_load(ExplorerConfig::default(), move || {
        opened_tx.send(()).expect("signal open");
        release_rx.recv().expect("release");
        Ok(Arc::new(sample_backend()) as Arc<dyn ArchiveBackend>)
    });

    opened_rx.recv().expect("backend opening");
    handle.cancel();
    release_tx.send(()).expect("release open");

    let outcome = handle.join().await.expect("load");
    assert!(outcome.is_cancelled());
}

#[tokio::test]
async fn test_load_surfaces_open_failure() {
    let handle = Explorer::spawn_load(ExplorerConfig::default(), || {
        Err(ExplorerError::Build("storage unavailable".to_string()))
    });
    let err = handle.join().await.expect_err("open fails");
    assert!(matches!(err, ExplorerError::Build(_)));
}

#[tokio::test]
async fn test_spawned_extraction() {
    let backend = sample_backend();
    let names = backend.name_table();
    let explorer = Explorer::new(Arc::new(backend), names, &ExplorerConfig::default())
        .expect("session");
    let out = TempDir::new().expect("Failed to create temp dir");

    let handle = explorer
        .spawn_extraction(
            vec!["Interface".to_string()],
            out.path().to_path_buf(),
            ExtractOptions::default(),
        )
        .expect("spawn");
    let mut progress = handle.subscribe();
    let summary = handle.join().await.expect("extract");

    assert_eq!(summary.succeeded, 2);
    assert_eq!(
        *progress.borrow_and_update(),
        Progress {
            completed: 2,
            total: 2
        }
    );
    assert!(out.path().join("Icons").join("a.blp").is_file());
}

#[tokio::test]
async fn test_extraction_survives_locale_switch() {
    let backend = sample_backend();
    let names = backend.name_table();
    let explorer = Explorer::new(Arc::new(backend), names, &ExplorerConfig::default())
        .expect("session");
    let out = TempDir::new().expect("Failed to create temp dir");

    let handle = explorer
        .spawn_extraction(
            vec!["Interface/readme.txt".to_string()],
            out.path().to_path_buf(),
            ExtractOptions::default(),
        )
        .expect("spawn");
    explorer
        .set_locale(LocaleFlags::new(LocaleFlags::DEDE))
        .expect("switch");

    // The worker keeps the enUS snapshot it started with
    let summary = handle.join().await.expect("extract");
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.skipped, 0);
}
