//! Browsing tests: tree building, expansion, projection and row rendering
//! against an in-memory archive.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use cascette_explorer::{
    ContentFlags, Entry, EntryKind, ExpansionState, Explorer, ExplorerConfig, ExplorerError,
    LocaleFlags, MemoryBackend, NameHash, NameTable, Projection, Resolution, SortDirection, SortKey,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn enus() -> LocaleFlags {
    LocaleFlags::new(LocaleFlags::ENUS)
}

fn explorer(backend: MemoryBackend) -> Explorer {
    let names = backend.name_table();
    Explorer::new(Arc::new(backend), names, &ExplorerConfig::default())
        .expect("Failed to build explorer session")
}

fn names(projection: &Projection<'_>) -> Vec<String> {
    projection.iter().map(|e| e.name().to_string()).collect()
}

#[test]
fn test_listing_of_nested_folder() {
    let explorer = explorer(
        MemoryBackend::new()
            .with_file("a/b/c.txt", enus(), "c")
            .with_file("a/d.txt", enus(), "d"),
    );
    let tree = explorer.tree();

    let a = tree.find_folder("a").expect("folder a");
    assert_eq!(a.state(), ExpansionState::Unexpanded);

    let projection = Projection::new(a, SortKey::Name, SortDirection::Ascending);
    assert_eq!(a.state(), ExpansionState::Expanded);
    assert_eq!(names(&projection), vec!["b", "d.txt"]);
    assert_eq!(projection.get(0).map(Entry::kind), Some(EntryKind::Folder));

    let rows = explorer.rows(&tree, &projection).expect("rows");
    assert_eq!(rows[0].size, "<DIR>");
    assert_eq!(rows[1].size, "1");
    assert_eq!(rows[1].flags, "enUS (None)");
}

#[test]
fn test_navigation_pane_and_parent() {
    let explorer = explorer(
        MemoryBackend::new()
            .with_file("World/Maps/Azeroth/tile.adt", enus(), "t")
            .with_file("World/Minimaps/map.blp", enus(), "m")
            .with_file("Interface/icon.blp", enus(), "i"),
    );
    let tree = explorer.tree();

    let top: Vec<&str> = tree.root().subfolders().into_iter().map(|f| f.name()).collect();
    assert_eq!(top, vec!["Interface", "World"]);

    let world = tree.find_folder("world").expect("world");
    assert!(world.expand().has_subfolders());
    let maps = tree.find_folder("World\\Maps").expect("maps");
    let parent = tree.parent_of(maps.full_path()).expect("parent");
    assert_eq!(parent.full_path(), "World");
}

#[test]
fn test_reexpansion_keeps_children() {
    let explorer = explorer(
        MemoryBackend::new()
            .with_file("x/1.txt", enus(), "1")
            .with_file("x/2.txt", enus(), "2"),
    );
    let tree = explorer.tree();
    let x = tree.find_folder("x").expect("x");

    let first = *x.expand();
    let before: Vec<*const Entry> = x
        .children()
        .expect("expanded")
        .iter()
        .map(std::ptr::from_ref)
        .collect();
    let second = *x.expand();
    let after: Vec<*const Entry> = x
        .children()
        .expect("expanded")
        .iter()
        .map(std::ptr::from_ref)
        .collect();

    assert_eq!(first, second);
    assert_eq!(before, after);
}

#[test]
fn test_missing_root_entry_vs_locale_miss() {
    let explorer = explorer(MemoryBackend::new().with_file(
        "sound/de.ogg",
        LocaleFlags::new(LocaleFlags::DEDE),
        "de",
    ));

    assert_eq!(
        explorer.resolve("sound/de.ogg").expect("resolve"),
        Resolution::NoLocaleVariant
    );

    let missing = explorer
        .resolver()
        .resolve(NameHash::new(0xdead_beef), enus());
    assert!(matches!(missing, Err(ExplorerError::MissingRootEntry(_))));
}

#[test]
fn test_locale_switch_changes_row_to_no_variant() {
    let mut backend = MemoryBackend::new();
    backend.insert(
        "Fonts/arial.ttf",
        enus(),
        ContentFlags::new(ContentFlags::INSTALL),
        vec![0u8; 2048],
    );
    let explorer = explorer(backend);

    let tree = explorer.tree();
    let fonts = tree.find_folder("Fonts").expect("fonts");
    let projection = Projection::new(fonts, SortKey::Name, SortDirection::Ascending);
    let row = &explorer.rows(&tree, &projection).expect("rows")[0];
    assert_eq!(row.flags, "enUS (Install)");
    assert_eq!(row.size, "2 048");

    explorer
        .set_locale(LocaleFlags::new(LocaleFlags::FRFR))
        .expect("switch locale");
    let tree = explorer.tree();
    let fonts = tree.find_folder("Fonts").expect("file stays in the tree");
    let projection = Projection::new(fonts, SortKey::Name, SortDirection::Ascending);
    let row = &explorer.rows(&tree, &projection).expect("rows")[0];
    assert_eq!(row.name, "arial.ttf");
    assert!(row.flags.is_empty());
    assert!(row.size.is_empty());
}

#[test]
fn test_status_line_counts_unnamed_files() {
    let backend = MemoryBackend::new()
        .with_file("a.txt", enus(), "a")
        .with_file("b.txt", enus(), "b");
    // Only a.txt keeps its name
    let names: NameTable = ["a.txt"].into_iter().collect();
    let explorer = Explorer::new(Arc::new(backend), names, &ExplorerConfig::default())
        .expect("session");

    let tree = explorer.tree();
    assert_eq!(tree.status_line(), "Loaded 1 files (1 names missing)");
    let unknown = tree.find_folder("unknown").expect("unknown folder");
    assert_eq!(unknown.expand().file_count, 1);
}

#[test]
fn test_clipboard_paths_of_selection() {
    let explorer = explorer(
        MemoryBackend::new()
            .with_file("dbc/Spell.dbc", enus(), "s")
            .with_file("dbc/Item.dbc", enus(), "i")
            .with_file("dbc/sub/x.txt", enus(), "x"),
    );
    let tree = explorer.tree();
    let dbc = tree.find_folder("dbc").expect("dbc");
    let projection = Projection::new(dbc, SortKey::Kind, SortDirection::Ascending);

    assert_eq!(names(&projection), vec!["sub", "Spell.dbc", "Item.dbc"]);
    let all: Vec<usize> = (0..projection.len()).collect();
    assert_eq!(
        projection.file_paths(&all),
        vec!["dbc/Spell.dbc", "dbc/Item.dbc"]
    );
}

#[test]
fn test_rows_of_old_snapshot_keep_its_locale() {
    let explorer = explorer(
        MemoryBackend::new()
            .with_file("Fonts/arial.ttf", enus(), "font")
            .with_file("Fonts/arial.ttf", LocaleFlags::new(LocaleFlags::DEDE), "schrift"),
    );
    let before = explorer.tree();
    let fonts = before.find_folder("Fonts").expect("fonts");
    let projection = Projection::new(fonts, SortKey::Name, SortDirection::Ascending);

    explorer
        .set_locale(LocaleFlags::new(LocaleFlags::DEDE))
        .expect("switch locale");

    let row = &explorer.rows(&before, &projection).expect("rows")[0];
    assert_eq!(row.flags, "enUS (None)");
    assert_eq!(row.size, "4");

    let after = explorer.tree();
    let fonts = after.find_folder("Fonts").expect("fonts");
    let projection = Projection::new(fonts, SortKey::Name, SortDirection::Ascending);
    let row = &explorer.rows(&after, &projection).expect("rows")[0];
    assert_eq!(row.flags, "deDE (None)");
    assert_eq!(row.size, "7");
}
