// tests/loader_fs_tests.rs
use std::fs;
use std::path::Path;

use riddlebot_core::loader::{LibraryModuleSource, ModuleSource};

#[cfg(target_os = "windows")]
const EXT: &str = "dll";
#[cfg(target_os = "macos")]
const EXT: &str = "dylib";
#[cfg(all(not(target_os = "windows"), not(target_os = "macos")))]
const EXT: &str = "so";

fn touch(path: &Path) {
    fs::write(path, b"").unwrap();
}

#[test]
fn discover_finds_nested_libraries_in_sorted_order() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    fs::create_dir(root.join("admin")).unwrap();
    touch(&root.join(format!("zeta.{EXT}")));
    touch(&root.join(format!("alpha.{EXT}")));
    touch(&root.join(format!("admin/kick.{EXT}")));
    touch(&root.join("notes.txt"));

    let source = LibraryModuleSource;
    let paths = source.discover(root).unwrap();
    assert_eq!(
        paths,
        vec![
            root.join(format!("admin/kick.{EXT}")),
            root.join(format!("alpha.{EXT}")),
            root.join(format!("zeta.{EXT}")),
        ]
    );
}

#[test]
fn discover_of_missing_root_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let source = LibraryModuleSource;
    let paths = source.discover(&dir.path().join("does-not-exist")).unwrap();
    assert!(paths.is_empty());
}

#[test]
fn only_platform_libraries_are_loadable() {
    let source = LibraryModuleSource;
    assert!(source.is_loadable(Path::new(&format!("commands/ping.{EXT}"))));
    assert!(!source.is_loadable(Path::new("commands/ping.txt")));
    assert!(!source.is_loadable(Path::new("commands/ping")));
}
