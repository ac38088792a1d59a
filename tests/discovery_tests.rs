//! Discovery against hand-built pack trees.

use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;
use vimpck::discovery::{discover, leaf_dirs};
use vimpck::{Git, VimpckError};

fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git").args(args).current_dir(dir).output().unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// An empty repository whose origin points at `url`
fn fake_plugin(root: &Path, rel: &str, url: Option<&str>) {
    let dir = root.join(rel);
    fs::create_dir_all(&dir).unwrap();
    git(&dir, &["init", "-q"]);
    if let Some(url) = url {
        git(&dir, &["remote", "add", "origin", url]);
    }
}

#[test]
fn test_four_fake_plugins_are_discovered() {
    if !Git::new().is_available() {
        eprintln!("Skipping: git not installed");
        return;
    }
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    let plugins = [
        ("colors/start/vim-colors-solarized", "fake_url1"),
        ("filetype/opt/vim-mustache-handlebars", "fake_url2"),
        ("filetype/start/vim-dispatch", "fake_url3"),
        ("common/start/vim-commentary", "fake_url4"),
    ];
    for (rel, url) in plugins {
        fake_plugin(root, rel, Some(url));
    }

    let installed = discover(root, &Git::new()).unwrap();
    let by_path = installed.by_path();
    assert_eq!(by_path.len(), 4);
    for (rel, url) in plugins {
        assert_eq!(by_path[Path::new(rel)], url);
    }
}

#[test]
fn test_depth_invariant_ignores_other_levels() {
    if !Git::new().is_available() {
        eprintln!("Skipping: git not installed");
        return;
    }
    let temp = TempDir::new().unwrap();
    let root = temp.path();

    fake_plugin(root, "common/start/vim-commentary", Some("https://example.com/vim-commentary"));
    // a repository at package level is not a plugin
    fake_plugin(root, "shallow", Some("https://example.com/shallow"));
    // nested one level too deep
    fake_plugin(root, "common/start/vim-commentary/deps/inner", Some("https://example.com/inner"));
    // git tree without a remote and a plain directory
    fake_plugin(root, "common/opt/no-remote", None);
    fs::create_dir_all(root.join("common/opt/plain-dir")).unwrap();
    // sparse package with only a type directory
    fs::create_dir_all(root.join("colors/start")).unwrap();

    assert_eq!(leaf_dirs(root).unwrap().len(), 3);

    let installed = discover(root, &Git::new()).unwrap();
    assert_eq!(installed.len(), 1);
    assert_eq!(
        installed.plugins()[0].rel_path,
        Path::new("common/start/vim-commentary")
    );
}

#[test]
fn test_discover_missing_root_fails() {
    let temp = TempDir::new().unwrap();
    let err = discover(&temp.path().join("missing"), &Git::new()).unwrap_err();
    assert!(matches!(err, VimpckError::NotADirectory(_)));
}
