//! Installed plugin discovery.
//!
//! The pack directory plus each repository's git metadata is the only record
//! of what is installed; nothing is cached between runs.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::declared::PluginType;
use crate::error::VimpckError;
use crate::git::{is_repo, Git, GitOp};

/// `<package>/<start|opt>/<plugin>`
pub const PLUGIN_DEPTH: usize = 3;

/// A plugin directory found on disk together with its origin URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPlugin {
    /// Path relative to the pack root
    pub rel_path: PathBuf,
    pub url: String,
}

impl InstalledPlugin {
    fn component(&self, idx: usize) -> Option<&str> {
        self.rel_path
            .components()
            .nth(idx)
            .and_then(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
    }

    pub fn package(&self) -> Option<&str> {
        self.component(0)
    }

    /// `None` when the middle directory is neither `start` nor `opt`
    pub fn kind(&self) -> Option<PluginType> {
        self.component(1).and_then(PluginType::from_dir_name)
    }

    /// Directory name of the plugin itself
    pub fn name(&self) -> Option<&str> {
        self.component(2)
    }
}

/// Every plugin found under a pack root
#[derive(Debug, Clone, Default)]
pub struct Installed {
    root: PathBuf,
    plugins: Vec<InstalledPlugin>,
}

impl Installed {
    pub fn new(root: impl Into<PathBuf>, plugins: Vec<InstalledPlugin>) -> Self {
        Self {
            root: root.into(),
            plugins,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn plugins(&self) -> &[InstalledPlugin] {
        &self.plugins
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn urls(&self) -> BTreeSet<String> {
        self.plugins.iter().map(|p| p.url.clone()).collect()
    }

    /// Relative path → remote URL
    pub fn by_path(&self) -> BTreeMap<PathBuf, String> {
        self.plugins
            .iter()
            .map(|p| (p.rel_path.clone(), p.url.clone()))
            .collect()
    }

    /// First plugin cloned from `url`
    pub fn find_url(&self, url: &str) -> Option<&InstalledPlugin> {
        self.plugins.iter().find(|p| p.url == url)
    }

    /// Plugins whose directory name is `name`
    pub fn find_name(&self, name: &str) -> Vec<&InstalledPlugin> {
        self.plugins
            .iter()
            .filter(|p| p.name() == Some(name))
            .collect()
    }

    /// Absolute directory of an installed plugin
    pub fn abs_path(&self, plugin: &InstalledPlugin) -> PathBuf {
        self.root.join(&plugin.rel_path)
    }
}

/// Directories exactly [`PLUGIN_DEPTH`] levels below `root`, sorted.
///
/// Sparse trees are fine: a package with only `start/` simply contributes
/// nothing under `opt/`. Shallower directories are never returned, and
/// `.git` directories are not descended into.
pub fn leaf_dirs(root: &Path) -> Result<Vec<PathBuf>, VimpckError> {
    if !root.is_dir() {
        return Err(VimpckError::NotADirectory(root.to_path_buf()));
    }

    let mut leaves = Vec::new();
    for entry in WalkDir::new(root)
        .max_depth(PLUGIN_DEPTH)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || e.file_name() != ".git")
    {
        match entry {
            Ok(entry) if entry.depth() == PLUGIN_DEPTH && entry.file_type().is_dir() => {
                leaves.push(entry.into_path())
            }
            Ok(_) => {}
            Err(e) => log::warn!("Skipping unreadable entry under {}: {}", root.display(), e),
        }
    }

    Ok(leaves)
}

/// Find installed plugins under `root` and resolve their remote URLs.
///
/// Leaves that are not repositories, or whose `remote.origin.url` is unset,
/// are left out without error. A missing root is an error so that "nothing
/// installed yet" is never confused with "nothing there".
pub fn discover(root: &Path, git: &Git) -> Result<Installed, VimpckError> {
    let mut plugins = Vec::new();

    for leaf in leaf_dirs(root)? {
        if !is_repo(&leaf) {
            log::debug!("{} is not a git repository, ignoring", leaf.display());
            continue;
        }

        match git.run(&leaf, &GitOp::GetRemoteUrl) {
            Ok(url) if !url.trim().is_empty() => {
                let rel_path = leaf.strip_prefix(root).unwrap_or(&leaf).to_path_buf();
                log::debug!("Found {} -> {}", rel_path.display(), url.trim());
                plugins.push(InstalledPlugin {
                    rel_path,
                    url: url.trim().to_string(),
                });
            }
            Ok(_) => log::debug!("{} has an empty origin url, ignoring", leaf.display()),
            Err(failure) => {
                log::debug!("{} has no origin remote: {}", leaf.display(), failure)
            }
        }
    }

    Ok(Installed::new(root, plugins))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_root_is_error() {
        let temp = TempDir::new().unwrap();
        let err = leaf_dirs(&temp.path().join("absent")).unwrap_err();
        assert!(matches!(err, VimpckError::NotADirectory(_)));
    }

    #[test]
    fn test_only_depth_three_directories_are_leaves() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("common/start/vim-commentary/plugin")).unwrap();
        fs::create_dir_all(root.join("common/opt/vim-dispatch")).unwrap();
        fs::create_dir_all(root.join("colors/start")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("common/start/README"), "not a dir").unwrap();

        let leaves = leaf_dirs(root).unwrap();
        assert_eq!(
            leaves,
            vec![
                root.join("common/opt/vim-dispatch"),
                root.join("common/start/vim-commentary"),
            ]
        );
    }

    #[test]
    fn test_empty_root_has_no_leaves() {
        let temp = TempDir::new().unwrap();
        assert!(leaf_dirs(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_non_repo_leaves_are_skipped() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("a/start/not-a-repo")).unwrap();

        let installed = discover(temp.path(), &Git::new()).unwrap();
        assert!(installed.is_empty());
    }

    #[test]
    fn test_installed_plugin_components() {
        let plugin = InstalledPlugin {
            rel_path: PathBuf::from("filetype/opt/vim-mustache-handlebars"),
            url: "https://github.com/mustache/vim-mustache-handlebars".into(),
        };
        assert_eq!(plugin.package(), Some("filetype"));
        assert_eq!(plugin.kind(), Some(PluginType::Opt));
        assert_eq!(plugin.name(), Some("vim-mustache-handlebars"));

        let odd = InstalledPlugin {
            rel_path: PathBuf::from("misc/later/thing"),
            url: "u".into(),
        };
        assert_eq!(odd.kind(), None);
    }
}
