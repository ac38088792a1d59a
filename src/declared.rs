use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use toml_edit::DocumentMut;

use crate::config::{expand_tilde, ConfigManager, ConfigSource};
use crate::error::VimpckError;
use crate::git::humanish;

/// Package group used when a declaration names none
pub const DEFAULT_PACKAGE: &str = "vimpck";

/// Loading category understood by the editor's native package loader
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginType {
    /// Loaded automatically at startup
    #[default]
    Start,
    /// Loaded on demand with `:packadd`
    Opt,
}

impl PluginType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginType::Start => "start",
            PluginType::Opt => "opt",
        }
    }

    pub fn from_dir_name(name: &str) -> Option<Self> {
        match name {
            "start" => Some(PluginType::Start),
            "opt" => Some(PluginType::Opt),
            _ => None,
        }
    }
}

impl fmt::Display for PluginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared plugin, keyed by its remote URL, with every attribute resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginEntry {
    pub url: String,
    pub package: String,
    pub kind: PluginType,
    pub freeze: bool,
}

impl PluginEntry {
    /// Entry with all defaults applied
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            package: DEFAULT_PACKAGE.to_string(),
            kind: PluginType::default(),
            freeze: false,
        }
    }

    /// Local directory name the plugin is cloned under
    pub fn name(&self) -> String {
        humanish(&self.url)
    }
}

/// Directory a plugin gets cloned into: `<pack_path>/<package>/<type>`
pub fn resolve_target_dir(pack_path: &Path, entry: &PluginEntry) -> PathBuf {
    pack_path.join(&entry.package).join(entry.kind.as_str())
}

/// Full path of the plugin's working tree once installed
pub fn plugin_dir(pack_path: &Path, entry: &PluginEntry) -> PathBuf {
    resolve_target_dir(pack_path, entry).join(entry.name())
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    pack_path: String,
    #[serde(default)]
    git_timeout_secs: Option<u64>,
    #[serde(default)]
    plugins: BTreeMap<String, RawPlugin>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPlugin {
    package: Option<String>,
    #[serde(rename = "type")]
    kind: Option<PluginType>,
    freeze: Option<bool>,
}

/// The validated, defaulted configuration.
///
/// Built fresh on every invocation. Missing `package`, `type` and `freeze`
/// keys are filled with their defaults once, at load time; values that are
/// present but invalid reject the whole file.
#[derive(Debug, Clone)]
pub struct DeclaredState {
    pack_path: PathBuf,
    git_timeout: Option<Duration>,
    entries: BTreeMap<String, PluginEntry>,
    source: Option<PathBuf>,
}

impl DeclaredState {
    /// Resolve the configuration file from `sources` and load it.
    pub fn load(sources: &[ConfigSource]) -> Result<Self, VimpckError> {
        let path = ConfigManager::resolve(sources)?;
        Self::from_file(&path)
    }

    pub fn from_file(path: &Path) -> Result<Self, VimpckError> {
        let content = fs::read_to_string(path).map_err(|e| VimpckError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut state = Self::from_toml_str(&content, path)?;

        // Relative pack paths are anchored at the file that declares them
        if state.pack_path.is_relative() {
            if let Some(parent) = path.parent() {
                state.pack_path = parent.join(&state.pack_path);
            }
        }
        state.source = Some(path.to_path_buf());
        Ok(state)
    }

    /// Parse configuration text; `origin` is only used in error messages.
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, VimpckError> {
        let raw: RawConfig = toml::from_str(content).map_err(|e| VimpckError::ConfigParse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;

        if raw.pack_path.trim().is_empty() {
            return Err(VimpckError::InvalidConfig("pack_path is empty".into()));
        }

        let mut entries = BTreeMap::new();
        for (url, plugin) in raw.plugins {
            let entry = sanitize(url, plugin)?;
            entries.insert(entry.url.clone(), entry);
        }

        let pack_path = expand_tilde(raw.pack_path.trim());
        check_unique_targets(&pack_path, &entries)?;

        Ok(Self {
            pack_path,
            git_timeout: raw.git_timeout_secs.filter(|s| *s > 0).map(Duration::from_secs),
            entries,
            source: None,
        })
    }

    /// Build a state directly from resolved entries.
    pub fn from_entries(
        pack_path: impl Into<PathBuf>,
        entries: impl IntoIterator<Item = PluginEntry>,
    ) -> Self {
        Self {
            pack_path: pack_path.into(),
            git_timeout: None,
            entries: entries.into_iter().map(|e| (e.url.clone(), e)).collect(),
            source: None,
        }
    }

    pub fn pack_path(&self) -> &Path {
        &self.pack_path
    }

    pub fn git_timeout(&self) -> Option<Duration> {
        self.git_timeout
    }

    /// File the state was loaded from, if any
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn entries(&self) -> &BTreeMap<String, PluginEntry> {
        &self.entries
    }

    pub fn get(&self, url: &str) -> Option<&PluginEntry> {
        self.entries.get(url)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    pub fn urls(&self) -> BTreeSet<String> {
        self.entries.keys().cloned().collect()
    }

    /// URLs of every declaration not marked `freeze`
    pub fn freeze_false(&self) -> BTreeSet<String> {
        self.entries
            .values()
            .filter(|e| !e.freeze)
            .map(|e| e.url.clone())
            .collect()
    }

    /// Declarations whose local directory name is `name`
    pub fn find_by_name(&self, name: &str) -> Vec<&PluginEntry> {
        self.entries.values().filter(|e| e.name() == name).collect()
    }
}

fn sanitize(url: String, raw: RawPlugin) -> Result<PluginEntry, VimpckError> {
    if url.trim().is_empty() {
        return Err(VimpckError::InvalidConfig("empty plugin url".into()));
    }
    // `rm -r` removes declarations by this exact key
    if url.trim() != url {
        return Err(VimpckError::InvalidConfig(format!(
            "plugin url '{url}' has leading or trailing whitespace"
        )));
    }
    if humanish(&url).is_empty() {
        return Err(VimpckError::InvalidConfig(format!(
            "cannot derive a directory name from url '{url}'"
        )));
    }

    let package = match raw.package {
        Some(p) => {
            validate_package(&url, &p)?;
            p
        }
        None => DEFAULT_PACKAGE.to_string(),
    };

    Ok(PluginEntry {
        url,
        package,
        kind: raw.kind.unwrap_or_default(),
        freeze: raw.freeze.unwrap_or(false),
    })
}

/// A package is exactly one directory level under the pack path.
fn validate_package(url: &str, package: &str) -> Result<(), VimpckError> {
    let bad = package.is_empty()
        || package == "."
        || package == ".."
        || package.contains('/')
        || package.contains('\\');
    if bad {
        return Err(VimpckError::InvalidConfig(format!(
            "invalid package '{package}' for {url}: must be a single directory name"
        )));
    }
    Ok(())
}

fn check_unique_targets(
    pack_path: &Path,
    entries: &BTreeMap<String, PluginEntry>,
) -> Result<(), VimpckError> {
    let mut seen: HashMap<PathBuf, &str> = HashMap::new();
    for entry in entries.values() {
        let dir = plugin_dir(pack_path, entry);
        if let Some(other) = seen.insert(dir.clone(), &entry.url) {
            return Err(VimpckError::InvalidConfig(format!(
                "{} and {} would both be installed to {}",
                other,
                entry.url,
                dir.display()
            )));
        }
    }
    Ok(())
}

/// Delete the `[plugins."<url>"]` tables for `urls` from the configuration
/// file, keeping the rest of the document (comments, ordering) intact.
///
/// Returns how many declarations were removed. The file is only rewritten
/// when something changed.
pub fn remove_declarations(config_path: &Path, urls: &[String]) -> Result<usize> {
    let content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let mut doc = content
        .parse::<DocumentMut>()
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

    let mut removed = 0;
    if let Some(plugins) = doc
        .get_mut("plugins")
        .and_then(|item| item.as_table_like_mut())
    {
        for url in urls {
            if plugins.remove(url).is_some() {
                removed += 1;
            }
        }
    }

    if removed > 0 {
        fs::write(config_path, doc.to_string())
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;
        log::info!(
            "Removed {} declaration(s) from {}",
            removed,
            config_path.display()
        );
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CLEAN: &str = r#"
pack_path = "/home/me/.vim/pack"

[plugins."https://github.com/tpope/vim-commentary"]
package = "common"
type = "start"
freeze = true

[plugins."https://github.com/tpope/vim-dispatch"]
package = "common"
type = "opt"

[plugins."https://github.com/mustache/vim-mustache-handlebars"]
package = "filetype"
type = "start"

[plugins."https://github.com/altercation/vim-colors-solarized"]
package = "colors"
type = "start"
freeze = false
"#;

    fn parse(content: &str) -> Result<DeclaredState, VimpckError> {
        DeclaredState::from_toml_str(content, Path::new("config.toml"))
    }

    #[test]
    fn test_clean_config_loads_every_entry() {
        let state = parse(CLEAN).unwrap();
        assert_eq!(state.pack_path(), Path::new("/home/me/.vim/pack"));
        assert_eq!(state.entries().len(), 4);

        let dispatch = state.get("https://github.com/tpope/vim-dispatch").unwrap();
        assert_eq!(dispatch.package, "common");
        assert_eq!(dispatch.kind, PluginType::Opt);
        assert!(!dispatch.freeze);
    }

    #[test]
    fn test_missing_keys_get_defaults() {
        let state = parse(
            r#"
pack_path = "/pack"
[plugins."https://github.com/neomake/neomake"]
package = "linter"
[plugins."https://github.com/tpope/vim-surround"]
"#,
        )
        .unwrap();

        let neomake = state.get("https://github.com/neomake/neomake").unwrap();
        assert_eq!(neomake.package, "linter");
        assert_eq!(neomake.kind, PluginType::Start);
        assert!(!neomake.freeze);

        let surround = state.get("https://github.com/tpope/vim-surround").unwrap();
        assert_eq!(surround, &PluginEntry::new("https://github.com/tpope/vim-surround"));
    }

    #[test]
    fn test_freeze_false_excludes_frozen() {
        let state = parse(CLEAN).unwrap();
        let unfrozen = state.freeze_false();
        assert_eq!(unfrozen.len(), 3);
        assert!(!unfrozen.contains("https://github.com/tpope/vim-commentary"));
    }

    #[test]
    fn test_invalid_type_rejected() {
        let err = parse(
            r#"
pack_path = "/pack"
[plugins."https://github.com/a/b"]
type = "later"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, VimpckError::ConfigParse { .. }));
    }

    #[test]
    fn test_package_with_separator_rejected() {
        let err = parse(
            r#"
pack_path = "/pack"
[plugins."https://github.com/mustache/vim-mustache-handlebars"]
package = "/filetype"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, VimpckError::InvalidConfig(_)));
        assert!(err.to_string().contains("/filetype"));
    }

    #[test]
    fn test_url_with_surrounding_whitespace_rejected() {
        let err = parse(
            r#"
pack_path = "/pack"
[plugins." https://github.com/tpope/vim-dispatch "]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, VimpckError::InvalidConfig(_)));
        assert!(err.to_string().contains("whitespace"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = parse(
            r#"
pack_path = "/pack"
[plugins."https://github.com/a/b"]
branch = "main"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, VimpckError::ConfigParse { .. }));
    }

    #[test]
    fn test_missing_pack_path_rejected() {
        assert!(parse("[plugins.\"https://github.com/a/b\"]\n").is_err());
        assert!(parse("pack_path = \"  \"\n").is_err());
    }

    #[test]
    fn test_same_target_dir_rejected() {
        let err = parse(
            r#"
pack_path = "/pack"
[plugins."https://github.com/one/vim-foo"]
[plugins."https://gitlab.com/two/vim-foo.git"]
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("would both be installed"));
    }

    #[test]
    fn test_timeout_parsed() {
        let state = parse("pack_path = \"/p\"\ngit_timeout_secs = 90\n").unwrap();
        assert_eq!(state.git_timeout(), Some(Duration::from_secs(90)));

        let state = parse("pack_path = \"/p\"\ngit_timeout_secs = 0\n").unwrap();
        assert_eq!(state.git_timeout(), None);
    }

    #[test]
    fn test_target_dir_layout() {
        let entry = PluginEntry {
            url: "https://github.com/tpope/vim-dispatch.git".into(),
            package: "common".into(),
            kind: PluginType::Opt,
            freeze: false,
        };
        let pack = Path::new("/pack");
        assert_eq!(resolve_target_dir(pack, &entry), PathBuf::from("/pack/common/opt"));
        assert_eq!(plugin_dir(pack, &entry), PathBuf::from("/pack/common/opt/vim-dispatch"));
    }

    #[test]
    fn test_relative_pack_path_anchored_at_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "pack_path = \"pack\"\n").unwrap();

        let state = DeclaredState::from_file(&path).unwrap();
        assert_eq!(state.pack_path(), temp.path().join("pack"));
        assert_eq!(state.source(), Some(path.as_path()));
    }

    #[test]
    fn test_remove_declarations_keeps_comments() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            format!("# my plugins\n{CLEAN}"),
        )
        .unwrap();

        let removed = remove_declarations(
            &path,
            &[
                "https://github.com/tpope/vim-dispatch".to_string(),
                "https://example.com/not/declared".to_string(),
            ],
        )
        .unwrap();
        assert_eq!(removed, 1);

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# my plugins"));
        assert!(!content.contains("vim-dispatch"));

        let state = DeclaredState::from_file(&path).unwrap();
        assert_eq!(state.entries().len(), 3);
    }
}
