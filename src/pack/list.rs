use anyhow::Result;
use std::path::PathBuf;

use super::Reconciler;
use crate::declared::PluginType;

/// One row of `vimpck ls`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedPlugin {
    pub rel_path: PathBuf,
    pub url: String,
    pub kind: Option<PluginType>,
    /// Declared with `freeze = true`
    pub frozen: bool,
    /// Installed but no longer declared
    pub orphan: bool,
}

impl Reconciler<'_> {
    /// Installed plugins, optionally restricted to one loading type.
    pub fn list(&self, only: Option<PluginType>) -> Result<Vec<ListedPlugin>> {
        self.require_pack_path()?;
        let installed = self.installed()?;

        Ok(installed
            .plugins()
            .iter()
            .filter(|p| only.is_none() || p.kind() == only)
            .map(|p| {
                let declared = self.declared.get(&p.url);
                ListedPlugin {
                    rel_path: p.rel_path.clone(),
                    url: p.url.clone(),
                    kind: p.kind(),
                    frozen: declared.is_some_and(|e| e.freeze),
                    orphan: declared.is_none(),
                }
            })
            .collect())
    }
}
