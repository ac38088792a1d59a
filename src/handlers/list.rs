use anyhow::Result;
use colored::Colorize;

use crate::declared::{DeclaredState, PluginType};
use crate::git::Git;
use crate::pack::Reconciler;

/// Handle `vimpck ls [--start|--opt]`
pub fn handle_list(declared: &DeclaredState, git: &Git, only: Option<PluginType>) -> Result<()> {
    let plugins = Reconciler::new(declared, git).list(only)?;

    if plugins.is_empty() {
        println!("{}", "No plugins installed".dimmed());
        return Ok(());
    }

    let width = plugins
        .iter()
        .map(|p| p.rel_path.display().to_string().len())
        .max()
        .unwrap_or(0);

    for plugin in &plugins {
        let path = format!("{:width$}", plugin.rel_path.display().to_string());
        let mut line = format!("{}  {}", path.bold(), plugin.url.dimmed());
        if plugin.frozen {
            line.push_str(&format!("  {}", "[frozen]".cyan()));
        }
        if plugin.orphan {
            line.push_str(&format!("  {}", "[orphan]".yellow()));
        }
        println!("{line}");
    }

    Ok(())
}
