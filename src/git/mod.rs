//! Git subprocess operations.
//!
//! Every git invocation the tool makes is one [`GitOp`] run through a
//! [`Git`] runner. A run never returns `Err` past this boundary in the
//! anyhow sense: failures (missing binary, non-zero exit, timeout) come back
//! as a [`GitFailure`] value and the caller decides whether that matters.

mod command;
mod humanish;

pub use command::{FailureKind, Git, GitFailure, GitResult};
pub use humanish::humanish;

use std::ffi::OsString;
use std::path::Path;

/// Marker file whose presence triggers submodule handling after clone/pull
pub const SUBMODULE_MANIFEST: &str = ".gitmodules";

/// One git subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitOp {
    /// `git clone <url> <dir>/<humanish(url)>`
    Clone(String),
    /// `git -C <dir> pull`
    Pull,
    /// `git -C <dir> rev-list -1 HEAD`
    RevList,
    /// `git -C <dir> log --oneline --graph --decorate <from>..<to>`
    Log { from: String, to: String },
    /// `git -C <dir> config --get remote.origin.url`
    GetRemoteUrl,
    /// `git -C <dir> submodule update --init --recursive`
    SubmoduleInit,
    /// `git -C <dir> submodule update --init --recursive`
    ///
    /// Also initializes submodules that a failed earlier clone left behind.
    SubmoduleUpdate,
}

impl GitOp {
    /// Short human label used in logs and progress output
    pub fn name(&self) -> &'static str {
        match self {
            GitOp::Clone(_) => "clone",
            GitOp::Pull => "pull",
            GitOp::RevList => "rev-list",
            GitOp::Log { .. } => "log",
            GitOp::GetRemoteUrl => "get-remote-url",
            GitOp::SubmoduleInit => "submodule-init",
            GitOp::SubmoduleUpdate => "submodule-update",
        }
    }

    /// Arguments passed to the git binary (program name excluded).
    ///
    /// For [`GitOp::Clone`], `dir` is the parent directory the repository is
    /// cloned into; for every other operation it is the repository itself.
    pub fn args(&self, dir: &Path) -> Vec<OsString> {
        let sub: Vec<String> = match self {
            GitOp::Clone(url) => {
                return vec![
                    "clone".into(),
                    url.into(),
                    dir.join(humanish(url)).into_os_string(),
                ];
            }
            GitOp::Pull => vec!["pull".into()],
            GitOp::RevList => vec!["rev-list".into(), "-1".into(), "HEAD".into()],
            GitOp::Log { from, to } => vec![
                "log".into(),
                "--oneline".into(),
                "--graph".into(),
                "--decorate".into(),
                format!("{from}..{to}"),
            ],
            GitOp::GetRemoteUrl => vec![
                "config".into(),
                "--get".into(),
                "remote.origin.url".into(),
            ],
            GitOp::SubmoduleInit => vec![
                "submodule".into(),
                "update".into(),
                "--init".into(),
                "--recursive".into(),
            ],
            GitOp::SubmoduleUpdate => vec![
                "submodule".into(),
                "update".into(),
                "--init".into(),
                "--recursive".into(),
            ],
        };

        let mut args: Vec<OsString> = Vec::with_capacity(sub.len() + 3);
        if matches!(self, GitOp::Log { .. }) {
            args.push("--no-pager".into());
        }
        args.push("-C".into());
        args.push(dir.as_os_str().to_owned());
        args.extend(sub.into_iter().map(OsString::from));
        args
    }
}

/// Check if a directory is the root of a git working tree.
///
/// Only the directory itself is inspected; a plain directory nested inside
/// some other repository is not a repository of its own.
pub fn is_repo(path: &Path) -> bool {
    path.join(".git").exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_clone_args_use_humanish_target() {
        let op = GitOp::Clone("https://github.com/tpope/vim-commentary.git".into());
        let args = strings(op.args(&PathBuf::from("/pack/common/start")));
        assert_eq!(
            args,
            vec![
                "clone",
                "https://github.com/tpope/vim-commentary.git",
                "/pack/common/start/vim-commentary"
            ]
        );
    }

    #[test]
    fn test_pull_args_use_dash_c() {
        let args = strings(GitOp::Pull.args(&PathBuf::from("/pack/a/start/p")));
        assert_eq!(args, vec!["-C", "/pack/a/start/p", "pull"]);
    }

    #[test]
    fn test_log_args_disable_pager_and_format_range() {
        let op = GitOp::Log {
            from: "aaa".into(),
            to: "bbb".into(),
        };
        let args = strings(op.args(&PathBuf::from("/r")));
        assert_eq!(args[0], "--no-pager");
        assert_eq!(args.last().unwrap(), "aaa..bbb");
    }

    #[test]
    fn test_remote_url_args() {
        let args = strings(GitOp::GetRemoteUrl.args(&PathBuf::from("/r")));
        assert_eq!(args, vec!["-C", "/r", "config", "--get", "remote.origin.url"]);
    }

    #[test]
    fn test_submodule_update_also_initializes() {
        let args = strings(GitOp::SubmoduleUpdate.args(&PathBuf::from("/r")));
        assert_eq!(
            args,
            vec!["-C", "/r", "submodule", "update", "--init", "--recursive"]
        );
    }

    #[test]
    fn test_is_repo() {
        let temp = TempDir::new().unwrap();
        assert!(!is_repo(temp.path()));

        std::fs::create_dir(temp.path().join(".git")).unwrap();
        assert!(is_repo(temp.path()));
    }
}
