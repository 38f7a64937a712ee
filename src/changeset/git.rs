use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, trace};

use super::{ObjectStore, TreeEntryPair};
use crate::error::ChangeSetError;

/// Object store backed by the `git` command line in a working tree.
#[derive(Debug, Clone)]
pub struct GitCli {
    work_dir: PathBuf,
}

impl GitCli {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    fn run(&self, args: &[&str]) -> Result<Vec<u8>, ChangeSetError> {
        let command = args.join(" ");
        trace!(command = %command, "running git");

        let output = Command::new("git")
            .arg("-C")
            .arg(&self.work_dir)
            .args(args)
            .output()
            .map_err(|e| ChangeSetError::spawn(&command, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ChangeSetError::command_failed(command, stderr));
        }
        Ok(output.stdout)
    }

    fn verify_commit(&self, rev: &str) -> Result<(), ChangeSetError> {
        let spec = format!("{rev}^{{commit}}");
        self.run(&["rev-parse", "--verify", "--quiet", &spec])
            .map(|_| ())
            .map_err(|_| ChangeSetError::unknown_revision(rev))
    }

    /// Blob ids of every file in the tree of `rev`, keyed by path.
    fn list_tree(&self, rev: &str) -> Result<BTreeMap<String, String>, ChangeSetError> {
        self.verify_commit(rev)?;
        let stdout = self.run(&["ls-tree", "-r", "-z", "--full-tree", rev])?;
        parse_tree_listing(&stdout)
    }
}

impl ObjectStore for GitCli {
    fn walk_trees(&self, old: &str, new: &str) -> Result<Vec<TreeEntryPair>, ChangeSetError> {
        let old_tree = self.list_tree(old)?;
        let new_tree = self.list_tree(new)?;
        debug!(
            old_entries = old_tree.len(),
            new_entries = new_tree.len(),
            "listed trees"
        );
        Ok(TreeEntryPair::merge(old_tree, new_tree))
    }

    fn read_blob(&self, id: &str, path: &str) -> Result<Vec<u8>, ChangeSetError> {
        self.run(&["cat-file", "blob", id]).map_err(|e| match e {
            ChangeSetError::CommandFailed { message, .. } => {
                ChangeSetError::blob_unreadable(id, path, message)
            }
            other => other,
        })
    }

    fn resolve_head(&self) -> Result<String, ChangeSetError> {
        let stdout = self.run(&["rev-parse", "HEAD"])?;
        let head = String::from_utf8_lossy(&stdout).trim().to_string();
        if head.is_empty() {
            return Err(ChangeSetError::unknown_revision("HEAD"));
        }
        Ok(head)
    }
}

/// Parses `git ls-tree -r -z` output: `<mode> SP <type> SP <id> TAB <path>` records
/// separated by NUL. Only blobs are kept.
fn parse_tree_listing(stdout: &[u8]) -> Result<BTreeMap<String, String>, ChangeSetError> {
    let mut entries = BTreeMap::new();
    for record in stdout.split(|&b| b == 0).filter(|r| !r.is_empty()) {
        let line = String::from_utf8_lossy(record);
        let (meta, path) = line
            .split_once('\t')
            .ok_or_else(|| ChangeSetError::malformed_tree_entry(line.to_string()))?;

        let mut fields = meta.split(' ');
        let (Some(_mode), Some(kind), Some(id)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(ChangeSetError::malformed_tree_entry(line.to_string()));
        };
        if kind == "blob" {
            entries.insert(path.to_string(), id.to_string());
        }
    }
    Ok(entries)
}
