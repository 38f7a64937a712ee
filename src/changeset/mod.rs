//! File-level change detection between two commits.
//!
//! [`analyze`] walks both trees path by path through an [`ObjectStore`] and
//! reports additions, deletions and edits. A deleted and an added path that
//! share a file name and clear the similarity threshold are reported as a
//! single edit carrying both paths, which is how moved tests are recognised.

mod git;
mod similarity;

pub use git::GitCli;
pub use similarity::{blob_similarity, line_similarity};

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::error::ChangeSetError;

/// Read-only access to version control objects.
pub trait ObjectStore {
    /// One entry per file path present in either tree whose blob differs.
    fn walk_trees(&self, old: &str, new: &str) -> Result<Vec<TreeEntryPair>, ChangeSetError>;

    fn read_blob(&self, id: &str, path: &str) -> Result<Vec<u8>, ChangeSetError>;

    fn resolve_head(&self) -> Result<String, ChangeSetError>;
}

/// A path with its blob id in the old and the new tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntryPair {
    pub path: String,
    pub old_id: Option<String>,
    pub new_id: Option<String>,
}

impl TreeEntryPair {
    /// Merges two `path -> blob id` listings, dropping unchanged paths.
    pub fn merge(old: BTreeMap<String, String>, new: BTreeMap<String, String>) -> Vec<Self> {
        let mut merged: BTreeMap<String, (Option<String>, Option<String>)> = old
            .into_iter()
            .map(|(path, id)| (path, (Some(id), None)))
            .collect();
        for (path, id) in new {
            merged.entry(path).or_default().1 = Some(id);
        }

        merged
            .into_iter()
            .filter(|(_, (old_id, new_id))| old_id != new_id)
            .map(|(path, (old_id, new_id))| Self {
                path,
                old_id,
                new_id,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    Add,
    Delete,
    Edit,
}

/// One changed file between the two commits.
///
/// For a deletion `new_path` repeats the removed path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScmAffectedFile {
    pub new_path: String,
    pub old_path: Option<String>,
    pub change_type: ChangeType,
    pub old_id: Option<String>,
    pub new_id: Option<String>,
}

impl ScmAffectedFile {
    fn added(path: String, id: String) -> Self {
        Self {
            new_path: path,
            old_path: None,
            change_type: ChangeType::Add,
            old_id: None,
            new_id: Some(id),
        }
    }

    fn deleted(path: String, id: String) -> Self {
        Self {
            old_path: Some(path.clone()),
            new_path: path,
            change_type: ChangeType::Delete,
            old_id: Some(id),
            new_id: None,
        }
    }

    fn edited(old_path: String, old_id: String, new_path: String, new_id: String) -> Self {
        Self {
            new_path,
            old_path: Some(old_path),
            change_type: ChangeType::Edit,
            old_id: Some(old_id),
            new_id: Some(new_id),
        }
    }

    /// The path the file had in the old tree.
    pub fn previous_path(&self) -> &str {
        self.old_path.as_deref().unwrap_or(&self.new_path)
    }

    pub fn is_move(&self) -> bool {
        self.change_type == ChangeType::Edit
            && self.old_path.as_deref().is_some_and(|old| old != self.new_path)
    }
}

/// Computes the affected files between `old` and `new`, sorted by new path.
pub fn analyze<S: ObjectStore + ?Sized>(
    store: &S,
    old: &str,
    new: &str,
    threshold: f64,
) -> Result<Vec<ScmAffectedFile>, ChangeSetError> {
    let pairs = store.walk_trees(old, new)?;
    debug!(old, new, changed_paths = pairs.len(), "walked trees");

    let mut affected = Vec::new();
    let mut deleted = Vec::new();
    let mut added = Vec::new();

    for pair in pairs {
        match (pair.old_id, pair.new_id) {
            (None, Some(id)) => added.push((pair.path, id)),
            (Some(id), None) => deleted.push((pair.path, id)),
            (Some(old_id), Some(new_id)) => {
                let score = blob_similarity(store, (&old_id, &pair.path), (&new_id, &pair.path));
                debug!(path = %pair.path, score, threshold, "modified in place");
                affected.push(ScmAffectedFile::edited(
                    pair.path.clone(),
                    old_id,
                    pair.path,
                    new_id,
                ));
            }
            (None, None) => {}
        }
    }

    affected.extend(pair_renames(store, deleted, added, threshold));
    affected.sort_by(|a, b| a.new_path.cmp(&b.new_path));

    info!(old, new, count = affected.len(), "computed change set");
    Ok(affected)
}

/// Matches each deleted path against the added paths with the same file name.
///
/// The best scoring candidate at or above `threshold` becomes an edit with
/// both paths. Whatever stays unmatched is reported as a plain add or delete.
fn pair_renames<S: ObjectStore + ?Sized>(
    store: &S,
    deleted: Vec<(String, String)>,
    added: Vec<(String, String)>,
    threshold: f64,
) -> Vec<ScmAffectedFile> {
    let mut unclaimed: Vec<Option<(String, String)>> = added.into_iter().map(Some).collect();
    let mut out = Vec::new();

    for (old_path, old_id) in deleted {
        let mut best: Option<(usize, f64)> = None;
        for (i, candidate) in unclaimed.iter().enumerate() {
            let Some((new_path, new_id)) = candidate else {
                continue;
            };
            if !file_name(new_path).eq_ignore_ascii_case(file_name(&old_path)) {
                continue;
            }
            let score = blob_similarity(store, (&old_id, &old_path), (new_id, new_path));
            if score >= threshold && best.map_or(true, |(_, s)| score > s) {
                best = Some((i, score));
            }
        }

        match best.and_then(|(i, score)| unclaimed[i].take().map(|c| (c, score))) {
            Some(((new_path, new_id), score)) => {
                debug!(from = %old_path, to = %new_path, score, "detected move");
                out.push(ScmAffectedFile::edited(old_path, old_id, new_path, new_id));
            }
            None => out.push(ScmAffectedFile::deleted(old_path, old_id)),
        }
    }

    out.extend(
        unclaimed
            .into_iter()
            .flatten()
            .map(|(path, id)| ScmAffectedFile::added(path, id)),
    );
    out
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
