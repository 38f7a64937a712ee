//! Discovery orchestration.
//!
//! Without a recorded sync commit the whole working tree is scanned and
//! everything is reported as NEW. Otherwise only the files changed since the
//! recorded commit are inspected. Either way the run produces a single
//! [`DiscoveryResult`] or fails as a whole.

mod full;
mod incremental;
pub mod postprocess;
mod result;

pub use result::DiscoveryResult;

use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

use crate::changeset::ObjectStore;
use crate::config::DiscoveryConfig;
use crate::error::{IoError, Result};
use crate::metadata;
use crate::model::{AutomatedTest, TestKind};
use crate::sync_marker::SyncMarker;

#[derive(Debug, Clone, Default)]
pub struct Discovery {
    config: DiscoveryConfig,
}

impl Discovery {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self { config }
    }

    /// Picks full or incremental mode from the sync marker and runs it.
    ///
    /// The marker is only read here; see [`record_synced`] for the write.
    pub fn run<S, M>(&self, work_dir: &Path, store: &S, marker: &M) -> Result<DiscoveryResult>
    where
        S: ObjectStore + ?Sized,
        M: SyncMarker + ?Sized,
    {
        if !work_dir.is_dir() {
            return Err(IoError::directory_not_found(work_dir).into());
        }

        let previous = marker.read_last_synced_commit()?;
        let head = store.resolve_head()?;
        info!(
            path = %work_dir.display(),
            head = %head,
            previous = previous.as_deref().unwrap_or("none"),
            tool_type = self.config.tool_type.as_str(),
            "starting discovery"
        );

        let result = match previous {
            None => self.full_scan(work_dir, &head)?,
            Some(previous) => self.incremental_scan(work_dir, store, &previous, &head)?,
        };

        info!(
            tests = result.all_tests().len(),
            resource_files = result.all_scm_resource_files().len(),
            full_sync = result.is_full_sync(),
            "discovery finished"
        );
        Ok(result)
    }

    /// Builds a test rooted at `test_dir`, reading its description and, when
    /// enabled, its actions.
    fn build_test(&self, root: &Path, test_dir: &Path, kind: TestKind) -> Result<AutomatedTest> {
        let (package_name, name) = test_identity(root, test_dir);
        let mut test = AutomatedTest::new(name, package_name, kind);
        debug!(test = %test.test_path(), kind = kind.as_str(), "building test");

        let metadata = metadata::extract(
            test_dir,
            kind,
            &test.name,
            &test.action_path_prefix(),
            self.config.tool_type.discovers_actions(),
        )?;
        test.description = metadata.description;
        test.actions = metadata.actions;
        Ok(test)
    }
}

/// Writes the head commit of a successful run to the marker unless it is
/// already recorded. Returns whether the marker was written.
pub fn record_synced<M: SyncMarker + ?Sized>(
    result: &DiscoveryResult,
    marker: &M,
) -> std::result::Result<bool, IoError> {
    if result.previous_commit() == Some(result.new_commit()) {
        debug!(commit = result.new_commit(), "synced commit unchanged");
        return Ok(false);
    }
    marker.write_last_synced_commit(result.new_commit())?;
    Ok(true)
}

/// `/`-joined path of `path` relative to `root`.
pub(crate) fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// `(package_name, name)` of the test folder `test_dir` under `root`.
fn test_identity(root: &Path, test_dir: &Path) -> (String, String) {
    let relative = relative_path(root, test_dir);
    if relative.is_empty() {
        let name = test_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        return (String::new(), name);
    }
    split_folder(&relative)
}

/// Absolute folder for a relative one; `""` is the root itself.
pub(crate) fn folder_dir(root: &Path, folder: &str) -> PathBuf {
    if folder.is_empty() {
        root.to_path_buf()
    } else {
        root.join(folder)
    }
}

/// `(package_name, name)` of a test rooted at the relative `folder`, named the
/// same way a full scan names it.
pub(crate) fn folder_identity(root: &Path, folder: &str) -> (String, String) {
    test_identity(root, &folder_dir(root, folder))
}

/// Splits a relative folder into its parent path and last segment.
pub(crate) fn split_folder(folder: &str) -> (String, String) {
    match folder.rsplit_once('/') {
        Some((package, name)) => (package.to_string(), name.to_string()),
        None => (String::new(), folder.to_string()),
    }
}
