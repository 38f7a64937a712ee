use std::fs;
use std::path::Path;
use tracing::{debug, info};

use super::postprocess::{dedup_tests, remove_false_positives, sort_resource_files, sort_tests};
use super::{folder_dir, folder_identity, Discovery, DiscoveryResult};
use crate::changeset::{self, ChangeType, ObjectStore, ScmAffectedFile};
use crate::classifier;
use crate::error::Result;
use crate::model::{AutomatedTest, OctaneStatus, ScmResourceFile, TestKind};

/// Old and new commit bracketing the change set.
struct ChangeSetIds<'a> {
    src: &'a str,
    dst: &'a str,
}

impl Discovery {
    /// Inspects only the files changed between `previous` and `head`.
    pub fn incremental_scan<S: ObjectStore + ?Sized>(
        &self,
        work_dir: &Path,
        store: &S,
        previous: &str,
        head: &str,
    ) -> Result<DiscoveryResult> {
        info!(previous, head, "starting incremental scan");
        let affected =
            changeset::analyze(store, previous, head, self.config.similarity_threshold)?;
        let ids = ChangeSetIds {
            src: previous,
            dst: head,
        };

        let mut tests = Vec::new();
        let mut files = Vec::new();
        for file in &affected {
            let path = file.new_path.as_str();
            if self.in_skipped_folder(path) {
                debug!(path, "change inside a skipped folder, ignoring");
                continue;
            }
            if classifier::is_test_main_file(path) {
                tests.extend(self.test_from_main_file(work_dir, file, &ids)?);
            } else if self.config.tool_type.discovers_actions()
                && classifier::is_action_parameter_file(path)
            {
                tests.extend(self.test_from_parameter_file(work_dir, file, &ids)?);
            } else if classifier::is_data_table_file(path) {
                files.extend(resource_from_change(work_dir, file, &ids));
            }
        }

        let mut tests = dedup_tests(tests);
        let mut files = remove_false_positives(&tests, files);
        sort_tests(&mut tests);
        sort_resource_files(&mut files);

        info!(
            affected_files = affected.len(),
            tests = tests.len(),
            resource_files = files.len(),
            "incremental scan finished"
        );
        Ok(DiscoveryResult::new(
            head,
            Some(previous.to_string()),
            tests,
            files,
            false,
        ))
    }

    /// Any folder on the way to `path` is one a full scan would not enter.
    fn in_skipped_folder(&self, path: &str) -> bool {
        let Some(folder) = parent_folder(path) else {
            return false;
        };
        folder
            .split('/')
            .any(|segment| self.config.is_skipped_folder(segment))
    }

    fn test_from_main_file(
        &self,
        work_dir: &Path,
        file: &ScmAffectedFile,
        ids: &ChangeSetIds<'_>,
    ) -> Result<Option<AutomatedTest>> {
        let kind = classifier::main_file_kind(&file.new_path);
        let folder = parent_folder(&file.new_path).unwrap_or("");
        let exists = work_dir.join(&file.new_path).is_file();

        let test = match file.change_type {
            ChangeType::Add if exists => {
                self.build_test(work_dir, &folder_dir(work_dir, folder), kind)?
            }
            ChangeType::Delete if !exists => {
                let (package_name, name) = folder_identity(work_dir, folder);
                AutomatedTest::deleted(name, package_name, kind)
            }
            ChangeType::Edit if exists => {
                let mut test = self.build_test(work_dir, &folder_dir(work_dir, folder), kind)?;
                test.status = OctaneStatus::Modified;
                let old_folder = parent_folder(file.previous_path()).unwrap_or("");
                let (old_package, old_name) = folder_identity(work_dir, old_folder);
                test.set_old_identity(&old_package, &old_name);
                test
            }
            _ => {
                debug!(
                    path = %file.new_path,
                    change = ?file.change_type,
                    exists,
                    "change does not match working tree, ignoring"
                );
                return Ok(None);
            }
        };

        Ok(Some(test.with_change_set(ids.src, ids.dst)))
    }

    /// Any change under `<test>/<Action>/resource.mtr` re-reads the owning test.
    fn test_from_parameter_file(
        &self,
        work_dir: &Path,
        file: &ScmAffectedFile,
        ids: &ChangeSetIds<'_>,
    ) -> Result<Option<AutomatedTest>> {
        let Some(test_folder) = parameter_test_folder(&file.new_path) else {
            return Ok(None);
        };
        let test_dir = folder_dir(work_dir, test_folder);
        let kind = classify_dir(&test_dir);
        if kind != TestKind::Gui {
            debug!(path = %test_folder, "parameter file outside a GUI test, ignoring");
            return Ok(None);
        }

        let mut test = self.build_test(work_dir, &test_dir, kind)?;
        test.status = OctaneStatus::Modified;
        if file.change_type == ChangeType::Edit {
            if let Some(old_folder) = parameter_test_folder(file.previous_path()) {
                let (old_package, old_name) = folder_identity(work_dir, old_folder);
                test.set_old_identity(&old_package, &old_name);
            }
        }
        Ok(Some(test.with_change_set(ids.src, ids.dst)))
    }
}

fn resource_from_change(
    work_dir: &Path,
    file: &ScmAffectedFile,
    ids: &ChangeSetIds<'_>,
) -> Option<ScmResourceFile> {
    let absolute = work_dir.join(&file.new_path);
    let exists = absolute.is_file();
    let name = absolute.display().to_string();

    let resource = match file.change_type {
        ChangeType::Add | ChangeType::Delete if inside_test_folder(work_dir, &file.new_path) => {
            debug!(path = %file.new_path, "data table belongs to a test folder");
            return None;
        }
        ChangeType::Add if exists => ScmResourceFile::new(name, &file.new_path, OctaneStatus::New),
        ChangeType::Delete if !exists => {
            ScmResourceFile::new(name, &file.new_path, OctaneStatus::Deleted)
        }
        ChangeType::Edit if exists && file.is_move() => {
            let mut resource = ScmResourceFile::new(name, &file.new_path, OctaneStatus::Modified);
            resource.set_old_relative_path(file.previous_path());
            resource
        }
        _ => return None,
    };
    Some(resource.with_change_set(ids.src, ids.dst))
}

fn parent_folder(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(folder, _)| folder)
}

/// Test folder owning `<test>/<Action>/resource.mtr`; `""` for the root.
fn parameter_test_folder(path: &str) -> Option<&str> {
    parent_folder(path).map(|action| parent_folder(action).unwrap_or(""))
}

/// The file's folder, or any folder above it up to the root, currently
/// classifies as a test in the working tree.
fn inside_test_folder(work_dir: &Path, relative: &str) -> bool {
    let mut folder = parent_folder(relative);
    while let Some(current) = folder {
        if !classify_dir(&work_dir.join(current)).is_none() {
            return true;
        }
        folder = parent_folder(current);
    }
    !classify_dir(work_dir).is_none()
}

/// Test kind of a folder in the working tree; `TestKind::None` when it cannot
/// be listed.
fn classify_dir(dir: &Path) -> TestKind {
    match fs::read_dir(dir) {
        Ok(entries) => classifier::classify(
            entries
                .flatten()
                .map(|e| e.file_name().to_string_lossy().into_owned()),
        ),
        Err(_) => TestKind::None,
    }
}
