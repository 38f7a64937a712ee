use std::fs;
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::postprocess::{sort_resource_files, sort_tests};
use super::{relative_path, Discovery, DiscoveryResult};
use crate::classifier;
use crate::error::{IoError, Result};
use crate::model::{OctaneStatus, ScmResourceFile, TestKind, ToolType};

impl Discovery {
    /// Scans the whole working tree and reports every test and data table as NEW.
    ///
    /// A folder that classifies as a test is not descended into. The first
    /// test document that fails to parse aborts the scan.
    pub fn full_scan(&self, work_dir: &Path, head: &str) -> Result<DiscoveryResult> {
        info!(path = %work_dir.display(), "starting full scan");

        let mut tests = Vec::new();
        let mut files = Vec::new();

        let mut walker = WalkDir::new(work_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                !(e.file_type().is_dir()
                    && e.depth() > 0
                    && self
                        .config
                        .is_skipped_folder(&e.file_name().to_string_lossy()))
            });

        while let Some(entry) = walker.next() {
            let entry = entry.map_err(|e| IoError::walk_error(work_dir, e))?;
            let path = entry.path();

            if entry.file_type().is_file() {
                if classifier::is_data_table_file(&entry.file_name().to_string_lossy()) {
                    let relative = relative_path(work_dir, path);
                    debug!(path = %relative, "found data table");
                    files.push(ScmResourceFile::new(
                        path.display().to_string(),
                        relative,
                        OctaneStatus::New,
                    ));
                }
                continue;
            }
            if !entry.file_type().is_dir() {
                continue;
            }

            let kind = classifier::classify(list_file_names(path)?);
            if kind.is_none() {
                continue;
            }
            walker.skip_current_dir();

            if self.config.tool_type == ToolType::Mbt && kind == TestKind::Api {
                debug!(path = %path.display(), "skipping API test for MBT");
                continue;
            }
            tests.push(self.build_test(work_dir, path, kind)?);
        }

        sort_tests(&mut tests);
        sort_resource_files(&mut files);
        info!(
            tests = tests.len(),
            resource_files = files.len(),
            "full scan finished"
        );
        Ok(DiscoveryResult::new(head, None, tests, files, true))
    }
}

fn list_file_names(dir: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(dir).map_err(|e| IoError::read_error(dir, e))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| IoError::read_error(dir, e))?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    Ok(names)
}
