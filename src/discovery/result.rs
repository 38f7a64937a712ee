use serde::Serialize;

use crate::model::{AutomatedTest, OctaneStatus, ScmResourceFile};

/// Outcome of one discovery run. Built once and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryResult {
    new_commit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous_commit: Option<String>,
    is_full_sync: bool,
    has_changes: bool,
    tests: Vec<AutomatedTest>,
    scm_resource_files: Vec<ScmResourceFile>,
}

impl DiscoveryResult {
    pub fn new(
        new_commit: impl Into<String>,
        previous_commit: Option<String>,
        tests: Vec<AutomatedTest>,
        scm_resource_files: Vec<ScmResourceFile>,
        is_full_sync: bool,
    ) -> Self {
        let has_changes = !tests.is_empty() || !scm_resource_files.is_empty();
        Self {
            new_commit: new_commit.into(),
            previous_commit,
            is_full_sync,
            has_changes,
            tests,
            scm_resource_files,
        }
    }

    pub fn new_commit(&self) -> &str {
        &self.new_commit
    }

    pub fn previous_commit(&self) -> Option<&str> {
        self.previous_commit.as_deref()
    }

    pub fn is_full_sync(&self) -> bool {
        self.is_full_sync
    }

    pub fn has_changes(&self) -> bool {
        self.has_changes
    }

    pub fn all_tests(&self) -> &[AutomatedTest] {
        &self.tests
    }

    pub fn new_tests(&self) -> Vec<&AutomatedTest> {
        self.tests_with(OctaneStatus::New)
    }

    pub fn modified_tests(&self) -> Vec<&AutomatedTest> {
        self.tests_with(OctaneStatus::Modified)
    }

    pub fn deleted_tests(&self) -> Vec<&AutomatedTest> {
        self.tests_with(OctaneStatus::Deleted)
    }

    pub fn all_scm_resource_files(&self) -> &[ScmResourceFile] {
        &self.scm_resource_files
    }

    pub fn new_scm_resource_files(&self) -> Vec<&ScmResourceFile> {
        self.files_with(OctaneStatus::New)
    }

    pub fn modified_scm_resource_files(&self) -> Vec<&ScmResourceFile> {
        self.files_with(OctaneStatus::Modified)
    }

    pub fn deleted_scm_resource_files(&self) -> Vec<&ScmResourceFile> {
        self.files_with(OctaneStatus::Deleted)
    }

    fn tests_with(&self, status: OctaneStatus) -> Vec<&AutomatedTest> {
        self.tests.iter().filter(|t| t.status == status).collect()
    }

    fn files_with(&self, status: OctaneStatus) -> Vec<&ScmResourceFile> {
        self.scm_resource_files
            .iter()
            .filter(|f| f.status == status)
            .collect()
    }
}
