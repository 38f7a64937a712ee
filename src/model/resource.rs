use serde::Serialize;

use super::{is_blank, OctaneStatus};

/// A data table tracked by the remote side as an SCM resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScmResourceFile {
    /// Absolute path in the working tree.
    pub name: String,
    pub relative_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_relative_path: Option<String>,
    pub is_moved: bool,
    pub status: OctaneStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_set_src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_set_dst: Option<String>,
}

impl ScmResourceFile {
    pub fn new(name: impl Into<String>, relative_path: impl Into<String>, status: OctaneStatus) -> Self {
        Self {
            name: name.into(),
            relative_path: relative_path.into(),
            old_relative_path: None,
            is_moved: false,
            status,
            change_set_src: None,
            change_set_dst: None,
        }
    }

    pub fn set_old_relative_path(&mut self, old: &str) {
        self.is_moved = !is_blank(old) && !is_blank(&self.relative_path) && old != self.relative_path;
        self.old_relative_path = Some(old.to_string());
    }

    /// Folder containing the file, relative to the root (`""` at the root).
    pub fn relative_folder(&self) -> &str {
        self.relative_path
            .rsplit_once('/')
            .map(|(folder, _)| folder)
            .unwrap_or("")
    }

    pub fn with_change_set(mut self, src: impl Into<String>, dst: impl Into<String>) -> Self {
        self.change_set_src = Some(src.into());
        self.change_set_dst = Some(dst.into());
        self
    }
}
