//! Directory and path classification.
//!
//! [`classify`] looks at one directory listing only. Callers decide whether to
//! recurse: a directory that classifies as GUI or API roots a test and is not
//! descended into.

use std::path::Path;

use crate::config::{
    ACTION_RESOURCE_FILE, API_ACTIONS_FILE, API_TEST_EXTENSION, DATA_TABLE_EXTENSIONS,
    GUI_TEST_EXTENSION,
};
use crate::model::TestKind;

/// Returns the test kind rooted by a directory holding `file_names`.
///
/// A binary test definition wins over an API action marker regardless of the
/// listing order.
pub fn classify<I, S>(file_names: I) -> TestKind
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut kind = TestKind::None;
    for name in file_names {
        match extension_lower(name.as_ref()).as_deref() {
            Some(GUI_TEST_EXTENSION) => return TestKind::Gui,
            Some(API_TEST_EXTENSION) => kind = TestKind::Api,
            _ => {}
        }
    }
    kind
}

pub fn is_data_table_file(path: &str) -> bool {
    extension_lower(path)
        .map(|ext| DATA_TABLE_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// A file whose presence defines a test: binary test definition, API action
/// marker or `actions.xml`.
pub fn is_test_main_file(path: &str) -> bool {
    !main_file_kind(path).is_none()
}

pub fn main_file_kind(path: &str) -> TestKind {
    if file_name(path).eq_ignore_ascii_case(API_ACTIONS_FILE) {
        return TestKind::Api;
    }
    match extension_lower(path).as_deref() {
        Some(GUI_TEST_EXTENSION) => TestKind::Gui,
        Some(API_TEST_EXTENSION) => TestKind::Api,
        _ => TestKind::None,
    }
}

/// `<test>/<Action>/resource.mtr`, where the test folder may be the root.
pub fn is_action_parameter_file(path: &str) -> bool {
    file_name(path).eq_ignore_ascii_case(ACTION_RESOURCE_FILE) && path.split('/').count() >= 2
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn extension_lower(path: &str) -> Option<String> {
    Path::new(file_name(path))
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
