use std::collections::HashSet;
use tracing::debug;

use crate::model::{AutomatedTest, OctaneStatus, ScmResourceFile};

/// Collapses entries that share a `(package_name, name)` key.
///
/// The first NEW entry for a key wins over every other NEW or MODIFIED entry
/// for that key. Without a NEW entry, the first MODIFIED one carrying a move
/// is kept, else the first MODIFIED one. Repeated DELETED entries collapse to
/// the first.
pub fn dedup_tests(tests: Vec<AutomatedTest>) -> Vec<AutomatedTest> {
    let new_keys = keys_where(&tests, |t| t.status == OctaneStatus::New);
    let moved_keys = keys_where(&tests, |t| t.status == OctaneStatus::Modified && t.is_moved);

    let mut seen: HashSet<(OctaneStatus, String, String)> = HashSet::new();
    let before = tests.len();
    let kept: Vec<AutomatedTest> = tests
        .into_iter()
        .filter(|t| {
            if t.status == OctaneStatus::Modified {
                let key = owned_key(t);
                if new_keys.contains(&key) || (!t.is_moved && moved_keys.contains(&key)) {
                    return false;
                }
            }
            seen.insert((t.status, t.package_name.clone(), t.name.clone()))
        })
        .collect();

    if kept.len() < before {
        debug!(removed = before - kept.len(), "removed duplicate tests");
    }
    kept
}

/// Drops resource files that live inside the folder of a test with the same
/// status. NEW files are checked against NEW tests. DELETED files are checked
/// against DELETED tests and the former folders of moved tests.
pub fn remove_false_positives(
    tests: &[AutomatedTest],
    files: Vec<ScmResourceFile>,
) -> Vec<ScmResourceFile> {
    let test_paths = |status: OctaneStatus| -> Vec<String> {
        tests
            .iter()
            .filter(|t| t.status == status)
            .map(AutomatedTest::test_path)
            .filter(|p| !p.is_empty())
            .collect()
    };
    let new_paths = test_paths(OctaneStatus::New);
    let mut deleted_paths = test_paths(OctaneStatus::Deleted);
    deleted_paths.extend(
        tests
            .iter()
            .filter_map(AutomatedTest::old_test_path)
            .filter(|p| !p.is_empty()),
    );

    files
        .into_iter()
        .filter(|file| {
            let owners = match file.status {
                OctaneStatus::New => &new_paths,
                OctaneStatus::Deleted => &deleted_paths,
                _ => return true,
            };
            let owned = owners
                .iter()
                .any(|test_path| is_within(file.relative_folder(), test_path));
            if owned {
                debug!(path = %file.relative_path, "resource file belongs to a test folder");
            }
            !owned
        })
        .collect()
}

pub fn sort_tests(tests: &mut [AutomatedTest]) {
    tests.sort_by(|a, b| a.identity_key().cmp(&b.identity_key()));
}

pub fn sort_resource_files(files: &mut [ScmResourceFile]) {
    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
}

/// `folder` equals `ancestor` or lies below it, compared by path component.
fn is_within(folder: &str, ancestor: &str) -> bool {
    folder == ancestor
        || folder
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn keys_where(
    tests: &[AutomatedTest],
    keep: impl Fn(&AutomatedTest) -> bool,
) -> HashSet<(String, String)> {
    tests.iter().filter(|t| keep(t)).map(owned_key).collect()
}

fn owned_key(test: &AutomatedTest) -> (String, String) {
    (test.package_name.clone(), test.name.clone())
}
