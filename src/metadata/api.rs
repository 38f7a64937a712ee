use std::fs;
use std::path::Path;
use tracing::debug;

use super::{find_file_ignore_case, parse_document};
use crate::config::API_ACTIONS_FILE;
use crate::error::DocumentError;

const ACTION_ELEMENT: &str = "Action";
const MAIN_ACTION: &str = "MainAction";

/// Description of an API test, taken from the `MainAction` entry of its
/// `actions.xml`:
///
/// ```xml
/// <Actions>
///   <Action internalName="MainAction" userDefinedName="APITest1" description="..." />
/// </Actions>
/// ```
///
/// A test folder without `actions.xml` has an empty description.
pub fn api_test_description(test_dir: &Path) -> Result<String, DocumentError> {
    let Some(path) = find_file_ignore_case(test_dir, API_ACTIONS_FILE) else {
        debug!(path = %test_dir.display(), "no actions.xml in API test");
        return Ok(String::new());
    };

    let xml = fs::read_to_string(&path).map_err(|e| DocumentError::read(&path, e))?;
    let document = parse_document(xml.trim_start_matches('\u{feff}'), &path)?;

    let description = document
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == ACTION_ELEMENT)
        .find(|n| n.attribute("internalName") == Some(MAIN_ACTION))
        .and_then(|n| n.attribute("description"))
        .unwrap_or_default();

    Ok(description.trim().to_string())
}
