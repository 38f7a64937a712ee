//! Metadata extraction from test documents.
//!
//! GUI tests keep their XML inside a compound container; API tests keep it in a
//! plain `actions.xml`. Every document goes through [`parse_document`], which
//! refuses DTDs outright so no entity can be declared or expanded.

mod api;
mod gui;
mod params;

pub use api::api_test_description;
pub use gui::{resolve_actions, GuiTestDocument};
pub use params::{parse_action_resource, ActionResource};

use roxmltree::{Document, Node, ParsingOptions};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DocumentError;
use crate::model::{TestKind, UftoTestAction};

const ENTITY_ELEMENT: &str = "ENTITY";

/// Description and actions extracted for one test folder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestMetadata {
    pub description: String,
    pub actions: Vec<UftoTestAction>,
}

/// Extracts the metadata of the test rooted at `test_dir`.
///
/// `action_prefix` is the package-qualified test path used for action
/// repository paths. Actions are only extracted for GUI tests when
/// `discover_actions` is set.
pub fn extract(
    test_dir: &Path,
    kind: TestKind,
    test_name: &str,
    action_prefix: &str,
    discover_actions: bool,
) -> Result<TestMetadata, DocumentError> {
    match kind {
        TestKind::Gui => {
            let document = GuiTestDocument::load(test_dir)?;
            let description = format_description(&document.description()?);
            let actions = if discover_actions {
                document.actions(test_name, action_prefix)?
            } else {
                Vec::new()
            };
            Ok(TestMetadata {
                description,
                actions,
            })
        }
        TestKind::Api => Ok(TestMetadata {
            description: format_description(&api_test_description(test_dir)?),
            actions: Vec::new(),
        }),
        TestKind::None => Ok(TestMetadata::default()),
    }
}

/// Parses XML with DTD processing disabled and rejects `ENTITY` elements.
pub fn parse_document<'a>(xml: &'a str, path: &Path) -> Result<Document<'a>, DocumentError> {
    let mut options = ParsingOptions::default();
    options.allow_dtd = false;

    let document = Document::parse_with_options(xml, options).map_err(|e| match e {
        roxmltree::Error::DtdDetected => DocumentError::external_entity(path),
        other => DocumentError::malformed(path, other.to_string()),
    })?;

    if document
        .descendants()
        .any(|n| n.is_element() && n.tag_name().name() == ENTITY_ELEMENT)
    {
        return Err(DocumentError::external_entity(path));
    }
    Ok(document)
}

/// Concatenated text of every text node below `node`.
pub fn text_content(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

pub(crate) fn first_element<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
) -> Option<Node<'a, 'input>> {
    node.descendants()
        .find(|n| n.is_element() && n.tag_name().name() == tag)
}

/// Turns a multi-line description into one HTML paragraph per line.
pub fn format_description(description: &str) -> String {
    if !description.contains('\n') {
        return description.to_string();
    }

    let mut html = String::from("<html><body>");
    for line in description.split('\n') {
        html.push_str("<p>");
        html.push_str(line.trim_end_matches('\r'));
        html.push_str("</p>\n");
    }
    html.push_str("</body></html>");
    html
}

/// Looks up `name` in `dir`, ignoring ASCII case.
pub(crate) fn find_file_ignore_case(dir: &Path, name: &str) -> Option<PathBuf> {
    let exact = dir.join(name);
    if exact.is_file() {
        return Some(exact);
    }
    let mut matches: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().eq_ignore_ascii_case(name))
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    matches.sort();
    matches.into_iter().next()
}
