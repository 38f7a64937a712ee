use roxmltree::Document;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{
    find_file_ignore_case, first_element, parse_action_resource, parse_document, text_content,
};
use crate::config::{ACTION_RESOURCE_FILE, GUI_TEST_EXTENSION, GUI_TEST_FILE};
use crate::container;
use crate::error::DocumentError;
use crate::model::UftoTestAction;

const COMPONENT_ELEMENT: &str = "Component";
const DEPENDENCY_ELEMENT: &str = "Dependency";
const DESCRIPTION_ELEMENT: &str = "Description";
const IMPLICIT_ACTION: &str = "action0";

const ACTION_DEPENDENCY_TYPE: &str = "1";
const ACTION_DEPENDENCY_KIND: &str = "16";
const ACTION_DEPENDENCY_SCOPE: &str = "0";

/// XML extracted from a GUI test's binary definition file.
#[derive(Debug, Clone)]
pub struct GuiTestDocument {
    test_dir: PathBuf,
    path: PathBuf,
    xml: String,
}

impl GuiTestDocument {
    /// Decodes the test definition in `test_dir` and validates its XML.
    pub fn load(test_dir: &Path) -> Result<Self, DocumentError> {
        let path = find_test_definition(test_dir)
            .ok_or_else(|| DocumentError::no_document(test_dir.join(GUI_TEST_FILE)))?;
        debug!(path = %path.display(), "reading GUI test document");

        let xml = container::read_component_xml(&path)?;
        if xml.trim().is_empty() {
            warn!(path = %path.display(), "no XML content in test definition");
            return Err(DocumentError::no_document(&path));
        }
        parse_document(&xml, &path)?;

        Ok(Self {
            test_dir: test_dir.to_path_buf(),
            path,
            xml,
        })
    }

    #[cfg(test)]
    pub(crate) fn from_xml(test_dir: &Path, xml: impl Into<String>) -> Result<Self, DocumentError> {
        let path = test_dir.join(GUI_TEST_FILE);
        let xml = xml.into();
        parse_document(&xml, &path)?;
        Ok(Self {
            test_dir: test_dir.to_path_buf(),
            path,
            xml,
        })
    }

    fn document(&self) -> Result<Document<'_>, DocumentError> {
        parse_document(&self.xml, &self.path)
    }

    /// Trimmed text of the first `Description` element.
    pub fn description(&self) -> Result<String, DocumentError> {
        let document = self.document()?;
        Ok(first_element(document.root(), DESCRIPTION_ELEMENT)
            .map(|n| text_content(n).trim().to_string())
            .unwrap_or_default())
    }

    /// Actions of the test, with logical names, repository paths and parameters.
    pub fn actions(
        &self,
        test_name: &str,
        action_prefix: &str,
    ) -> Result<Vec<UftoTestAction>, DocumentError> {
        let document = self.document()?;
        let mut actions = resolve_actions(&document, test_name, action_prefix);
        read_parameters(&self.test_dir, &mut actions);
        Ok(actions)
    }
}

/// Builds the action list in two passes: index the `Component` elements by
/// name, then resolve logical names through the `Dependency` elements.
pub fn resolve_actions(
    document: &Document<'_>,
    test_name: &str,
    action_prefix: &str,
) -> Vec<UftoTestAction> {
    let mut actions: Vec<UftoTestAction> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for node in document
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == COMPONENT_ELEMENT)
    {
        let name = text_content(node);
        if name.is_empty() || name.eq_ignore_ascii_case(IMPLICIT_ACTION) {
            continue;
        }
        if !index.contains_key(&name) {
            index.insert(name.clone(), actions.len());
            actions.push(UftoTestAction::new(name, test_name));
        }
    }

    for node in document
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == DEPENDENCY_ELEMENT)
    {
        let is_action_dependency = node.attribute("Type") == Some(ACTION_DEPENDENCY_TYPE)
            && node.attribute("Kind") == Some(ACTION_DEPENDENCY_KIND)
            && node.attribute("Scope") == Some(ACTION_DEPENDENCY_SCOPE);
        let logical_name = match node.attribute("Logical") {
            Some(logical) if is_action_dependency && !logical.is_empty() => logical,
            _ => continue,
        };

        let content = text_content(node);
        let Some((action_name, _)) = content.split_once('\\') else {
            continue;
        };
        if let Some(&i) = index.get(action_name) {
            actions[i].logical_name = Some(logical_name.to_string());
        }
    }

    for action in &mut actions {
        action.assign_repository_path(action_prefix);
    }
    actions
}

/// Fills each action's parameters from `<test>/<action>/resource.mtr`.
/// A missing or unreadable resource only affects its own action.
fn read_parameters(test_dir: &Path, actions: &mut [UftoTestAction]) {
    for action in actions.iter_mut() {
        let action_dir = test_dir.join(&action.name);
        if !action_dir.is_dir() {
            warn!(
                action = %action.name,
                path = %action_dir.display(),
                "action folder does not exist"
            );
            continue;
        }
        let Some(resource) = find_file_ignore_case(&action_dir, ACTION_RESOURCE_FILE) else {
            warn!(action = %action.name, "resource.mtr file for action does not exist");
            continue;
        };

        match parse_action_resource(&resource) {
            Ok(parsed) => {
                action.parameters = parsed.parameters;
                action.description = parsed.description;
            }
            Err(e) => {
                warn!(action = %action.name, error = %e, "failed to parse action parameters");
                action.parameters.clear();
            }
        }
    }
}

fn find_test_definition(test_dir: &Path) -> Option<PathBuf> {
    if let Some(path) = find_file_ignore_case(test_dir, GUI_TEST_FILE) {
        return Some(path);
    }
    let mut candidates: Vec<PathBuf> = fs::read_dir(test_dir)
        .ok()?
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(GUI_TEST_EXTENSION))
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}
