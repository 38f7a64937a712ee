use std::path::Path;
use tracing::warn;

use super::{first_element, parse_document, text_content};
use crate::container;
use crate::error::DocumentError;
use crate::model::{OctaneStatus, ParamDirection, UftoTestParam};

const ARGUMENTS_COLLECTION_ELEMENT: &str = "ArgumentsCollection";
const ARG_NAME_ELEMENT: &str = "ArgName";
const ARG_DIRECTION_ELEMENT: &str = "ArgDirection";
const ARG_DEFAULT_VALUE_ELEMENT: &str = "ArgDefaultValue";
const DESCRIPTION_ELEMENT: &str = "Description";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionResource {
    pub description: String,
    pub parameters: Vec<UftoTestParam>,
}

/// Decodes an action's `resource.mtr` container and reads its parameters.
pub fn parse_action_resource(path: &Path) -> Result<ActionResource, DocumentError> {
    let xml = container::read_component_xml(path)?;
    parse_action_resource_xml(&xml, path)
}

pub fn parse_action_resource_xml(xml: &str, path: &Path) -> Result<ActionResource, DocumentError> {
    let document = parse_document(xml, path)?;
    let root = document.root();

    let parameters = first_element(root, ARGUMENTS_COLLECTION_ELEMENT)
        .map(|collection| {
            collection
                .children()
                .filter(|n| n.is_element())
                .map(|arg| {
                    let name = first_element(arg, ARG_NAME_ELEMENT)
                        .map(text_content)
                        .unwrap_or_default();
                    let direction = first_element(arg, ARG_DIRECTION_ELEMENT)
                        .map(text_content)
                        .map(|code| parse_direction(&name, &code))
                        .unwrap_or(ParamDirection::In);
                    UftoTestParam {
                        name,
                        direction,
                        default_value: first_element(arg, ARG_DEFAULT_VALUE_ELEMENT)
                            .map(text_content),
                        status: OctaneStatus::New,
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let description = first_element(root, DESCRIPTION_ELEMENT)
        .map(text_content)
        .unwrap_or_default();

    Ok(ActionResource {
        description,
        parameters,
    })
}

fn parse_direction(param: &str, code: &str) -> ParamDirection {
    let parsed = code.trim().parse::<i64>().ok().and_then(ParamDirection::from_code);
    parsed.unwrap_or_else(|| {
        warn!(param, code, "unknown parameter direction, assuming IN");
        ParamDirection::In
    })
}
