//! Entities produced by a discovery run.
//!
//! Every entity carries an [`OctaneStatus`] describing how it changed relative
//! to the last synced commit. Entities are built fresh per run and are never
//! shared across runs.

mod resource;

pub use resource::ScmResourceFile;
pub use test::{AutomatedTest, UftoTestAction, UftoTestParam};

use serde::{Deserialize, Serialize};

/// Lifecycle of a discovered entity relative to the previous sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum OctaneStatus {
    New,
    Modified,
    Deleted,
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TestKind {
    Gui,
    Api,
    None,
}

impl TestKind {
    pub fn is_none(&self) -> bool {
        matches!(self, TestKind::None)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TestKind::Gui => "GUI",
            TestKind::Api => "API",
            TestKind::None => "NONE",
        }
    }
}

/// Authoring tool variant. `Mbt` enables action and parameter discovery.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ToolType {
    #[default]
    Uft,
    Mbt,
}

impl ToolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::Uft => "uft",
            ToolType::Mbt => "mbt",
        }
    }

    pub fn discovers_actions(&self) -> bool {
        matches!(self, ToolType::Mbt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParamDirection {
    In,
    Out,
}

impl ParamDirection {
    /// Maps the integer `ArgDirection` code used in action resource documents.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(ParamDirection::In),
            1 => Some(ParamDirection::Out),
            _ => None,
        }
    }
}

pub(crate) fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
