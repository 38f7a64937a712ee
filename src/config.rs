use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ConfigError;
use crate::model::ToolType;

pub const GUI_TEST_EXTENSION: &str = "tsp";
pub const API_TEST_EXTENSION: &str = "st";
pub const GUI_TEST_FILE: &str = "Test.tsp";
pub const API_ACTIONS_FILE: &str = "actions.xml";
pub const ACTION_RESOURCE_FILE: &str = "resource.mtr";
pub const DATA_TABLE_EXTENSIONS: &[&str] = &["xlsx", "xls"];

pub const COMPONENT_INFO_STREAM: &str = "ComponentInfo";

pub const DEFAULT_SKIP_FOLDERS: &[&str] = &[".git", ".github"];
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.5;
pub const DEFAULT_MARKER_FILE: &str = ".synced-commit-sha.txt";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "snake_case", deny_unknown_fields)]
pub struct DiscoveryConfig {
    pub tool_type: ToolType,
    pub skip_folders: Vec<String>,
    pub similarity_threshold: f64,
    pub marker_file: PathBuf,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            tool_type: ToolType::default(),
            skip_folders: DEFAULT_SKIP_FOLDERS.iter().map(|s| s.to_string()).collect(),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            marker_file: PathBuf::from(DEFAULT_MARKER_FILE),
        }
    }
}

impl DiscoveryConfig {
    pub fn with_tool_type(mut self, tool_type: ToolType) -> Self {
        self.tool_type = tool_type;
        self
    }

    /// Loads a `.json`, `.yaml` or `.yml` config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading discovery config");

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::read_error(path, e.to_string()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config: Self = match extension {
            "json" => serde_json::from_str(&content)
                .map_err(|e| ConfigError::parse_error(path, e.to_string()))?,
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .map_err(|e| ConfigError::parse_error(path, e.to_string()))?,
            _ => return Err(ConfigError::unsupported_format(extension)),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(ConfigError::invalid_value(
                "similarity_threshold",
                format!("{} is not within [0, 1]", self.similarity_threshold),
            ));
        }
        Ok(())
    }

    pub fn is_skipped_folder(&self, name: &str) -> bool {
        self.skip_folders.iter().any(|f| f == name)
    }
}
