use std::path::PathBuf;
use thiserror::Error;

use super::ContainerError;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("malformed XML in '{path}': {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("external entities detected in '{path}'")]
    ExternalEntity { path: PathBuf },

    #[error("no document parsed from '{path}'")]
    NoDocument { path: PathBuf },

    #[error("failed to read document '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Container(#[from] ContainerError),
}

impl DocumentError {
    pub fn malformed(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn external_entity(path: impl Into<PathBuf>) -> Self {
        Self::ExternalEntity { path: path.into() }
    }

    pub fn no_document(path: impl Into<PathBuf>) -> Self {
        Self::NoDocument { path: path.into() }
    }

    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }
}
