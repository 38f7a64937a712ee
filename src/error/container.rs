use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("failed to open container '{path}': {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("not a compound container: bad header signature")]
    InvalidSignature,

    #[error("container header too short: {len} bytes")]
    HeaderTooShort { len: usize },

    #[error("unsupported container layout: {message}")]
    UnsupportedLayout { message: String },

    #[error("sector {sector} is out of range ({sector_count} sectors available)")]
    SectorOutOfRange { sector: u32, sector_count: u32 },

    #[error("allocation chain starting at sector {start} loops back on itself")]
    ChainCycle { start: u32 },

    #[error("stream '{name}' is truncated: declared {declared} bytes, sector chain holds {available}")]
    TruncatedStream {
        name: String,
        declared: u64,
        available: u64,
    },

    #[error("container has no root storage entry")]
    MissingRootStorage,

    #[error("stream '{name}' not found in root storage")]
    StreamNotFound { name: String },

    #[error("malformed directory entry {index}: {message}")]
    InvalidDirectoryEntry { index: u32, message: String },
}

impl ContainerError {
    pub fn open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    pub fn unsupported_layout(message: impl Into<String>) -> Self {
        Self::UnsupportedLayout {
            message: message.into(),
        }
    }

    pub fn stream_not_found(name: impl Into<String>) -> Self {
        Self::StreamNotFound { name: name.into() }
    }

    pub fn truncated_stream(name: impl Into<String>, declared: u64, available: u64) -> Self {
        Self::TruncatedStream {
            name: name.into(),
            declared,
            available,
        }
    }

    pub fn invalid_directory_entry(index: u32, message: impl Into<String>) -> Self {
        Self::InvalidDirectoryEntry {
            index,
            message: message.into(),
        }
    }
}
