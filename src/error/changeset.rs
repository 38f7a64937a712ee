use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChangeSetError {
    #[error("failed to run git {command}: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("git {command} failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("unexpected tree listing line: {line}")]
    MalformedTreeEntry { line: String },

    #[error("unknown revision: {rev}")]
    UnknownRevision { rev: String },

    #[error("blob {id} ({path}) could not be read: {message}")]
    BlobUnreadable {
        id: String,
        path: String,
        message: String,
    },
}

impl ChangeSetError {
    pub fn spawn(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            command: command.into(),
            source,
        }
    }

    pub fn command_failed(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            message: message.into(),
        }
    }

    pub fn malformed_tree_entry(line: impl Into<String>) -> Self {
        Self::MalformedTreeEntry { line: line.into() }
    }

    pub fn unknown_revision(rev: impl Into<String>) -> Self {
        Self::UnknownRevision { rev: rev.into() }
    }

    pub fn blob_unreadable(
        id: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::BlobUnreadable {
            id: id.into(),
            path: path.into(),
            message: message.into(),
        }
    }
}
