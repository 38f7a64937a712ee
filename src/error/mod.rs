mod changeset;
mod config;
mod container;
mod document;
mod io;

pub use changeset::ChangeSetError;
pub use config::ConfigError;
pub use container::ContainerError;
pub use document::DocumentError;
pub use io::IoError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    ChangeSet(#[from] ChangeSetError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
