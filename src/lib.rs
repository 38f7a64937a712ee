/// UFT One test discovery
///
/// Finds GUI and API tests in a git working tree, reads their metadata out of
/// compound binary containers and XML documents, and reports which tests and
/// data tables are new, modified or deleted since the last synced commit.
pub mod changeset;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod container;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod model;
pub mod sync_marker;

pub use discovery::{record_synced, Discovery, DiscoveryResult};
pub use error::{Error, Result};
