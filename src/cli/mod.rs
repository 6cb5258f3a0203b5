//! CLI command implementations.

pub mod analyze;
pub mod chat;
pub mod clean;
pub mod export;
pub mod list;
pub mod serve;
pub mod show;

use crate::config::Config;
use crate::error::Result;
use crate::storage::FileBackend;

/// Open the file store under the configured home directory.
fn open_store(config: &Config) -> Result<FileBackend> {
    FileBackend::new(config.storage.path.clone())
}
