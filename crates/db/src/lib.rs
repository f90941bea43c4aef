use std::path::PathBuf;

use thiserror::Error;
use utils::assets::data_dir;

pub mod events;
pub mod models;
mod store;
pub mod types;

pub use store::Record;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Handle on the durable key space: one JSON document per collection name
/// under a single root directory, rewritten in full on every mutation.
#[derive(Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new() -> Result<Storage, StoreError> {
        Storage::open(data_dir())
    }

    /// Opens a storage root at an explicit path, creating it if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Storage, StoreError> {
        let root = root.into();
        if !root.exists() {
            std::fs::create_dir_all(&root)?;
        }
        Ok(Storage { root })
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    pub(crate) fn collection_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }
}
