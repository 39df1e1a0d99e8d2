//! File-backed query store.

use mirrorhop_core::{Error, QueryStore, Result};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "MIRRORHOP_DATA_DIR";

const QUERY_FILE: &str = "last_query";

/// Keeps the most recent query string in `<data_dir>/last_query`.
#[derive(Debug, Clone)]
pub struct FileQueryStore {
    root: PathBuf,
}

impl FileQueryStore {
    /// Store rooted at the default data directory.
    ///
    /// `MIRRORHOP_DATA_DIR` wins over the platform location.
    pub fn new() -> Result<Self> {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            let trimmed = dir.trim();
            if !trimmed.is_empty() {
                return Ok(Self::with_root(PathBuf::from(trimmed)));
            }
        }

        let dirs = directories::ProjectDirs::from("dev", "mirrorhop", "mirrorhop")
            .ok_or_else(|| Error::Other("Failed to determine data directory".into()))?;
        Ok(Self::with_root(dirs.data_dir().to_path_buf()))
    }

    /// Store rooted at `root`.
    #[must_use]
    pub const fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// Path of the query file.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.root.join(QUERY_FILE)
    }
}

impl QueryStore for FileQueryStore {
    fn save(&self, query: &str) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        let path = self.path();
        fs::write(&path, query)?;
        debug!(path = %path.display(), "Saved query string");
        Ok(())
    }
}
