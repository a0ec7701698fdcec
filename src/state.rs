use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::error::Result;

/// Outcome of the most recent completed check. `sold_out` is `None` until
/// the first check has been recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sold_out: Option<bool>,
}

/// Reads and writes the state record as pretty-printed JSON.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    #[must_use]
    pub fn new<P: Into<PathBuf>>(path: P) -> StateStore {
        StateStore { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file yields the unknown record. A file that exists but does
    /// not parse is an error; it is never replaced silently.
    ///
    /// # Errors
    ///
    /// [`crate::Error::StateParse`] for malformed content, [`crate::Error::Io`]
    /// when the file exists but cannot be read.
    pub fn load(&self) -> Result<StateRecord> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(StateRecord::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrites the state file with `record` as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// [`crate::Error::Io`] when the file cannot be written.
    pub fn save(&self, record: &StateRecord) -> Result<()> {
        let content = serde_json::to_string_pretty(record)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}
