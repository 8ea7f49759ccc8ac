//! Normalized changelog output
//!
//! [`ChangelogSink`] receives each canonical document under its input file
//! name. [`DirectorySink`] writes them into one directory, overwriting
//! existing files.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("cannot create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Trait for changelog outputs.
pub trait ChangelogSink {
    /// Store `contents` under `name`, replacing anything already there.
    fn write(&mut self, name: &str, contents: &str) -> Result<(), WriteError>;
}

#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Sink for `dir`, creating the directory if it does not exist.
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self, WriteError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| WriteError::CreateDir {
            path: dir.clone(),
            source: e,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ChangelogSink for DirectorySink {
    fn write(&mut self, name: &str, contents: &str) -> Result<(), WriteError> {
        let path = self.dir.join(name);
        std::fs::write(&path, contents).map_err(|e| WriteError::Io { path, source: e })
    }
}
