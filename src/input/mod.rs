//! Changelog discovery and loading
//!
//! The batch only needs two things from its input: the names of the
//! changelog files and their raw bytes. [`ChangelogSource`] is that seam;
//! [`DirectorySource`] is the on-disk implementation.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::changelog::parse::ParseError;

/// Trait for changelog inputs.
pub trait ChangelogSource {
    /// Names of all changelog files, in no particular order.
    fn list(&self) -> Result<Vec<String>, LoadError>;

    /// Full content of the named file.
    fn read(&self, name: &str) -> Result<Vec<u8>, LoadError>;
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot list input directory {path}: {source}")]
    ListDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: ParseError,
    },
}

/// Reads changelogs from the regular files directly inside one directory.
///
/// No recursion and no extension filter: every file is a changelog.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ChangelogSource for DirectorySource {
    fn list(&self) -> Result<Vec<String>, LoadError> {
        let list_err = |e| LoadError::ListDir {
            path: self.dir.clone(),
            source: e,
        };

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(list_err)? {
            let entry = entry.map_err(list_err)?;
            if entry.path().is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }

    fn read(&self, name: &str) -> Result<Vec<u8>, LoadError> {
        let path = self.dir.join(name);
        std::fs::read(&path).map_err(|e| LoadError::Io { path, source: e })
    }
}
