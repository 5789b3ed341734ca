//! Install directory fixture
//!
//! A temporary directory with helpers for laying out server artifacts,
//! back-dating their modification times and inspecting the result.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// Temporary install directory removed on drop.
pub struct InstallDir {
    temp: TempDir,
}

/// Name, contents and modification time of every file in a directory.
pub type DirSnapshot = Vec<(String, Vec<u8>, SystemTime)>;

impl InstallDir {
    /// Create an empty install directory.
    pub fn new() -> Result<Self> {
        let temp = TempDir::new().context("Failed to create temp dir")?;
        Ok(Self {
            temp,
        })
    }

    /// Directory path.
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Write `contents` to `name` and return the full path.
    pub fn create(&self, name: &str, contents: impl AsRef<[u8]>) -> Result<PathBuf> {
        let path = self.path().join(name);
        fs::write(&path, contents).with_context(|| format!("Failed to write {name}"))?;
        Ok(path)
    }

    /// Set the modification time of `path` to `age` before now.
    pub fn set_age(&self, path: &Path, age: Duration) -> Result<()> {
        let file = fs::File::options()
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        file.set_modified(SystemTime::now() - age)
            .with_context(|| format!("Failed to set mtime of {}", path.display()))
    }

    /// Contents of `name`.
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        fs::read(self.path().join(name)).with_context(|| format!("Failed to read {name}"))
    }

    /// Sorted file names in the directory.
    pub fn names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.path()).context("Failed to list install dir")? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    /// Everything observable about the directory, for no-mutation assertions.
    pub fn snapshot(&self) -> Result<DirSnapshot> {
        self.names()?
            .into_iter()
            .map(|name| -> Result<(String, Vec<u8>, SystemTime)> {
                let path = self.path().join(&name);
                let contents = fs::read(&path)?;
                let modified = fs::metadata(&path)?.modified()?;
                Ok((name, contents, modified))
            })
            .collect()
    }
}
