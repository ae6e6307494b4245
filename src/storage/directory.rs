//! Directory-backed bundle store.
//!
//! Serves the regular files below a root directory. Entry names are
//! root-relative, `/`-separated, and listed in sorted order so that
//! candidate order is stable across platforms.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::model::{StreamHandle, StreamSource};
use crate::{Error, Result};
use super::{BundleStore, Entry};

/// Bundle rooted at a directory.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Open a store. Fails when `root` is not a directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::NotFound(format!("Bundle directory {}", root.display())));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path of an entry name. `None` for names that would leave
    /// the root.
    fn path_of(&self, name: &str) -> Option<PathBuf> {
        let relative = Path::new(name.trim_start_matches('/'));
        let plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        plain.then(|| self.root.join(relative))
    }

    fn walk(&self, dir: &Path, prefix: &str, out: &mut Vec<Entry>) -> Result<()> {
        let mut children: Vec<_> = fs::read_dir(dir)?.collect::<std::io::Result<_>>()?;
        children.sort_by_key(|e| e.file_name());
        for child in children {
            let Some(file_name) = child.file_name().to_str().map(String::from) else {
                continue;
            };
            let name = format!("{prefix}{file_name}");
            let file_type = child.file_type()?;
            if file_type.is_dir() {
                self.walk(&child.path(), &format!("{name}/"), out)?;
            } else if file_type.is_file() {
                out.push(Entry { name, size: child.metadata()?.len() });
            }
        }
        Ok(())
    }
}

/// Lazily opened file.
struct FileStream {
    path: Option<PathBuf>,
    name: String,
}

impl StreamSource for FileStream {
    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        let path = self.path.as_ref().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("bad entry name '{}'", self.name))
        })?;
        Ok(Box::new(File::open(path)?))
    }
}

impl BundleStore for DirectoryStore {
    fn entries(&self) -> Result<Vec<Entry>> {
        let mut out = Vec::new();
        self.walk(&self.root, "", &mut out)?;
        Ok(out)
    }

    fn handle(&self, name: &str) -> StreamHandle {
        StreamHandle::new(FileStream { path: self.path_of(name), name: name.to_string() })
    }

    fn read(&self, name: &str) -> Result<Option<Bytes>> {
        let Some(path) = self.path_of(name) else {
            return Ok(None);
        };
        match fs::read(path) {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn last_modified(&self) -> Result<Option<DateTime<Utc>>> {
        let modified = fs::metadata(&self.root)?.modified()?;
        Ok(Some(DateTime::<Utc>::from(modified)))
    }
}
