//! In-memory bundle store.
//!
//! Reference implementation of `BundleStore`, backed by a list of named
//! byte buffers behind an `RwLock`. Entries keep insertion order;
//! inserting an existing name replaces its contents in place.
//!
//! Use this store for:
//! - Testing the resolver and negotiation engine end to end
//! - Embedding bundles that are generated at runtime

use std::io::{self, Read};
use std::sync::Arc;

use bytes::{Buf, Bytes};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::model::{StreamHandle, StreamSource};
use crate::Result;
use super::{BundleStore, Entry};

/// In-memory bundle.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    files: RwLock<Vec<(String, Bytes)>>,
    modified: RwLock<Option<DateTime<Utc>>>,
}

impl MemoryInner {
    fn get(&self, name: &str) -> Option<Bytes> {
        self.files
            .read()
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.clone())
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry. A leading `/` is dropped from the name.
    pub fn insert(&self, name: impl Into<String>, data: impl Into<Bytes>) {
        let name = name.into().trim_start_matches('/').to_string();
        let data = data.into();
        let mut files = self.inner.files.write();
        match files.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = data,
            None => files.push((name, data)),
        }
    }

    /// Builder form of [`MemoryStore::insert`].
    pub fn with(self, name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        self.insert(name, data);
        self
    }

    pub fn remove(&self, name: &str) -> bool {
        let mut files = self.inner.files.write();
        let before = files.len();
        files.retain(|(n, _)| n != name);
        files.len() != before
    }

    pub fn set_last_modified(&self, time: DateTime<Utc>) {
        *self.inner.modified.write() = Some(time);
    }

    pub fn len(&self) -> usize {
        self.inner.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.files.read().is_empty()
    }
}

/// Lazily opened entry of a `MemoryStore`.
struct MemoryStream {
    inner: Arc<MemoryInner>,
    name: String,
}

impl StreamSource for MemoryStream {
    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        let data = self.inner.get(&self.name).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no entry '{}'", self.name))
        })?;
        Ok(Box::new(data.reader()))
    }
}

impl BundleStore for MemoryStore {
    fn entries(&self) -> Result<Vec<Entry>> {
        Ok(self
            .inner
            .files
            .read()
            .iter()
            .map(|(name, data)| Entry { name: name.clone(), size: data.len() as u64 })
            .collect())
    }

    fn handle(&self, name: &str) -> StreamHandle {
        StreamHandle::new(MemoryStream {
            inner: Arc::clone(&self.inner),
            name: name.trim_start_matches('/').to_string(),
        })
    }

    fn read(&self, name: &str) -> Result<Option<Bytes>> {
        Ok(self.inner.get(name.trim_start_matches('/')))
    }

    fn last_modified(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(*self.inner.modified.read())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_order_and_replaces() {
        let store = MemoryStore::new()
            .with("b.txt", "bee")
            .with("/a.txt", "a")
            .with("b.txt", "buzz");
        let entries = store.entries().unwrap();
        assert_eq!(
            entries,
            vec![
                Entry { name: "b.txt".into(), size: 4 },
                Entry { name: "a.txt".into(), size: 1 },
            ]
        );
    }

    #[test]
    fn test_handle_reads_current_contents() {
        let store = MemoryStore::new().with("a.txt", "one");
        let handle = store.handle("a.txt");
        store.insert("a.txt", "two");
        let mut text = String::new();
        handle.open().unwrap().read_to_string(&mut text).unwrap();
        assert_eq!(text, "two");
    }

    #[test]
    fn test_missing_entry() {
        let store = MemoryStore::new();
        assert!(store.read("nope").unwrap().is_none());
        let err = store.handle("nope").open().err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_candidates_filter_by_base() {
        let store = MemoryStore::new()
            .with("intro.html", "<p>")
            .with("introduction.html", "x")
            .with("intro.txt", "t");
        let names: Vec<_> = store.candidates("/intro").unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["intro.html", "intro.txt"]);
    }

    #[test]
    fn test_remove() {
        let store = MemoryStore::new().with("a", "1");
        assert!(store.remove("a"));
        assert!(!store.remove("a"));
        assert!(store.is_empty());
    }
}
