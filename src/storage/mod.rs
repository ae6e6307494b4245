//! # Bundle Storage
//!
//! The contract between the negotiator and whatever holds a bundle's
//! files: list entries, hand out lazily opened streams, read the catalog.
//!
//! ## Implementations
//!
//! | Store | Module | Description |
//! |-------|--------|-------------|
//! | `MemoryStore` | `memory` | In-memory for testing/embedding |
//! | `DirectoryStore` | `directory` | Plain files under a directory root |

pub mod memory;
pub mod directory;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Candidate, StreamHandle};
use crate::resolver::matches_base;
use crate::Result;

pub use memory::MemoryStore;
pub use directory::DirectoryStore;

/// One file in a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// `/`-separated path relative to the bundle root.
    pub name: String,
    pub size: u64,
}

/// A bundle of files that variants are drawn from.
pub trait BundleStore: Send + Sync {
    /// All entries, in the store's natural order. Candidate order, and so
    /// tie-breaking, follows this order.
    fn entries(&self) -> Result<Vec<Entry>>;

    /// A handle that opens `name` on demand. Missing entries fail at open
    /// time, not here.
    fn handle(&self, name: &str) -> StreamHandle;

    /// Whole contents of `name`, or `None` when it does not exist.
    fn read(&self, name: &str) -> Result<Option<Bytes>>;

    /// Modification time of the bundle as a whole.
    fn last_modified(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(None)
    }

    /// Entries answering a request for `base`, as candidates with stream
    /// handles attached.
    fn candidates(&self, base: &str) -> Result<Vec<Candidate>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|e| matches_base(&e.name, base))
            .map(|e| {
                let handle = self.handle(&e.name);
                Candidate::new(e.name, e.size).with_stream(handle)
            })
            .collect())
    }
}
