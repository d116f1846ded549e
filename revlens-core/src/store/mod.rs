//! Durable product collection with replace-by-id upsert semantics.
//!
//! The store owns an in-memory `Vec<Product>` mirrored to one JSON document
//! on disk. Every mutation rewrites the whole document through a temp file
//! in the target directory followed by an atomic rename, so readers and
//! crash recovery only ever observe a complete previous or complete new
//! state — never a truncated one.
//!
//! # Write-failure contract
//!
//! The in-memory edit happens before the disk write, under the same lock.
//! If the write fails the operation reports a store error but the memory
//! state keeps the mutation; callers must treat the operation as failed and
//! not assume durability.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::types::Product;

/// JSON-file-backed collection of product sentiment summaries, unique by
/// product id, insertion-ordered.
#[derive(Debug)]
pub struct ProductStore {
    products: Mutex<Vec<Product>>,
    path: PathBuf,
}

impl ProductStore {
    /// Open (or create) a store persisting to `path`.
    ///
    /// A missing file starts the collection empty. So does an unreadable or
    /// corrupt one: a damaged durable file must not brick the service, so
    /// load failures are logged and swallowed, never propagated.
    pub fn open(path: &Path) -> crate::error::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(StoreError::Io)?;
            }
        }

        let products = match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<Vec<Product>>(&raw) {
                Ok(products) => products,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Corrupt product store, starting empty");
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable product store, starting empty");
                Vec::new()
            }
        };

        debug!(path = %path.display(), products = products.len(), "Opened product store");

        Ok(Self {
            products: Mutex::new(products),
            path: path.to_path_buf(),
        })
    }

    /// Insert or replace the entry with `product.id`, then persist the full
    /// collection. Replacement never duplicates: any prior entry with the
    /// same id is dropped before the append.
    pub fn upsert(&self, product: Product) -> crate::error::Result<()> {
        let mut products = self.lock();
        products.retain(|p| p.id != product.id);
        products.push(product);
        self.persist(&products)?;
        Ok(())
    }

    /// Remove the entry with `id`, if any, and persist. Persisting happens
    /// even when nothing matched, keeping the durable state convergent with
    /// memory. Returns whether an entry was removed.
    pub fn remove_by_id(&self, id: &str) -> crate::error::Result<bool> {
        let mut products = self.lock();
        let before = products.len();
        products.retain(|p| p.id != id);
        let removed = products.len() != before;
        self.persist(&products)?;
        Ok(removed)
    }

    /// Snapshot of the whole collection, in insertion order.
    pub fn list_all(&self) -> Vec<Product> {
        self.lock().clone()
    }

    /// Snapshot lookup by id.
    pub fn get_by_id(&self, id: &str) -> Option<Product> {
        self.lock().iter().find(|p| p.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Product>> {
        self.products.lock().expect("product store mutex poisoned")
    }

    /// Serialize the full collection to a temp file in the target directory,
    /// then atomically rename it onto the target path.
    fn persist(&self, products: &[Product]) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let tmp = NamedTempFile::new_in(dir).map_err(StoreError::Io)?;
        serde_json::to_writer_pretty(tmp.as_file(), products).map_err(StoreError::Serialization)?;
        tmp.persist(&self.path)
            .map_err(|e| StoreError::Persist(format!("{}: {}", self.path.display(), e.error)))?;
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────
