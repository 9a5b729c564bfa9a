//! Class-byte providers.
//!
//! The analyzer never loads classes; it only asks a [`ClassSource`] for the
//! raw bytes of a type by internal name and decodes them itself.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

/// Supplies raw class bytes by internal (slash-separated) type name.
///
/// `Ok(None)` means "not on this classpath"; `Err` is reserved for I/O
/// failures while reading something that does exist.
pub trait ClassSource: Send + Sync {
    fn class_bytes(&self, internal_name: &str) -> Result<Option<Vec<u8>>>;
}

impl<T: ClassSource + ?Sized> ClassSource for Arc<T> {
    fn class_bytes(&self, internal_name: &str) -> Result<Option<Vec<u8>>> {
        (**self).class_bytes(internal_name)
    }
}

impl<T: ClassSource + ?Sized> ClassSource for &T {
    fn class_bytes(&self, internal_name: &str) -> Result<Option<Vec<u8>>> {
        (**self).class_bytes(internal_name)
    }
}

// =============================================================================
// In-memory source
// =============================================================================

/// Class bytes held in memory, keyed by internal name.
#[derive(Debug, Clone, Default)]
pub struct MapClassSource {
    classes: HashMap<String, Vec<u8>>,
}

impl MapClassSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, internal_name: impl Into<String>, bytes: Vec<u8>) {
        self.classes.insert(internal_name.into(), bytes);
    }

    pub fn with_class(mut self, internal_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.insert(internal_name, bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl ClassSource for MapClassSource {
    fn class_bytes(&self, internal_name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.classes.get(internal_name).cloned())
    }
}

// =============================================================================
// Directory source
// =============================================================================

/// Class files laid out under one or more output directories, searched in
/// order (the module's own classes first, then its dependencies).
#[derive(Debug, Clone, Default)]
pub struct DirectoryClassSource {
    roots: Vec<PathBuf>,
}

impl DirectoryClassSource {
    pub fn new(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            roots: roots.into_iter().collect(),
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn class_path(root: &Path, internal_name: &str) -> PathBuf {
        let mut path = root.to_path_buf();
        for segment in internal_name.split('/') {
            path.push(segment);
        }
        path.set_extension("class");
        path
    }
}

impl ClassSource for DirectoryClassSource {
    fn class_bytes(&self, internal_name: &str) -> Result<Option<Vec<u8>>> {
        for root in &self.roots {
            let path = Self::class_path(root, internal_name);
            if path.is_file() {
                let bytes = std::fs::read(&path)
                    .with_context(|| format!("Failed to read class file {}", path.display()))?;
                debug!(class = internal_name, path = %path.display(), "loaded class bytes");
                return Ok(Some(bytes));
            }
        }
        Ok(None)
    }
}
