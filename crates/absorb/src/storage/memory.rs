//! In-memory implementation of [`FileSystem`]
//!
//! Directories are tracked explicitly, so removing the last file of a folder
//! leaves the folder behind exactly like a real disk. Every write and delete
//! is counted, which lets callers assert that a dry run touched nothing.

use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{FileSystem, ReadSeek};
use crate::paths;

#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: RwLock<BTreeMap<PathBuf, Vec<u8>>>,
    dirs: RwLock<BTreeSet<PathBuf>>,
    mutations: AtomicUsize,
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{} does not exist", path.display()),
    )
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, creating its parent directories. Not counted as a mutation.
    pub fn add_file(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        let path = path.into();
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.files.write().insert(path, contents.into());
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut dirs = self.dirs.write();
        for ancestor in path.as_ref().ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            dirs.insert(ancestor.to_path_buf());
        }
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.files.read().contains_key(path)
    }

    pub fn contents(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.read().get(path).cloned()
    }

    /// Number of writes and deletes performed through the trait
    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }
}

impl FileSystem for MemoryFileSystem {
    fn walk_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.dir_exists(dir) {
            return Err(not_found(dir));
        }
        Ok(self
            .files
            .read()
            .keys()
            .filter(|p| p.starts_with(dir))
            .cloned()
            .collect())
    }

    fn list_files(&self, dir: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
        if !self.dir_exists(dir) {
            return Err(not_found(dir));
        }
        Ok(self
            .files
            .read()
            .keys()
            .filter(|p| p.parent() == Some(dir) && paths::extension(p) == extension)
            .cloned()
            .collect())
    }

    fn file_size(&self, path: &Path) -> io::Result<u64> {
        self.files
            .read()
            .get(path)
            .map(|data| data.len() as u64)
            .ok_or_else(|| not_found(path))
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.contents(path).ok_or_else(|| not_found(path))
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn ReadSeek>> {
        Ok(Box::new(Cursor::new(self.read(path)?)))
    }

    fn write_string(&self, path: &Path, contents: &str) -> io::Result<()> {
        let parent_missing = path.parent().is_some_and(|p| !self.dir_exists(p));
        if parent_missing {
            return Err(not_found(path));
        }
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.files
            .write()
            .insert(path.to_path_buf(), contents.as_bytes().to_vec());
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.files.write().remove(path).ok_or_else(|| not_found(path))?;
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn dir_exists(&self, path: &Path) -> bool {
        self.dirs.read().contains(path)
    }

    fn dir_is_empty(&self, path: &Path) -> io::Result<bool> {
        if !self.dir_exists(path) {
            return Err(not_found(path));
        }
        let has_file = self.files.read().keys().any(|p| p.parent() == Some(path));
        let has_dir = self.dirs.read().iter().any(|p| p.parent() == Some(path));
        Ok(!has_file && !has_dir)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        if !self.dir_is_empty(path)? {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{} is not empty", path.display()),
            ));
        }
        self.dirs.write().remove(path);
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
