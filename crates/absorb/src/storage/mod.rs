//! Storage boundary
//!
//! The pipeline reaches files and package archives only through the traits in
//! this module, so the same stages run against the local disk or against the
//! in-memory fake used in tests.

pub mod archive;
pub mod local;
pub mod memory;

pub use archive::{ArchiveFormat, EntryContainer, EntryHeader, ZipFormat};
pub use local::LocalFileSystem;
pub use memory::MemoryFileSystem;

use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};

/// Random-access reader handed to archive formats
pub trait ReadSeek: Read + Seek + Send {}

impl<T: Read + Seek + Send> ReadSeek for T {}

/// File system operations used by the pipeline
pub trait FileSystem: Send + Sync {
    /// Every file below `dir`, recursively. A missing `dir` yields `NotFound`.
    fn walk_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Files directly inside `dir` whose extension equals `extension`
    /// (case-insensitive, without the dot).
    fn list_files(&self, dir: &Path, extension: &str) -> io::Result<Vec<PathBuf>>;

    fn file_size(&self, path: &Path) -> io::Result<u64>;

    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn ReadSeek>>;

    fn write_string(&self, path: &Path, contents: &str) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    fn dir_exists(&self, path: &Path) -> bool;

    /// Whether `path` holds no files and no subdirectories
    fn dir_is_empty(&self, path: &Path) -> io::Result<bool>;

    /// Remove an empty directory
    fn remove_dir(&self, path: &Path) -> io::Result<()>;
}
