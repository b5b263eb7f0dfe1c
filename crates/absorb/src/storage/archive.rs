//! Package archive access
//!
//! Packages are standard zip containers. [`ArchiveFormat`] turns a
//! random-access reader into an [`EntryContainer`] that lists entries and
//! reads them one at a time.

use std::io::{self, Read};
use zip::ZipArchive;

use super::ReadSeek;

/// Name and kind of one archive entry, read without decompressing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHeader {
    pub name: String,
    pub is_dir: bool,
}

/// Random-access view over the entries of one open archive
pub trait EntryContainer: Send {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn header(&mut self, index: usize) -> io::Result<EntryHeader>;

    /// Read the full decompressed contents of an entry
    fn read_entry(&mut self, index: usize) -> io::Result<Vec<u8>>;
}

/// Opens archives of one container format
pub trait ArchiveFormat: Send + Sync {
    fn open(&self, reader: Box<dyn ReadSeek>) -> io::Result<Box<dyn EntryContainer>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ZipFormat;

impl ArchiveFormat for ZipFormat {
    fn open(&self, reader: Box<dyn ReadSeek>) -> io::Result<Box<dyn EntryContainer>> {
        let archive = ZipArchive::new(reader).map_err(zip_error)?;
        Ok(Box::new(ZipContainer { archive }))
    }
}

struct ZipContainer {
    archive: ZipArchive<Box<dyn ReadSeek>>,
}

fn zip_error(error: zip::result::ZipError) -> io::Error {
    match error {
        zip::result::ZipError::Io(e) => e,
        other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
    }
}

impl EntryContainer for ZipContainer {
    fn len(&self) -> usize {
        self.archive.len()
    }

    fn header(&mut self, index: usize) -> io::Result<EntryHeader> {
        let entry = self.archive.by_index_raw(index).map_err(zip_error)?;
        Ok(EntryHeader {
            name: entry.name().to_string(),
            is_dir: entry.is_dir(),
        })
    }

    fn read_entry(&mut self, index: usize) -> io::Result<Vec<u8>> {
        let mut entry = self.archive.by_index(index).map_err(zip_error)?;
        let mut buffer = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut buffer)?;
        Ok(buffer)
    }
}
