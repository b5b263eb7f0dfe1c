//! Package archive scanning
//!
//! Every archive in the packages folder is opened and each content entry is
//! hashed while the archive is open. Archives are scanned in parallel, up to
//! `max_concurrency` at a time; the entries of one archive are hashed in
//! order on a blocking thread. A package joins the result only once all of
//! its entries were read, so a failing archive contributes nothing.

use parking_lot::Mutex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::config::AbsorbConfig;
use crate::error::{AbsorbError, FileOperation, Result};
use crate::hashing::ContentHash;
use crate::paths;
use crate::progress::{SharedProgress, Stage};
use crate::storage::{ArchiveFormat, FileSystem};

/// Name parsed from an `Author.Name.Version.var` filename
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct PackageName {
    pub author: String,
    pub name: String,
    pub version: String,
}

impl PackageName {
    /// Parse a package filename. The first segment is the author, the last
    /// the version, and everything between is the name.
    pub fn parse(filename: &str, extension: &str) -> Result<Self> {
        let invalid = || AbsorbError::InvalidPackageName {
            filename: filename.to_string(),
        };

        let stem = match filename.rsplit_once('.') {
            Some((stem, ext)) if ext.eq_ignore_ascii_case(extension) => stem,
            _ => filename,
        };
        let parts: Vec<&str> = stem.split('.').collect();
        if parts.len() < 3 || parts.iter().any(|p| p.trim().is_empty()) {
            return Err(invalid());
        }

        Ok(Self {
            author: parts[0].to_string(),
            name: parts[1..parts.len() - 1].join("."),
            version: parts[parts.len() - 1].to_string(),
        })
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.author, self.name, self.version)
    }
}

/// One content file inside a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageEntry {
    /// Path inside the archive with `/` separators
    pub local_path: String,
    pub hash: ContentHash,
}

impl PackageEntry {
    pub fn filename_lower(&self) -> String {
        paths::file_name(&self.local_path).to_lowercase()
    }
}

/// A scanned package archive
#[derive(Debug, Clone)]
pub struct Package {
    pub name: PackageName,
    pub path: PathBuf,
    pub entries: Vec<PackageEntry>,
}

impl Package {
    /// Reference string a scene uses to point at `entry` inside this package
    pub fn reference_to(&self, entry: &PackageEntry) -> String {
        format!("{}:/{}", self.name, entry.local_path.replace('\\', "/"))
    }
}

/// Scans the packages folder with a bounded pool of workers
pub struct PackageScanner {
    fs: Arc<dyn FileSystem>,
    format: Arc<dyn ArchiveFormat>,
    progress: SharedProgress,
}

impl PackageScanner {
    pub fn new(fs: Arc<dyn FileSystem>, format: Arc<dyn ArchiveFormat>, progress: SharedProgress) -> Self {
        Self { fs, format, progress }
    }

    pub async fn execute(&self, config: &AbsorbConfig) -> Result<Vec<Arc<Package>>> {
        let folder = config.packages_path();
        let archives = match self.fs.list_files(&folder, &config.package_extension) {
            Ok(archives) => archives,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("Packages folder {} does not exist", folder.display());
                Vec::new()
            }
            Err(e) => {
                warn!("Could not list packages in {}: {}", folder.display(), e);
                Vec::new()
            }
        };

        let total = archives.len();
        self.progress.start(Stage::ScanPackages, total);

        let semaphore = Arc::new(Semaphore::new(config.max_concurrency));
        let packages = Arc::new(Mutex::new(Vec::with_capacity(total)));
        let scanned = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::with_capacity(total);
        for archive in archives {
            let sem = semaphore.clone();
            let fs = self.fs.clone();
            let format = self.format.clone();
            let progress = self.progress.clone();
            let packages = packages.clone();
            let scanned = scanned.clone();
            let package_extension = config.package_extension.clone();
            let metadata_entry = config.metadata_entry.clone();

            let task = tokio::spawn(async move {
                let _permit = sem
                    .acquire_owned()
                    .await
                    .map_err(|e| AbsorbError::Task(e.to_string()))?;

                let path = archive.clone();
                let result = tokio::task::spawn_blocking(move || {
                    scan_archive(fs.as_ref(), format.as_ref(), &path, &package_extension, &metadata_entry)
                })
                .await
                .unwrap_or_else(|e| Err(AbsorbError::from(e)));

                let filename = archive
                    .file_name()
                    .map(|f| f.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let done = scanned.fetch_add(1, Ordering::SeqCst) + 1;
                progress.report(done, total, &filename);

                match result {
                    Ok(Some(package)) => {
                        debug!("Scanned {} ({} entries)", filename, package.entries.len());
                        packages.lock().push(Arc::new(package));
                    }
                    Ok(None) => debug!("Skipping {}: no content entries", filename),
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => warn!(category = e.category(), "Skipping package {}: {}", filename, e),
                }
                Ok::<(), AbsorbError>(())
            });
            tasks.push(task);
        }

        // Every task is awaited before a fatal error is returned
        let mut fatal = None;
        for task in tasks {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) if e.is_fatal() => {
                    fatal.get_or_insert(e);
                }
                Ok(Err(e)) => warn!(category = e.category(), "Package scan failed: {}", e),
                Err(e) => warn!("Package scan task failed: {}", e),
            }
        }
        if let Some(e) = fatal {
            return Err(e);
        }

        let mut packages = std::mem::take(&mut *packages.lock());
        packages.sort_by(|a, b| a.path.cmp(&b.path));

        self.progress.complete(Stage::ScanPackages);
        info!("Scanned {} packages.", packages.len());
        Ok(packages)
    }
}

/// Read and hash every content entry of one archive
fn scan_archive(
    fs: &dyn FileSystem,
    format: &dyn ArchiveFormat,
    path: &Path,
    package_extension: &str,
    metadata_entry: &str,
) -> Result<Option<Package>> {
    let filename = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = PackageName::parse(&filename, package_extension)?;

    let reader = fs
        .open(path)
        .map_err(|e| AbsorbError::io(path, FileOperation::Read, e))?;
    let archive_error = |e: io::Error| AbsorbError::Archive {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };
    let mut container = format.open(reader).map_err(archive_error)?;

    let mut entries = Vec::new();
    for index in 0..container.len() {
        let header = container.header(index).map_err(archive_error)?;
        if header.is_dir || header.name.ends_with('/') || header.name == metadata_entry {
            continue;
        }
        let data = container.read_entry(index).map_err(archive_error)?;
        entries.push(PackageEntry {
            local_path: header.name.replace('\\', "/"),
            hash: ContentHash::of(&data),
        });
    }

    if entries.is_empty() {
        return Ok(None);
    }
    Ok(Some(Package {
        name,
        path: path.to_path_buf(),
        entries,
    }))
}
