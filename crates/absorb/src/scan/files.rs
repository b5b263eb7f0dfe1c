//! Loose-file scanning and dependency-list grouping

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::AbsorbConfig;
use crate::paths;
use crate::progress::{SharedProgress, Stage};
use crate::storage::FileSystem;

/// Index of a loose file inside its [`LooseFileSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LooseFileId(usize);

/// A file of the user library that lives outside any package
#[derive(Debug, Clone)]
pub struct LooseFile {
    pub id: LooseFileId,
    /// Absolute path
    pub path: PathBuf,
    /// Root-relative path with `/` separators
    pub local_path: String,
    pub size: u64,
    /// Lower-case extension without the dot
    pub extension: String,
    /// Files declared by this file when it is a dependency list
    pub children: Vec<LooseFileId>,
}

impl LooseFile {
    /// Lower-cased file name, the key files are matched on
    pub fn filename_lower(&self) -> String {
        paths::file_name(&self.local_path).to_lowercase()
    }
}

/// Every loose file found by a scan.
///
/// Files claimed by a dependency list are stored but left out of the
/// top-level list; they are reachable only through their list's children.
#[derive(Debug, Default, Clone)]
pub struct LooseFileSet {
    files: Vec<LooseFile>,
    top_level: Vec<LooseFileId>,
    by_path: HashMap<PathBuf, LooseFileId>,
}

impl LooseFileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: PathBuf, local_path: String, size: u64) -> LooseFileId {
        let id = LooseFileId(self.files.len());
        let extension = paths::extension(&path);
        self.by_path.insert(paths::normalize(&path), id);
        self.files.push(LooseFile {
            id,
            path,
            local_path,
            size,
            extension,
            children: Vec::new(),
        });
        self.top_level.push(id);
        id
    }

    pub fn get(&self, id: LooseFileId) -> &LooseFile {
        &self.files[id.0]
    }

    /// Look a file up by path; `.` and `..` components are collapsed first
    pub fn find(&self, path: &Path) -> Option<LooseFileId> {
        self.by_path.get(&paths::normalize(path)).copied()
    }

    /// Top-level files, in scan order
    pub fn top_level(&self) -> impl Iterator<Item = &LooseFile> + '_ {
        self.top_level.iter().map(|id| self.get(*id))
    }

    pub fn top_level_ids(&self) -> &[LooseFileId] {
        &self.top_level
    }

    /// Every scanned file, children included
    pub fn all(&self) -> impl Iterator<Item = &LooseFile> + '_ {
        self.files.iter()
    }

    /// Number of top-level files
    pub fn len(&self) -> usize {
        self.top_level.len()
    }

    pub fn is_empty(&self) -> bool {
        self.top_level.is_empty()
    }

    /// The file followed by all of its children, depth first
    pub fn self_and_children(&self, id: LooseFileId) -> Vec<LooseFileId> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        self.collect_unit(id, &mut out, &mut seen);
        out
    }

    fn collect_unit(&self, id: LooseFileId, out: &mut Vec<LooseFileId>, seen: &mut HashSet<LooseFileId>) {
        if !seen.insert(id) {
            return;
        }
        out.push(id);
        for child in &self.get(id).children {
            self.collect_unit(*child, out, seen);
        }
    }

    fn add_child(&mut self, parent: LooseFileId, child: LooseFileId) {
        let children = &mut self.files[parent.0].children;
        if !children.contains(&child) {
            children.push(child);
        }
    }

    /// Drop a file from the top-level list; it stays addressable by id
    pub fn remove_top_level(&mut self, id: LooseFileId) -> bool {
        let before = self.top_level.len();
        self.top_level.retain(|f| *f != id);
        before != self.top_level.len()
    }
}

/// Enumerates the content folders and groups dependency lists
pub struct LooseFileScanner {
    fs: Arc<dyn FileSystem>,
    progress: SharedProgress,
}

impl LooseFileScanner {
    pub fn new(fs: Arc<dyn FileSystem>, progress: SharedProgress) -> Self {
        Self { fs, progress }
    }

    pub fn execute(&self, config: &AbsorbConfig) -> LooseFileSet {
        self.progress.start(Stage::ScanFiles, 0);

        let mut files = LooseFileSet::new();
        let mut counter = 0;
        for folder in config.content_paths() {
            match self.fs.walk_files(&folder) {
                Ok(mut found) => {
                    found.sort();
                    for path in found {
                        if let Some(local_path) = self.describe(&config.library_root, &path) {
                            let size = match self.fs.file_size(&path) {
                                Ok(size) => size,
                                Err(e) => {
                                    warn!("Skipping {}: {}", local_path, e);
                                    continue;
                                }
                            };
                            counter += 1;
                            self.progress.report(counter, 0, &local_path);
                            files.insert(path, local_path, size);
                        }
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    warn!("Content folder {} does not exist, skipping", folder.display());
                }
                Err(e) => warn!("Could not scan {}: {}", folder.display(), e),
            }
        }

        self.group_dependency_lists(config, &mut files);
        self.progress.complete(Stage::ScanFiles);

        info!("Scanned {} files.", files.len());
        files
    }

    /// Root-relative path of a scanned file, `None` for dot-prefixed components
    fn describe(&self, root: &Path, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(root).unwrap_or(path);
        if paths::is_hidden(relative) {
            debug!("Skipping hidden path {}", relative.display());
            return None;
        }
        Some(paths::to_forward_slashes(relative))
    }

    fn group_dependency_lists(&self, config: &AbsorbConfig, files: &mut LooseFileSet) {
        let list_ext = config.dependency_list_extension.as_str();
        let lists: Vec<LooseFileId> = files
            .top_level()
            .filter(|f| f.extension == list_ext)
            .map(|f| f.id)
            .collect();
        if lists.is_empty() {
            return;
        }

        let mut claimed = Vec::new();
        for list_id in lists {
            let list = files.get(list_id);
            let list_dir = list.path.parent().map(Path::to_path_buf).unwrap_or_default();
            let text = match self.fs.read_to_string(&list.path) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Could not read dependency list {}: {}", list.local_path, e);
                    continue;
                }
            };

            for line in text.lines() {
                let reference = line.trim();
                if reference.is_empty() {
                    continue;
                }
                let child = [
                    paths::resolve(&list_dir, reference),
                    paths::resolve(&config.library_root, reference),
                ]
                .iter()
                .filter_map(|candidate| files.find(candidate))
                .find(|id| files.get(*id).extension != list_ext);

                if let Some(child) = child {
                    files.add_child(list_id, child);
                    claimed.push(child);
                }
            }
        }

        for child in claimed {
            files.remove_top_level(child);
        }
    }
}
