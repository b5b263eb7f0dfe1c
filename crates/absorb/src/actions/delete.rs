//! Deleting loose files that a package already provides

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use super::DRY_RUN_MARKER;
use crate::error::{AbsorbError, FileOperation, Result};
use crate::filter::Filter;
use crate::matcher::Match;
use crate::progress::{SharedProgress, Stage};
use crate::scan::{LooseFileId, LooseFileSet};
use crate::storage::FileSystem;

/// Outcome of a delete pass
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct DeleteSummary {
    /// Files deleted, or that would be deleted in dry-run mode
    pub files_deleted: usize,
    pub directories_removed: usize,
    pub bytes_reclaimed: u64,
}

/// Loose files to delete for `matches`, each matched file followed by its
/// dependency-list children. Files excluded by `filter` are kept together
/// with their children.
pub fn deletion_set(matches: &[Match], files: &LooseFileSet, filter: &dyn Filter) -> Vec<LooseFileId> {
    let mut seen = HashSet::new();
    let mut set = Vec::new();
    for m in matches {
        for id in &m.files {
            if filter.is_filtered(&files.get(*id).local_path) {
                debug!("Excluded: {}", files.get(*id).local_path);
                continue;
            }
            for member in files.self_and_children(*id) {
                if seen.insert(member) {
                    set.push(member);
                }
            }
        }
    }
    set
}

pub struct Deleter {
    fs: Arc<dyn FileSystem>,
    progress: SharedProgress,
}

impl Deleter {
    pub fn new(fs: Arc<dyn FileSystem>, progress: SharedProgress) -> Self {
        Self { fs, progress }
    }

    pub fn execute(
        &self,
        matches: &[Match],
        files: &mut LooseFileSet,
        filter: &dyn Filter,
        dry_run: bool,
        verbose: bool,
    ) -> Result<DeleteSummary> {
        let targets = deletion_set(matches, files, filter);
        if targets.is_empty() {
            info!("Good news, there's nothing to delete!");
            return Ok(DeleteSummary::default());
        }

        let marker = if dry_run { DRY_RUN_MARKER } else { "" };
        let bytes: u64 = targets.iter().map(|id| files.get(*id).size).sum();
        let megabytes = bytes as f64 / 1024.0 / 1024.0;
        info!("{}Deleting {} files ({:.2} MB)...", marker, targets.len(), megabytes);

        self.progress.start(Stage::DeleteFiles, targets.len());
        let mut parents = HashSet::new();
        for (index, id) in targets.iter().enumerate() {
            let file = files.get(*id);
            let path = file.path.clone();
            if verbose {
                info!("{}DELETE: {}", marker, file.local_path);
            }
            if !dry_run {
                self.fs
                    .remove_file(&path)
                    .map_err(|e| AbsorbError::io(&path, FileOperation::Delete, e))?;
                if let Some(parent) = path.parent() {
                    parents.insert(parent.to_path_buf());
                }
            }
            self.progress.report(index + 1, targets.len(), &file.local_path);
            files.remove_top_level(*id);
        }

        let directories_removed = if dry_run { 0 } else { self.remove_empty_dirs(parents)? };
        self.progress.complete(Stage::DeleteFiles);

        let summary = DeleteSummary {
            files_deleted: targets.len(),
            directories_removed,
            bytes_reclaimed: bytes,
        };
        info!(
            "{}Deleted {} files and {} empty folders.",
            marker, summary.files_deleted, summary.directories_removed
        );
        Ok(summary)
    }

    /// Deepest directories first so a parent emptied by its child goes too
    fn remove_empty_dirs(&self, dirs: HashSet<PathBuf>) -> Result<usize> {
        let mut dirs: Vec<PathBuf> = dirs.into_iter().collect();
        dirs.sort_by(|a, b| {
            b.as_os_str()
                .len()
                .cmp(&a.as_os_str().len())
                .then_with(|| a.cmp(b))
        });

        let mut removed = 0;
        for dir in dirs {
            if !self.fs.dir_exists(&dir) {
                continue;
            }
            let empty = self
                .fs
                .dir_is_empty(&dir)
                .map_err(|e| AbsorbError::io(&dir, FileOperation::List, e))?;
            if empty {
                debug!("Removing empty folder {}", dir.display());
                self.fs
                    .remove_dir(&dir)
                    .map_err(|e| AbsorbError::io(&dir, FileOperation::DeleteDir, e))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AbsorbConfig;
    use crate::filter::{ExcludeFilter, NoFilter};
    use crate::hashing::ContentHash;
    use crate::matcher::Matcher;
    use crate::progress::NullProgressReporter;
    use crate::scan::{LooseFileScanner, Package, PackageEntry, PackageName};
    use crate::actions::test_support::capture_logs;
    use crate::storage::MemoryFileSystem;
    use std::path::Path;

    fn setup(fs: &Arc<MemoryFileSystem>, entries: &[(&str, &[u8])]) -> (LooseFileSet, Vec<Match>) {
        let config = AbsorbConfig::builder().library_root("/vam").build().unwrap();
        let progress = Arc::new(NullProgressReporter);
        let files = LooseFileScanner::new(fs.clone(), progress.clone()).execute(&config);
        let package = Arc::new(Package {
            name: PackageName::parse("Author.Pack.1.var", "var").unwrap(),
            path: PathBuf::from("/vam/AddonPackages/Author.Pack.1.var"),
            entries: entries
                .iter()
                .map(|(path, data)| PackageEntry {
                    local_path: path.to_string(),
                    hash: ContentHash::of(data),
                })
                .collect(),
        });
        let matches = Matcher::new(fs.clone(), progress).execute(&[package], &files);
        (files, matches)
    }

    fn deleter(fs: &Arc<MemoryFileSystem>) -> Deleter {
        Deleter::new(fs.clone(), Arc::new(NullProgressReporter))
    }

    #[test]
    fn nothing_to_delete_touches_nothing() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.add_file("/vam/Custom/Scripts/Script.cs", "X");
        let (mut files, matches) = setup(&fs, &[("Custom/Scripts/Other.cs", b"X")]);
        assert!(matches.is_empty());

        let summary = deleter(&fs)
            .execute(&matches, &mut files, &NoFilter, false, true)
            .unwrap();
        assert_eq!(summary, DeleteSummary::default());
        assert_eq!(fs.mutations(), 0);
    }

    #[test]
    fn deletes_files_and_emptied_folders() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.add_file("/vam/Custom/Scripts/Author/Deep/Script.cs", "X");
        fs.add_file("/vam/Custom/Scripts/Keep.cs", "keep");
        let (mut files, matches) = setup(&fs, &[("Custom/Scripts/Script.cs", b"X")]);

        let summary = deleter(&fs)
            .execute(&matches, &mut files, &NoFilter, false, false)
            .unwrap();

        assert_eq!(summary.files_deleted, 1);
        assert_eq!(summary.bytes_reclaimed, 1);
        assert_eq!(summary.directories_removed, 1);
        assert!(!fs.exists(Path::new("/vam/Custom/Scripts/Author/Deep/Script.cs")));
        assert!(!fs.dir_exists(Path::new("/vam/Custom/Scripts/Author/Deep")));
        // Only parents of deleted files are visited.
        assert!(fs.dir_exists(Path::new("/vam/Custom/Scripts/Author")));
        assert!(fs.exists(Path::new("/vam/Custom/Scripts/Keep.cs")));
        assert_eq!(files.top_level().count(), 1);
    }

    #[test]
    fn dependency_list_is_deleted_with_its_children() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.add_file("/vam/Custom/Scripts/Plugin.cslist", "Main.cs\nHelper.cs");
        fs.add_file("/vam/Custom/Scripts/Main.cs", "main");
        fs.add_file("/vam/Custom/Scripts/Helper.cs", "helper");
        fs.add_file("/vam/Custom/Scripts/Unrelated.cs", "other");
        let list = b"Main.cs\nHelper.cs".as_slice();
        let (mut files, matches) = setup(&fs, &[("Custom/Scripts/Plugin.cslist", list)]);

        let summary = deleter(&fs)
            .execute(&matches, &mut files, &NoFilter, false, false)
            .unwrap();

        assert_eq!(summary.files_deleted, 3);
        assert!(!fs.exists(Path::new("/vam/Custom/Scripts/Plugin.cslist")));
        assert!(!fs.exists(Path::new("/vam/Custom/Scripts/Main.cs")));
        assert!(!fs.exists(Path::new("/vam/Custom/Scripts/Helper.cs")));
        assert!(fs.exists(Path::new("/vam/Custom/Scripts/Unrelated.cs")));
        assert_eq!(summary.directories_removed, 0);
    }

    #[test]
    fn excluded_files_are_kept() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.add_file("/vam/Custom/Scripts/Mine/Script.cs", "X");
        fs.add_file("/vam/Custom/Scripts/Theirs/Script.cs", "X");
        let (mut files, matches) = setup(&fs, &[("Custom/Scripts/Script.cs", b"X")]);
        let filter = ExcludeFilter::new(["Custom/Scripts/Mine"]).unwrap();

        let summary = deleter(&fs)
            .execute(&matches, &mut files, &filter, false, false)
            .unwrap();

        assert_eq!(summary.files_deleted, 1);
        assert!(fs.exists(Path::new("/vam/Custom/Scripts/Mine/Script.cs")));
        assert!(!fs.exists(Path::new("/vam/Custom/Scripts/Theirs/Script.cs")));
    }

    #[test]
    fn dry_run_logs_the_same_lines_with_a_marker() {
        let run = |dry_run: bool| {
            let fs = Arc::new(MemoryFileSystem::new());
            fs.add_file("/vam/Custom/Scripts/Script.cs", "X");
            fs.add_file("/vam/Custom/Scripts/Keep.cs", "keep");
            let (mut files, matches) = setup(&fs, &[("Custom/Scripts/Script.cs", b"X")]);
            capture_logs(|| {
                deleter(&fs)
                    .execute(&matches, &mut files, &NoFilter, dry_run, true)
                    .unwrap();
            })
        };

        let real = run(false);
        let dry = run(true);

        assert!(real.contains("DELETE: Custom/Scripts/Script.cs"));
        assert!(dry.lines().all(|line| line.contains(DRY_RUN_MARKER)));
        assert_eq!(dry.replace(DRY_RUN_MARKER, ""), real);
    }

    #[test]
    fn dry_run_counts_without_deleting() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.add_file("/vam/Custom/Scripts/Script.cs", "X");
        let (mut files, matches) = setup(&fs, &[("Custom/Scripts/Script.cs", b"X")]);

        let summary = deleter(&fs)
            .execute(&matches, &mut files, &NoFilter, true, true)
            .unwrap();

        assert_eq!(summary.files_deleted, 1);
        assert_eq!(summary.directories_removed, 0);
        assert_eq!(fs.mutations(), 0);
        assert!(fs.exists(Path::new("/vam/Custom/Scripts/Script.cs")));
    }
}
