//! Matching loose files to package entries
//!
//! Candidates are found by file name first (case-insensitive), so only loose
//! files sharing a name with some package entry are ever read and hashed.
//! Every package that holds an identical copy produces its own [`Match`];
//! choosing between them is left to the caller.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::hashing::ContentHash;
use crate::progress::{SharedProgress, Stage};
use crate::scan::{LooseFileId, LooseFileSet, Package, PackageEntry};
use crate::storage::FileSystem;

/// A package entry together with the loose files holding the same content
#[derive(Debug, Clone)]
pub struct Match {
    pub package: Arc<Package>,
    /// Index into `package.entries`
    pub entry: usize,
    /// Loose files sharing the entry's file name and hash, never empty
    pub files: Vec<LooseFileId>,
}

impl Match {
    pub fn entry(&self) -> &PackageEntry {
        &self.package.entries[self.entry]
    }

    /// Reference string scenes should use instead of the loose copy
    pub fn package_reference(&self) -> String {
        self.package.reference_to(self.entry())
    }
}

/// Memoized loose-file hashes, filled on first demand.
///
/// `None` records a file that could not be read, so it is not retried.
#[derive(Debug, Default)]
pub struct HashCache {
    hashes: HashMap<LooseFileId, Option<ContentHash>>,
}

impl HashCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(
        &mut self,
        fs: &dyn FileSystem,
        files: &LooseFileSet,
        id: LooseFileId,
    ) -> Option<ContentHash> {
        *self.hashes.entry(id).or_insert_with(|| {
            let file = files.get(id);
            match fs.read(&file.path) {
                Ok(data) => Some(ContentHash::of(&data)),
                Err(e) => {
                    warn!("Could not hash {}: {}", file.local_path, e);
                    None
                }
            }
        })
    }

    /// Number of files read so far
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

pub struct Matcher {
    fs: Arc<dyn FileSystem>,
    progress: SharedProgress,
}

impl Matcher {
    pub fn new(fs: Arc<dyn FileSystem>, progress: SharedProgress) -> Self {
        Self { fs, progress }
    }

    pub fn execute(&self, packages: &[Arc<Package>], files: &LooseFileSet) -> Vec<Match> {
        let mut by_name: HashMap<String, Vec<LooseFileId>> = HashMap::new();
        for file in files.top_level() {
            by_name.entry(file.filename_lower()).or_default().push(file.id);
        }

        self.progress.start(Stage::MatchFiles, packages.len());
        let mut cache = HashCache::new();
        let mut matches = Vec::new();

        for (index, package) in packages.iter().enumerate() {
            for (entry_index, entry) in package.entries.iter().enumerate() {
                let Some(candidates) = by_name.get(&entry.filename_lower()) else {
                    continue;
                };

                let matched: Vec<LooseFileId> = candidates
                    .iter()
                    .copied()
                    .filter(|id| cache.get_or_compute(self.fs.as_ref(), files, *id) == Some(entry.hash))
                    .collect();
                if matched.is_empty() {
                    continue;
                }

                debug!(
                    "{} matches {} file(s)",
                    package.reference_to(entry),
                    matched.len()
                );
                matches.push(Match {
                    package: package.clone(),
                    entry: entry_index,
                    files: matched,
                });
            }
            self.progress.report(index + 1, packages.len(), &package.name.to_string());
        }

        self.progress.complete(Stage::MatchFiles);
        info!("Found {} matching files (hashed {} loose files).", matches.len(), cache.len());
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AbsorbConfig;
    use crate::progress::NullProgressReporter;
    use crate::scan::{LooseFileScanner, PackageName};
    use crate::storage::MemoryFileSystem;
    use std::path::PathBuf;

    fn package(filename: &str, entries: &[(&str, &[u8])]) -> Arc<Package> {
        Arc::new(Package {
            name: PackageName::parse(filename, "var").unwrap(),
            path: PathBuf::from("/vam/AddonPackages").join(filename),
            entries: entries
                .iter()
                .map(|(path, data)| PackageEntry {
                    local_path: path.to_string(),
                    hash: ContentHash::of(data),
                })
                .collect(),
        })
    }

    fn scan(fs: &Arc<MemoryFileSystem>) -> LooseFileSet {
        let config = AbsorbConfig::builder().library_root("/vam").build().unwrap();
        LooseFileScanner::new(fs.clone(), Arc::new(NullProgressReporter)).execute(&config)
    }

    fn matcher(fs: &Arc<MemoryFileSystem>) -> Matcher {
        Matcher::new(fs.clone(), Arc::new(NullProgressReporter))
    }

    #[test]
    fn equal_content_under_same_name_matches_together() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.add_file("/vam/Custom/Scripts/A/Script.cs", "X");
        fs.add_file("/vam/Custom/Scripts/B/script.CS", "X");
        fs.add_file("/vam/Custom/Scripts/C/Script.cs", "Y");
        let files = scan(&fs);

        let packages = vec![package("Author.Pack.1.var", &[("Custom/Scripts/Author/Script.cs", b"X")])];
        let matches = matcher(&fs).execute(&packages, &files);

        assert_eq!(matches.len(), 1);
        let matched: Vec<&str> = matches[0]
            .files
            .iter()
            .map(|id| files.get(*id).local_path.as_str())
            .collect();
        assert_eq!(
            matched,
            vec!["Custom/Scripts/A/Script.cs", "Custom/Scripts/B/script.CS"]
        );
        assert_eq!(
            matches[0].package_reference(),
            "Author.Pack.1:/Custom/Scripts/Author/Script.cs"
        );
    }

    #[test]
    fn same_content_different_name_does_not_match() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.add_file("/vam/Custom/Scripts/Renamed.cs", "X");
        let files = scan(&fs);

        let packages = vec![package("Author.Pack.1.var", &[("Custom/Scripts/Script.cs", b"X")])];
        assert!(matcher(&fs).execute(&packages, &files).is_empty());
    }

    #[test]
    fn every_package_holding_the_content_is_reported() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.add_file("/vam/Custom/Scripts/Script.cs", "X");
        let files = scan(&fs);

        let packages = vec![
            package("Author.Pack.1.var", &[("Custom/Scripts/Script.cs", b"X")]),
            package("Author.Pack.2.var", &[("Custom/Scripts/Script.cs", b"X")]),
            package("Other.Pack.1.var", &[("Custom/Scripts/Script.cs", b"Z")]),
        ];
        let matches = matcher(&fs).execute(&packages, &files);

        let names: Vec<String> = matches.iter().map(|m| m.package.name.to_string()).collect();
        assert_eq!(names, vec!["Author.Pack.1", "Author.Pack.2"]);
        assert_eq!(matches[0].files, matches[1].files);
    }

    #[test]
    fn only_name_candidates_are_hashed() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.add_file("/vam/Custom/Scripts/Script.cs", "X");
        fs.add_file("/vam/Custom/Scripts/Unrelated.cs", "X");
        let files = scan(&fs);

        let mut cache = HashCache::new();
        let packages = vec![package("Author.Pack.1.var", &[("Custom/Scripts/Script.cs", b"X")])];
        for entry in &packages[0].entries {
            for file in files.top_level().filter(|f| f.filename_lower() == entry.filename_lower()) {
                cache.get_or_compute(fs.as_ref(), &files, file.id);
            }
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn dependency_list_children_do_not_match_by_themselves() {
        let fs = Arc::new(MemoryFileSystem::new());
        fs.add_file("/vam/Custom/Scripts/Script.cslist", "Script.cs");
        fs.add_file("/vam/Custom/Scripts/Script.cs", "X");
        let files = scan(&fs);

        let packages = vec![package("Author.Pack.1.var", &[("Custom/Scripts/Script.cs", b"X")])];
        assert!(matcher(&fs).execute(&packages, &files).is_empty());
    }
}
