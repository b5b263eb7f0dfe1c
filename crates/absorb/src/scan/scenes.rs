//! Scene scanning
//!
//! Scenes are JSON documents that point at other loose files through quoted
//! string values. The scanner does not parse JSON: it looks for
//! `"key": "some/path.ext"` shapes and keeps the byte span of each value that
//! resolves to a known loose file.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::AbsorbConfig;
use crate::paths;
use crate::progress::{SharedProgress, Stage};
use crate::scan::files::{LooseFileId, LooseFileSet};
use crate::storage::FileSystem;

static REFERENCE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#": ?"(?P<path>[^"]+\.[a-zA-Z]{2,6})""#).expect("reference pattern is valid")
});

/// A quoted reference inside a scene, located in the original text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneReference {
    pub file: LooseFileId,
    /// Byte offset of the value, quotes excluded
    pub offset: usize,
    /// Byte length of the value
    pub length: usize,
    /// The value as it appeared when scanned
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub file: LooseFileId,
    pub path: PathBuf,
    pub local_path: String,
    pub references: Vec<SceneReference>,
}

/// Extract every quoted path-like value of `text` as `(offset, value)`.
///
/// Values containing a colon already point into a package and are skipped.
pub fn extract_references(text: &str) -> Vec<(usize, &str)> {
    REFERENCE_PATTERN
        .captures_iter(text)
        .filter_map(|caps| caps.name("path"))
        .filter(|m| !m.as_str().contains(':'))
        .map(|m| (m.start(), m.as_str()))
        .collect()
}

pub struct SceneScanner {
    fs: Arc<dyn FileSystem>,
    progress: SharedProgress,
}

impl SceneScanner {
    pub fn new(fs: Arc<dyn FileSystem>, progress: SharedProgress) -> Self {
        Self { fs, progress }
    }

    pub fn execute(&self, config: &AbsorbConfig, files: &LooseFileSet) -> Vec<Scene> {
        let scene_ext = config.scene_extension.as_str();
        let candidates: Vec<_> = files.all().filter(|f| f.extension == scene_ext).collect();
        self.progress.start(Stage::ScanScenes, candidates.len());

        let mut scenes = Vec::new();
        for (index, candidate) in candidates.iter().enumerate() {
            match self.fs.read_to_string(&candidate.path) {
                Ok(text) => {
                    let dir = candidate.path.parent().unwrap_or(Path::new(""));
                    let references = resolve_references(&text, dir, &config.library_root, files, scene_ext);
                    if references.is_empty() {
                        debug!("{} holds no resolvable references", candidate.local_path);
                    } else {
                        debug!("{}: {} references", candidate.local_path, references.len());
                        scenes.push(Scene {
                            file: candidate.id,
                            path: candidate.path.clone(),
                            local_path: candidate.local_path.clone(),
                            references,
                        });
                    }
                }
                Err(e) => warn!("Could not read {}: {}", candidate.local_path, e),
            }
            self.progress.report(index + 1, candidates.len(), &candidate.local_path);
        }

        self.progress.complete(Stage::ScanScenes);
        info!("Found {} scenes referencing loose files.", scenes.len());
        scenes
    }
}

fn resolve_references(
    text: &str,
    scene_dir: &Path,
    root: &Path,
    files: &LooseFileSet,
    scene_ext: &str,
) -> Vec<SceneReference> {
    let mut references = Vec::new();
    for (offset, value) in extract_references(text) {
        let target = [paths::resolve(scene_dir, value), paths::resolve(root, value)]
            .iter()
            .filter_map(|candidate| files.find(candidate))
            .find(|id| files.get(*id).extension != scene_ext);

        if let Some(file) = target {
            references.push(SceneReference {
                file,
                offset,
                length: value.len(),
                value: value.to_string(),
            });
        }
    }
    references
}
