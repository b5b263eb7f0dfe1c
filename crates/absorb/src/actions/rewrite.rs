//! Scene reference rewriting
//!
//! Offsets recorded by the scene scanner are only valid against the text as it
//! was scanned. Replacements rarely have the length of the span they replace,
//! so each scene is edited from its highest offset down: an edit only ever
//! shifts text that was already processed.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::DRY_RUN_MARKER;
use crate::error::{AbsorbError, FileOperation, Result};
use crate::matcher::Match;
use crate::progress::{SharedProgress, Stage};
use crate::scan::{LooseFileId, LooseFileSet, Scene, SceneReference};
use crate::storage::FileSystem;

/// Outcome of a rewrite pass
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct RewriteSummary {
    /// Scenes whose text changed
    pub scenes_updated: usize,
    /// References replaced across all scenes
    pub references_rewritten: usize,
    /// References skipped because the text moved under them
    pub stale_references: usize,
}

/// Apply replacements to `text`, highest offset first.
///
/// Each edit is `(reference, replacement)`. A span whose current text differs
/// from the scanned value is left alone and reported as stale.
pub fn splice_references<'a>(
    text: &mut String,
    edits: impl IntoIterator<Item = (&'a SceneReference, String)>,
) -> (usize, Vec<&'a SceneReference>) {
    let mut edits: Vec<_> = edits.into_iter().collect();
    edits.sort_by(|a, b| b.0.offset.cmp(&a.0.offset));

    let mut applied = 0;
    let mut stale = Vec::new();
    for (reference, replacement) in edits {
        let end = reference.offset + reference.length;
        if text.get(reference.offset..end) != Some(reference.value.as_str()) {
            stale.push(reference);
            continue;
        }
        text.replace_range(reference.offset..end, &replacement);
        applied += 1;
    }
    (applied, stale)
}

pub struct ReferenceRewriter {
    fs: Arc<dyn FileSystem>,
    progress: SharedProgress,
}

impl ReferenceRewriter {
    pub fn new(fs: Arc<dyn FileSystem>, progress: SharedProgress) -> Self {
        Self { fs, progress }
    }

    /// Point scene references at package copies of matched files.
    ///
    /// In dry-run mode the new text is computed but never written.
    pub fn execute(
        &self,
        scenes: &[Scene],
        matches: &[Match],
        files: &LooseFileSet,
        dry_run: bool,
    ) -> Result<RewriteSummary> {
        let index = index_matches(matches, files);
        let marker = if dry_run { DRY_RUN_MARKER } else { "" };
        let mut summary = RewriteSummary::default();
        self.progress.start(Stage::UpdateScenes, scenes.len());

        for (position, scene) in scenes.iter().enumerate() {
            let edits: Vec<(&SceneReference, String)> = scene
                .references
                .iter()
                .filter_map(|r| index.get(&r.file).map(|m| (r, m.package_reference())))
                .collect();

            if !edits.is_empty() {
                let mut text = self
                    .fs
                    .read_to_string(&scene.path)
                    .map_err(|e| AbsorbError::io(&scene.path, FileOperation::Read, e))?;

                let (applied, stale) = splice_references(&mut text, edits);
                for reference in &stale {
                    let err = AbsorbError::StaleReference {
                        scene: scene.path.clone(),
                        offset: reference.offset,
                        expected: reference.value.clone(),
                    };
                    warn!("{}", err);
                }
                summary.stale_references += stale.len();

                if applied > 0 {
                    summary.scenes_updated += 1;
                    summary.references_rewritten += applied;
                    info!("{}UPDATE: {} ({} references)", marker, scene.local_path, applied);
                    if !dry_run {
                        self.fs
                            .write_string(&scene.path, &text)
                            .map_err(|e| AbsorbError::io(&scene.path, FileOperation::Write, e))?;
                    }
                }
            }

            self.progress.report(position + 1, scenes.len(), &scene.local_path);
        }

        self.progress.complete(Stage::UpdateScenes);
        info!(
            "{}Updated {} scenes ({} references).",
            marker, summary.scenes_updated, summary.references_rewritten
        );
        Ok(summary)
    }
}

/// Map every file of every matched unit to the first match that claims it
fn index_matches<'m>(matches: &'m [Match], files: &LooseFileSet) -> HashMap<LooseFileId, &'m Match> {
    let mut index = HashMap::new();
    for m in matches {
        for file in &m.files {
            for member in files.self_and_children(*file) {
                index.entry(member).or_insert(m);
            }
        }
    }
    index
}
