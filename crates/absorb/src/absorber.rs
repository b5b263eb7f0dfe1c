//! Pipeline orchestration
//!
//! [`Absorber`] wires the stages together: scan loose files, scan packages,
//! scan scenes, match, rewrite scene references and finally delete the loose
//! copies. Stages run one after another; only the package scan is parallel.

use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::actions::{DRY_RUN_MARKER, Deleter, ReferenceRewriter};
use crate::config::AbsorbConfig;
use crate::error::Result;
use crate::matcher::Matcher;
use crate::progress::{NullProgressReporter, SharedProgress};
use crate::scan::{LooseFileScanner, PackageScanner, SceneScanner};
use crate::storage::{ArchiveFormat, FileSystem, LocalFileSystem, ZipFormat};

/// Totals of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct AbsorbReport {
    pub files_scanned: usize,
    pub packages_scanned: usize,
    pub scenes_found: usize,
    pub matches: usize,
    pub scenes_updated: usize,
    pub references_rewritten: usize,
    pub stale_references: usize,
    pub files_deleted: usize,
    pub directories_removed: usize,
    pub bytes_reclaimed: u64,
    pub dry_run: bool,
    pub elapsed_ms: u64,
}

/// Runs the whole pipeline over one library
pub struct Absorber {
    config: AbsorbConfig,
    fs: Arc<dyn FileSystem>,
    format: Arc<dyn ArchiveFormat>,
    progress: SharedProgress,
}

impl Absorber {
    /// Absorber over the local disk reading zip packages
    pub fn new(config: AbsorbConfig) -> Self {
        Self::with_storage(config, Arc::new(LocalFileSystem::new()), Arc::new(ZipFormat))
    }

    pub fn with_storage(config: AbsorbConfig, fs: Arc<dyn FileSystem>, format: Arc<dyn ArchiveFormat>) -> Self {
        Self {
            config,
            fs,
            format,
            progress: Arc::new(NullProgressReporter),
        }
    }

    /// Set the reporter notified as stages advance
    pub fn with_progress(mut self, progress: SharedProgress) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &AbsorbConfig {
        &self.config
    }

    /// Run every stage. Scan failures are logged and skipped; a failed write
    /// or delete aborts the run.
    pub async fn run(&self) -> Result<AbsorbReport> {
        let start = Instant::now();
        self.config.validate()?;
        let filter = self.config.filter()?;
        let dry_run = self.config.dry_run;
        if dry_run {
            info!("{}Nothing will be written or deleted.", DRY_RUN_MARKER);
        }
        info!("Absorbing loose files under {}", self.config.library_root.display());

        // Phase 1: loose files, with dependency lists grouped
        let mut files = LooseFileScanner::new(self.fs.clone(), self.progress.clone()).execute(&self.config);
        let files_scanned = files.len();

        // Phase 2: package archives (parallel)
        let packages = PackageScanner::new(self.fs.clone(), self.format.clone(), self.progress.clone())
            .execute(&self.config)
            .await?;

        // Phase 3: scenes referencing loose files
        let scenes = SceneScanner::new(self.fs.clone(), self.progress.clone()).execute(&self.config, &files);

        // Phase 4: loose files identical to package entries
        let matches = Matcher::new(self.fs.clone(), self.progress.clone()).execute(&packages, &files);

        // Phase 5: point scenes at the package copies
        let rewrite = ReferenceRewriter::new(self.fs.clone(), self.progress.clone())
            .execute(&scenes, &matches, &files, dry_run)?;

        // Phase 6: delete the loose copies
        let delete = Deleter::new(self.fs.clone(), self.progress.clone()).execute(
            &matches,
            &mut files,
            &filter,
            dry_run,
            self.config.verbose,
        )?;

        let elapsed = start.elapsed();
        info!("Done in {:.2}s", elapsed.as_secs_f64());

        Ok(AbsorbReport {
            files_scanned,
            packages_scanned: packages.len(),
            scenes_found: scenes.len(),
            matches: matches.len(),
            scenes_updated: rewrite.scenes_updated,
            references_rewritten: rewrite.references_rewritten,
            stale_references: rewrite.stale_references,
            files_deleted: delete.files_deleted,
            directories_removed: delete.directories_removed,
            bytes_reclaimed: delete.bytes_reclaimed,
            dry_run,
            elapsed_ms: elapsed.as_millis() as u64,
        })
    }
}
