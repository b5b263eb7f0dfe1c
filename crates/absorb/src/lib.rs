//! Absorb Library
//!
//! This library finds loose asset files in a content library that are
//! byte-identical copies of entries shipped inside `.var` packages, points
//! scenes that reference those loose copies at the packaged entries instead,
//! and deletes the loose copies.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use absorb::{AbsorbConfig, Absorber, LogProgressReporter};
//! use std::sync::Arc;
//!
//! # async fn example() -> absorb::Result<()> {
//! // Describe the library and what to protect
//! let config = AbsorbConfig::builder()
//!     .library_root("/games/VaM")
//!     .exclude("Saves/scene/MyScene")
//!     .dry_run(true)
//!     .build()?;
//!
//! // Run every stage against the local disk
//! let report = Absorber::new(config)
//!     .with_progress(Arc::new(LogProgressReporter))
//!     .run()
//!     .await?;
//!
//! println!("{} files would be deleted", report.files_deleted);
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Dependency lists**: `.cslist` files and the scripts they name are matched and deleted as one unit
//! - **Parallel package scan**: archives are hashed on blocking threads, a bounded number at a time
//! - **Lazy hashing**: only loose files sharing a name with a package entry are read
//! - **Safe rewriting**: scene references are spliced from the end of the text backwards
//! - **Dry run**: every stage runs, nothing is written or deleted
//! - **Pluggable storage**: stages run against any [`FileSystem`] and [`ArchiveFormat`]

pub mod absorber;
pub mod actions;
pub mod config;
pub mod error;
pub mod filter;
pub mod hashing;
pub mod matcher;
pub mod paths;
pub mod progress;
pub mod scan;
pub mod storage;


// Re-export commonly used types for convenience
pub use absorber::{AbsorbReport, Absorber};
pub use actions::{DeleteSummary, Deleter, ReferenceRewriter, RewriteSummary};
pub use config::{AbsorbConfig, AbsorbConfigBuilder};
pub use error::{AbsorbError, FileOperation, Result};
pub use filter::{ExcludeFilter, Filter, NoFilter};
pub use hashing::ContentHash;
pub use matcher::{HashCache, Match, Matcher};
pub use progress::{LogProgressReporter, NullProgressReporter, ProgressReporter, SharedProgress, Stage};
pub use scan::{
    LooseFile, LooseFileId, LooseFileScanner, LooseFileSet, Package, PackageEntry, PackageName,
    PackageScanner, Scene, SceneReference, SceneScanner,
};
pub use storage::{ArchiveFormat, FileSystem, LocalFileSystem, MemoryFileSystem, ZipFormat};
