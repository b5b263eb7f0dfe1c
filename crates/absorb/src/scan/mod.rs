//! Scanning stages: loose files, package archives and scenes

pub mod files;
pub mod packages;
pub mod scenes;

pub use files::{LooseFile, LooseFileId, LooseFileScanner, LooseFileSet};
pub use packages::{Package, PackageEntry, PackageName, PackageScanner};
pub use scenes::{Scene, SceneReference, SceneScanner, extract_references};
