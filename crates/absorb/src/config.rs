//! Configuration types for the deduplication pipeline

use std::path::PathBuf;

use crate::error::{AbsorbError, Result};
use crate::filter::ExcludeFilter;

/// Configuration for one run over a library
#[derive(Debug, Clone)]
pub struct AbsorbConfig {
    /// Library root holding the content folders and the packages folder
    pub library_root: PathBuf,
    /// Folders scanned for loose files, relative to the root
    pub content_dirs: Vec<String>,
    /// Folder holding package archives, relative to the root
    pub packages_dir: String,
    /// Extension of package archives (no dot)
    pub package_extension: String,
    /// Extension of documents scanned for references
    pub scene_extension: String,
    /// Extension of dependency-list files
    pub dependency_list_extension: String,
    /// Archive entry ignored when hashing packages
    pub metadata_entry: String,
    /// Number of archives scanned at once
    pub max_concurrency: usize,
    /// Compute everything but never write or delete
    pub dry_run: bool,
    /// Log every file touched
    pub verbose: bool,
    /// Glob patterns protecting loose files from deletion
    pub exclude: Vec<String>,
}

impl Default for AbsorbConfig {
    fn default() -> Self {
        Self {
            library_root: PathBuf::from("."),
            content_dirs: vec!["Custom".to_string(), "Saves".to_string()],
            packages_dir: "AddonPackages".to_string(),
            package_extension: "var".to_string(),
            scene_extension: "json".to_string(),
            dependency_list_extension: "cslist".to_string(),
            metadata_entry: "meta.json".to_string(),
            max_concurrency: 4,
            dry_run: false,
            verbose: false,
            exclude: Vec::new(),
        }
    }
}

impl AbsorbConfig {
    pub fn builder() -> AbsorbConfigBuilder {
        AbsorbConfigBuilder::new()
    }

    pub fn packages_path(&self) -> PathBuf {
        self.library_root.join(&self.packages_dir)
    }

    pub fn content_paths(&self) -> Vec<PathBuf> {
        self.content_dirs
            .iter()
            .map(|dir| self.library_root.join(dir))
            .collect()
    }

    /// Compile the exclusion patterns
    pub fn filter(&self) -> Result<ExcludeFilter> {
        ExcludeFilter::new(&self.exclude)
    }

    pub fn validate(&self) -> Result<()> {
        if self.library_root.as_os_str().is_empty() {
            return Err(AbsorbError::Configuration {
                message: "library root must not be empty".to_string(),
                field: Some("library_root".to_string()),
            });
        }
        if self.content_dirs.is_empty() {
            return Err(AbsorbError::Configuration {
                message: "at least one content folder is required".to_string(),
                field: Some("content_dirs".to_string()),
            });
        }
        if self.max_concurrency == 0 {
            return Err(AbsorbError::Configuration {
                message: "max_concurrency must be at least 1".to_string(),
                field: Some("max_concurrency".to_string()),
            });
        }
        for (field, ext) in [
            ("package_extension", &self.package_extension),
            ("scene_extension", &self.scene_extension),
            ("dependency_list_extension", &self.dependency_list_extension),
        ] {
            if ext.is_empty() || ext.starts_with('.') || ext.chars().any(|c| c.is_uppercase()) {
                return Err(AbsorbError::Configuration {
                    message: format!("{field} must be lower-case and given without a dot, got '{ext}'"),
                    field: Some(field.to_string()),
                });
            }
        }
        self.filter()?;
        Ok(())
    }
}

/// Fluent builder for [`AbsorbConfig`]
#[derive(Debug, Clone, Default)]
pub struct AbsorbConfigBuilder {
    config: AbsorbConfig,
}

impl AbsorbConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn library_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.library_root = root.into();
        self
    }

    pub fn content_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.content_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    pub fn packages_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.packages_dir = dir.into();
        self
    }

    pub fn max_concurrency(mut self, max: usize) -> Self {
        self.config.max_concurrency = max;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.config.dry_run = dry_run;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.config.exclude.push(pattern.into());
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> Result<AbsorbConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_library_layout() {
        let config = AbsorbConfig::builder().library_root("/vam").build().unwrap();
        assert_eq!(
            config.content_paths(),
            vec![PathBuf::from("/vam/Custom"), PathBuf::from("/vam/Saves")]
        );
        assert_eq!(config.packages_path(), PathBuf::from("/vam/AddonPackages"));
        assert_eq!(config.max_concurrency, 4);
        assert!(!config.dry_run);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let err = AbsorbConfig::builder()
            .library_root("/vam")
            .max_concurrency(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, AbsorbError::Configuration { field: Some(ref f), .. } if f == "max_concurrency"));
    }

    #[test]
    fn bad_exclude_pattern_fails_validation() {
        let result = AbsorbConfig::builder()
            .library_root("/vam")
            .exclude("Saves/[oops")
            .build();
        assert!(matches!(result, Err(AbsorbError::InvalidPattern { .. })));
    }

    #[test]
    fn dotted_extension_is_rejected() {
        let mut config = AbsorbConfig::default();
        config.scene_extension = ".json".to_string();
        assert!(config.validate().is_err());
    }
}
