//! quire: renders Markdown documents with front matter into HTML pages
//!
//! Each document names a layout in its metadata block; the Markdown body is
//! converted to HTML and bound into that layout together with the page
//! metadata and site-wide settings.

pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod server;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// A site rooted at a directory
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory (where `_config.yml` lives)
    pub base_dir: PathBuf,
    /// Source directory
    pub source_dir: PathBuf,
    /// Output directory
    pub dest_dir: PathBuf,
    /// Site layouts directory
    pub layouts_dir: PathBuf,
    /// Site includes directory
    pub includes_dir: PathBuf,
}

impl Site {
    pub const CONFIG_FILE: &'static str = "_config.yml";

    /// Open a site, loading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref();
        let config_path = base_dir.join(Self::CONFIG_FILE);

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            tracing::debug!("No {} found, using defaults", Self::CONFIG_FILE);
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Open a site with an explicit configuration.
    ///
    /// A relative `base_dir` is resolved against the working directory, since
    /// file watcher events always carry absolute paths.
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref();
        let base_dir = if base_dir.is_absolute() {
            base_dir.to_path_buf()
        } else {
            match std::env::current_dir() {
                Ok(cwd) => cwd.join(base_dir),
                Err(e) => {
                    tracing::warn!("Cannot resolve {:?} against the working directory: {}", base_dir, e);
                    base_dir.to_path_buf()
                }
            }
        };
        let source_dir = match config.source.as_str() {
            "" | "." => base_dir.clone(),
            source => base_dir.join(source),
        };
        let dest_dir = source_dir.join(&config.destination);
        let layouts_dir = source_dir.join(&config.layouts_dir);
        let includes_dir = source_dir.join(&config.includes_dir);

        Self {
            config,
            base_dir,
            source_dir,
            dest_dir,
            layouts_dir,
            includes_dir,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.base_dir.join(Self::CONFIG_FILE)
    }

    /// Render the whole site
    pub fn build(&self) -> Result<generator::BuildReport> {
        commands::build::run(self)
    }

    /// Remove the output directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_site_paths() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("_config.yml"),
            "title: Blog\nsource: content\ndestination: public\n",
        )
        .unwrap();

        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.config.title, "Blog");
        assert_eq!(site.source_dir, dir.path().join("content"));
        assert_eq!(site.dest_dir, dir.path().join("content/public"));
        assert_eq!(site.layouts_dir, dir.path().join("content/_layouts"));
        assert_eq!(site.config_path(), dir.path().join("_config.yml"));
    }

    #[test]
    fn test_relative_base_dir_is_absolute() {
        let site = Site::with_config("blog", config::SiteConfig::default());
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(site.base_dir, cwd.join("blog"));
        assert_eq!(site.dest_dir, cwd.join("blog/_site"));
    }

    #[test]
    fn test_site_without_config() {
        let dir = tempfile::tempdir().unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.source_dir, dir.path());
        assert_eq!(site.dest_dir, dir.path().join("_site"));
    }
}
