//! Content loader - discovers documents and assets in the source directory

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use super::{Document, RenderError};
use crate::Site;

/// Files found in the source directory, relative to it, in sorted order
#[derive(Debug, Default)]
pub struct Discovered {
    pub documents: Vec<PathBuf>,
    pub assets: Vec<PathBuf>,
}

/// Loads content from the source directory
pub struct ContentLoader<'a> {
    site: &'a Site,
    excludes: Vec<glob::Pattern>,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(site: &'a Site) -> Result<Self> {
        let excludes = site
            .config
            .exclude
            .iter()
            .map(|pattern| {
                glob::Pattern::new(pattern)
                    .with_context(|| format!("Invalid exclude pattern {:?}", pattern))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { site, excludes })
    }

    /// Walk the source directory
    pub fn discover(&self) -> Result<Discovered> {
        let source_dir = &self.site.source_dir;
        if !source_dir.is_dir() {
            return Err(anyhow!("Source directory not found: {:?}", source_dir));
        }

        let mut found = Discovered::default();

        let walker = WalkDir::new(source_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| self.keep(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(source_dir)?.to_path_buf();
            let in_special_dir = relative
                .components()
                .next()
                .map(|c| c.as_os_str().to_string_lossy().starts_with('_'))
                .unwrap_or(false);

            if is_markdown_file(&relative) {
                found.documents.push(relative);
            } else if !in_special_dir {
                found.assets.push(relative);
            }
        }

        tracing::debug!(
            "Discovered {} documents and {} assets",
            found.documents.len(),
            found.assets.len()
        );

        Ok(found)
    }

    /// Read and parse one document
    pub fn load(&self, relative: &Path) -> Result<Document, RenderError> {
        let path = self.site.source_dir.join(relative);
        let raw = fs::read_to_string(&path).map_err(|e| RenderError::io(&path, e))?;
        Document::parse(relative, &raw)
    }

    /// Decide whether to descend into / include an entry
    fn keep(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }

        let path = entry.path();
        if path.starts_with(&self.site.dest_dir) {
            return false;
        }

        let name = entry.file_name().to_string_lossy();
        if name.starts_with('.') {
            return false;
        }

        if name.starts_with('_') {
            let is_content_dir = entry.depth() == 1
                && entry.file_type().is_dir()
                && (name == "_posts" || (name == "_drafts" && self.site.config.drafts));
            if !is_content_dir {
                return false;
            }
        }

        let relative = path.strip_prefix(&self.site.source_dir).unwrap_or(path);
        !self
            .excludes
            .iter()
            .any(|pattern| pattern.matches_path(relative) || pattern.matches(&name))
    }
}

/// Check if a file is a markdown file
pub fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("md") || e.eq_ignore_ascii_case("markdown"))
        .unwrap_or(false)
}
