//! Generator module - renders every document and copies assets
//!
//! Documents are independent: each is parsed, rendered and written on the
//! rayon pool, and a failure only costs that one page.

mod render;

pub use render::{RenderedPage, Renderer};

use anyhow::{Context as _, Result};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::content::loader::ContentLoader;
use crate::content::RenderError;
use crate::templates::LayoutSet;
use crate::Site;

/// Outcome of a build
#[derive(Debug, Default)]
pub struct BuildReport {
    /// (source, output) for every page written, relative paths
    pub rendered: Vec<(PathBuf, PathBuf)>,
    /// Unpublished documents left out of this build
    pub skipped: Vec<PathBuf>,
    /// Documents that produced no output
    pub failed: Vec<(PathBuf, RenderError)>,
    /// Number of static files copied
    pub assets: usize,
}

impl BuildReport {
    /// Whether every document rendered
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "{} pages rendered, {} skipped, {} failed, {} assets copied",
            self.rendered.len(),
            self.skipped.len(),
            self.failed.len(),
            self.assets
        )
    }
}

/// Static site generator
pub struct Generator<'a> {
    site: &'a Site,
    loader: ContentLoader<'a>,
    layouts: LayoutSet,
    renderer: Renderer,
}

impl<'a> Generator<'a> {
    /// Create a new generator
    pub fn new(site: &'a Site) -> Result<Self> {
        Ok(Self {
            site,
            loader: ContentLoader::new(site)?,
            layouts: LayoutSet::load(site)?,
            renderer: Renderer::new(&site.config),
        })
    }

    /// Generate the entire site
    pub fn generate(&self) -> Result<BuildReport> {
        let start = std::time::Instant::now();
        let dest_dir = &self.site.dest_dir;

        fs::create_dir_all(dest_dir)
            .with_context(|| format!("Failed to create {:?}", dest_dir))?;

        let found = self.loader.discover()?;
        let mut report = BuildReport::default();

        let outcomes: Vec<(PathBuf, Result<Option<RenderedPage>, RenderError>)> = found
            .documents
            .par_iter()
            .map(|relative| (relative.clone(), self.render_document(relative)))
            .collect();

        // Claim output paths in source order so collisions resolve the same way every time
        let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
        let mut pages = Vec::new();
        for (source, outcome) in outcomes {
            match outcome {
                Ok(Some(page)) => {
                    if let Some(other) = claimed.get(&page.output) {
                        let err = RenderError::OutputConflict {
                            document: source.clone(),
                            other: other.clone(),
                            output: page.output.clone(),
                        };
                        tracing::warn!("{}", err);
                        report.failed.push((source, err));
                    } else {
                        claimed.insert(page.output.clone(), source);
                        pages.push(page);
                    }
                }
                Ok(None) => report.skipped.push(source),
                Err(err) => {
                    tracing::warn!("{}", err);
                    report.failed.push((source, err));
                }
            }
        }

        let written: Vec<(PathBuf, Result<PathBuf, RenderError>)> = pages
            .into_par_iter()
            .map(|page| {
                let result = self.write_page(&page).map(|_| page.output);
                (page.source, result)
            })
            .collect();

        for (source, result) in written {
            match result {
                Ok(output) => report.rendered.push((source, output)),
                Err(err) => {
                    tracing::warn!("{}", err);
                    report.failed.push((source, err));
                }
            }
        }

        // Pages keep their output; a static file at the same path is reported
        let mut assets = Vec::new();
        for asset in found.assets {
            match claimed.get(&asset) {
                Some(page) => {
                    let err = RenderError::OutputConflict {
                        document: asset.clone(),
                        other: page.clone(),
                        output: asset.clone(),
                    };
                    tracing::warn!("{}", err);
                    report.failed.push((asset, err));
                }
                None => assets.push(asset),
            }
        }

        report.assets = self.copy_assets(&assets)?;

        tracing::info!(
            "{} in {:.2}s",
            report.summary(),
            start.elapsed().as_secs_f64()
        );

        Ok(report)
    }

    /// Parse and render one document; `None` when it is unpublished
    fn render_document(&self, relative: &Path) -> Result<Option<RenderedPage>, RenderError> {
        let doc = self.loader.load(relative)?;

        if !doc.is_published() && !self.site.config.drafts {
            tracing::debug!("Skipping unpublished {:?}", relative);
            return Ok(None);
        }

        let page = self.renderer.render(&doc, &self.layouts)?;
        tracing::debug!("Rendered {:?} -> {}", relative, page.url);
        Ok(Some(page))
    }

    /// Write a rendered page under the destination directory
    fn write_page(&self, page: &RenderedPage) -> Result<(), RenderError> {
        let output_path = self.site.dest_dir.join(&page.output);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent).map_err(|e| RenderError::io(parent, e))?;
        }
        fs::write(&output_path, &page.html).map_err(|e| RenderError::io(&output_path, e))?;
        Ok(())
    }

    /// Copy static files to the destination directory
    fn copy_assets(&self, assets: &[PathBuf]) -> Result<usize> {
        assets.par_iter().try_for_each(|relative| -> Result<()> {
            let source = self.site.source_dir.join(relative);
            let dest = self.site.dest_dir.join(relative);

            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {:?}", parent))?;
            }

            fs::copy(&source, &dest)
                .with_context(|| format!("Failed to copy {:?} to {:?}", source, dest))?;
            tracing::debug!("Copied: {:?} -> {:?}", source, dest);
            Ok(())
        })?;

        Ok(assets.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn sample_site(root: &Path) {
        write(
            root,
            "_posts/2023-05-30-postgres-wal.md",
            "---\nlayout: post\ntitle: Inside the WAL\ntags: [postgres]\n---\n# WAL\n\nHello **world**\n",
        );
        write(
            root,
            "_posts/2023-06-01-broken.md",
            "---\nlayout: post\ntitle: never closed\n",
        );
        write(
            root,
            "_posts/2023-06-02-gallery.md",
            "---\nlayout: gallery\ntitle: Pictures\n---\n",
        );
        write(
            root,
            "_posts/2023-06-03-wip.md",
            "---\nlayout: post\npublished: false\n---\n",
        );
        write(root, "aboutme.md", "layout: page\ntitle: About me\n---\nHi!\n");
        write(root, "plain.md", "No metadata here.\n");
        write(root, "assets/css/main.css", "body {}");
    }

    #[test]
    fn test_generate_isolates_failures() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        sample_site(root);

        let site = Site::with_config(root, SiteConfig::default());
        let report = Generator::new(&site).unwrap().generate().unwrap();

        let dest = root.join("_site");
        let post = fs::read_to_string(dest.join("2023/05/30/postgres-wal/index.html")).unwrap();
        assert!(post.contains("<strong>world</strong>"));
        assert!(post.contains(r#"<h1 class="post-title">Inside the WAL</h1>"#));

        let about = fs::read_to_string(dest.join("aboutme/index.html")).unwrap();
        assert!(about.contains(r#"<h1 class="page-title">About me</h1>"#));

        assert!(dest.join("assets/css/main.css").exists());
        assert!(!dest.join("2023/06/01/broken").exists());
        assert!(!dest.join("2023/06/02/gallery").exists());
        assert!(!dest.join("2023/06/03/wip").exists());
        assert!(!dest.join("plain").exists());

        assert_eq!(report.rendered.len(), 2);
        assert_eq!(report.skipped, vec![PathBuf::from("_posts/2023-06-03-wip.md")]);
        assert_eq!(report.assets, 1);
        assert!(!report.is_success());

        let kinds: Vec<(String, &str)> = report
            .failed
            .iter()
            .map(|(source, err)| (source.to_string_lossy().to_string(), err.kind()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("_posts/2023-06-01-broken.md".to_string(), "malformed"),
                ("_posts/2023-06-02-gallery.md".to_string(), "unknown-layout"),
                ("plain.md".to_string(), "malformed"),
            ]
        );
    }

    #[test]
    fn test_generate_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        sample_site(root);
        let site = Site::with_config(root, SiteConfig::default());
        let output = root.join("_site/2023/05/30/postgres-wal/index.html");

        Generator::new(&site).unwrap().generate().unwrap();
        let first = fs::read(&output).unwrap();
        Generator::new(&site).unwrap().generate().unwrap();
        let second = fs::read(&output).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_drafts_rendered_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "_drafts/2024-02-02-idea.md", "---\nlayout: post\ntitle: Idea\n---\n");

        let config = SiteConfig {
            drafts: true,
            ..SiteConfig::default()
        };
        let site = Site::with_config(root, config);
        let report = Generator::new(&site).unwrap().generate().unwrap();

        assert!(report.is_success());
        assert!(root.join("_site/2024/02/02/idea/index.html").exists());
    }

    #[test]
    fn test_output_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "a.md", "---\nlayout: page\npermalink: /same/\n---\nfirst");
        write(root, "b.md", "---\nlayout: page\npermalink: /same/\n---\nsecond");

        let site = Site::with_config(root, SiteConfig::default());
        let report = Generator::new(&site).unwrap().generate().unwrap();

        assert_eq!(report.rendered.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, PathBuf::from("b.md"));
        assert_eq!(report.failed[0].1.kind(), "conflict");

        let html = fs::read_to_string(root.join("_site/same/index.html")).unwrap();
        assert!(html.contains("first"));
    }

    #[test]
    fn test_asset_does_not_replace_page() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "index.md", "---\nlayout: page\ntitle: Home\n---\nrendered");
        write(root, "index.html", "raw asset");
        write(root, "logo.svg", "<svg/>");

        let site = Site::with_config(root, SiteConfig::default());
        let report = Generator::new(&site).unwrap().generate().unwrap();

        let html = fs::read_to_string(root.join("_site/index.html")).unwrap();
        assert!(html.contains("rendered"));
        assert!(!html.contains("raw asset"));
        assert_eq!(report.assets, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, PathBuf::from("index.html"));
        assert_eq!(report.failed[0].1.kind(), "conflict");
    }

    #[test]
    fn test_permalink_cannot_escape_destination() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("site");
        write(&root, "a.md", "---\nlayout: page\npermalink: /../../escaped/\n---\nx");
        write(&root, "about.md", "---\nlayout: page\npermalink: /../about.md\n---\nx");

        let site = Site::with_config(&root, SiteConfig::default());
        let report = Generator::new(&site).unwrap().generate().unwrap();

        assert!(report.rendered.is_empty());
        assert_eq!(report.failed.len(), 2);
        assert!(report.failed.iter().all(|(_, err)| err.kind() == "malformed"));
        assert!(!dir.path().join("escaped").exists());
        assert_eq!(
            fs::read_to_string(root.join("about.md")).unwrap(),
            "---\nlayout: page\npermalink: /../about.md\n---\nx"
        );
    }

    #[test]
    fn test_site_layouts_are_used() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "_layouts/post.html", "<article>{{ page.title }}: {{ content }}</article>");
        write(root, "_posts/2024-03-03-custom.md", "---\nlayout: post\ntitle: Custom\n---\nText");

        let site = Site::with_config(root, SiteConfig::default());
        Generator::new(&site).unwrap().generate().unwrap();

        let html = fs::read_to_string(root.join("_site/2024/03/03/custom/index.html")).unwrap();
        assert_eq!(html, "<article>Custom: <p>Text</p>\n</article>");
    }

    #[test]
    fn test_summary() {
        let report = BuildReport {
            assets: 3,
            ..Default::default()
        };
        assert_eq!(
            report.summary(),
            "0 pages rendered, 0 skipped, 0 failed, 3 assets copied"
        );
        assert!(report.is_success());
    }
}
