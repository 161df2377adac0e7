//! Document -> HTML page

use std::path::PathBuf;
use tera::Context;

use crate::config::SiteConfig;
use crate::content::{
    describe_tera_error, permalink, toc_html, Document, MarkdownRenderer, RenderError,
};
use crate::templates::{LayoutSet, PageData, SiteData};

/// A rendered page, not yet written
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub source: PathBuf,
    pub url: String,
    /// Relative to the destination directory
    pub output: PathBuf,
    pub html: String,
}

/// Binds a document into its layout.
///
/// Holds only read-only state, so one instance is shared by every worker.
pub struct Renderer {
    markdown: MarkdownRenderer,
    site: SiteData,
    config: SiteConfig,
}

impl Renderer {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            markdown: MarkdownRenderer::with_options(&config.highlight),
            site: SiteData::from_config(config),
            config: config.clone(),
        }
    }

    /// Render one document through the layout it names
    pub fn render(&self, doc: &Document, layouts: &LayoutSet) -> Result<RenderedPage, RenderError> {
        let layout = doc
            .layout()
            .or(self.config.default_layout.as_deref())
            .ok_or_else(|| {
                RenderError::malformed(
                    &doc.source,
                    "no `layout` declared and no `default_layout` configured",
                )
            })?;

        if !layouts.contains(layout) {
            return Err(RenderError::UnknownLayout {
                document: doc.source.clone(),
                layout: layout.to_string(),
            });
        }

        let body = self.markdown.render(&doc.body);
        let excerpt = MarkdownRenderer::split_excerpt(&doc.body, &self.config.excerpt_separator)
            .map(|markdown| self.markdown.render(markdown).html);

        let url = permalink::url_for(doc, &self.config.permalink);
        let output = permalink::output_path(&url).ok_or_else(|| {
            RenderError::malformed(
                &doc.source,
                format!("permalink `{}` points outside the output directory", url),
            )
        })?;

        let page = PageData {
            title: doc.title().to_string(),
            subtitle: doc.front.subtitle.clone(),
            author: doc.front.author.clone().or_else(|| {
                Some(self.config.author.clone()).filter(|author| !author.is_empty())
            }),
            cover_img: doc.front.cover_img.first().cloned(),
            cover_imgs: doc.front.cover_img.clone(),
            tags: doc.front.tags.clone(),
            date: doc
                .date
                .map(|date| date.format("%Y-%m-%d %H:%M:%S").to_string()),
            layout: layout.to_string(),
            url: url.clone(),
            source: doc.source.to_string_lossy().replace('\\', "/"),
            excerpt,
            toc: toc_html(&body.toc),
            extra: doc.front.extra.clone(),
        };

        let mut context = Context::new();
        context.insert("site", &self.site);
        context.insert("page", &page);
        context.insert("content", &body.html);

        let html = layouts
            .render(layout, &context)
            .map_err(|e| RenderError::Template {
                document: doc.source.clone(),
                layout: layout.to_string(),
                message: describe_tera_error(&e),
            })?;

        Ok(RenderedPage {
            source: doc.source.clone(),
            url,
            output,
            html,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(source: &str, raw: &str) -> Result<RenderedPage, RenderError> {
        let config = SiteConfig {
            title: "Field Notes".to_string(),
            author: "Site Owner".to_string(),
            ..SiteConfig::default()
        };
        let layouts = LayoutSet::builtin(&config).unwrap();
        let doc = Document::parse(source, raw)?;
        Renderer::new(&config).render(&doc, &layouts)
    }

    #[test]
    fn test_scenario_bare_front_matter() {
        let page = render("hello.md", "layout: post\ntitle: X\n---\nHello **world**").unwrap();
        assert!(page.html.contains("<strong>world</strong>"));
        assert!(page.html.contains(r#"<h1 class="post-title">X</h1>"#));
        assert!(page.html.contains("<title>X | Field Notes</title>"));
        assert_eq!(page.url, "/hello/");
        assert_eq!(page.output, PathBuf::from("hello/index.html"));
    }

    #[test]
    fn test_metadata_round_trip() {
        let raw = "---\nlayout: post\ntitle: Inside the WAL\nsubtitle: How PostgreSQL survives crashes\n\
                   cover-img: /assets/img/wal.png\nauthor: Jane Doe\ntags: [postgres, wal]\n---\nBody";
        let page = render("_posts/2023-05-30-wal.md", raw).unwrap();
        assert!(page.html.contains(r#"<h1 class="post-title">Inside the WAL</h1>"#));
        assert!(page
            .html
            .contains(r#"<h2 class="post-subheading">How PostgreSQL survives crashes</h2>"#));
        assert!(page.html.contains(r#"<span class="byline">by Jane Doe</span>"#));
        assert!(page.html.contains("url('/assets/img/wal.png')"));
        assert!(page.html.contains(r#"<span class="tag">postgres</span>"#));
        assert!(page.html.contains("May 30, 2023"));
        assert_eq!(page.url, "/2023/05/30/wal/");
    }

    #[test]
    fn test_byline_falls_back_to_site_author() {
        let page = render("_posts/2023-05-30-a.md", "---\nlayout: post\n---\n").unwrap();
        assert!(page.html.contains(r#"<span class="byline">by Site Owner</span>"#));
    }

    #[test]
    fn test_deterministic_output() {
        let raw = "---\nlayout: post\ntitle: Same\nzeta: 1\nalpha: 2\n---\n## One\n\n## Two\n";
        let first = render("_posts/2024-01-01-same.md", raw).unwrap();
        let second = render("_posts/2024-01-01-same.md", raw).unwrap();
        assert_eq!(first.html, second.html);
    }

    #[test]
    fn test_unknown_layout() {
        let err = render("a.md", "---\nlayout: gallery\n---\n").unwrap_err();
        match err {
            RenderError::UnknownLayout { layout, .. } => assert_eq!(layout, "gallery"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_layout_without_default() {
        let err = render("a.md", "---\ntitle: No layout\n---\n").unwrap_err();
        assert!(matches!(err, RenderError::MalformedDocument { .. }));
    }

    #[test]
    fn test_default_layout_applies() {
        let config = SiteConfig {
            default_layout: Some("page".to_string()),
            ..SiteConfig::default()
        };
        let layouts = LayoutSet::builtin(&config).unwrap();
        let doc = Document::parse("about.md", "---\ntitle: About me\n---\nHi").unwrap();
        let page = Renderer::new(&config).render(&doc, &layouts).unwrap();
        assert!(page.html.contains(r#"<h1 class="page-title">About me</h1>"#));
    }

    #[test]
    fn test_permalink_outside_destination() {
        for permalink in ["/../../escaped/", "/../about.md"] {
            let raw = format!("---\nlayout: page\npermalink: {}\n---\n", permalink);
            let err = render("about.md", &raw).unwrap_err();
            assert!(matches!(err, RenderError::MalformedDocument { .. }));
        }
    }

    #[test]
    fn test_template_error() {
        let config = SiteConfig::default();
        let layouts = LayoutSet::with_layouts(
            &config,
            vec![("strict".to_string(), "{{ page.nope.deeper }}".to_string())],
            Vec::new(),
        )
        .unwrap();
        let doc = Document::parse("a.md", "---\nlayout: strict\n---\n").unwrap();
        let err = Renderer::new(&config).render(&doc, &layouts).unwrap_err();
        assert!(matches!(err, RenderError::Template { .. }));
    }

    #[test]
    fn test_extra_fields_and_toc_reach_template() {
        let config = SiteConfig::default();
        let layouts = LayoutSet::with_layouts(
            &config,
            vec![(
                "bare".to_string(),
                "{{ page.extra.readtime }}|{{ page.toc }}|{{ page.excerpt }}".to_string(),
            )],
            Vec::new(),
        )
        .unwrap();
        let raw = "---\nlayout: bare\nreadtime: 5 min\n---\nIntro\n\n<!-- more -->\n\n## Details\n";
        let doc = Document::parse("a.md", raw).unwrap();
        let page = Renderer::new(&config).render(&doc, &layouts).unwrap();
        assert!(page.html.starts_with("5 min|"));
        assert!(page.html.contains(r##"<a href="#details">Details</a>"##));
        assert!(page.html.ends_with("|<p>Intro</p>\n"));
    }
}
