//! Layout templates using the Tera template engine
//!
//! The `default`, `post` and `page` layouts are embedded in the binary. A
//! site's `_layouts/<name>.html` files add to or replace them, and
//! `_includes/<file>` become partials named `includes/<file>`.

use anyhow::{anyhow, Context as _, Result};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use tera::{Context, Tera};
use walkdir::WalkDir;

use crate::config::SiteConfig;
use crate::helpers::{absolute_url, relative_url, strip_html, truncate_chars};
use crate::Site;

/// Built-in layouts, overridable by name
const BUILTIN_LAYOUTS: &[(&str, &str)] = &[
    ("default", include_str!("builtin/default.html")),
    ("post", include_str!("builtin/post.html")),
    ("page", include_str!("builtin/page.html")),
];

/// The named templates available to a build
pub struct LayoutSet {
    tera: Tera,
    names: Vec<String>,
}

impl LayoutSet {
    /// Only the built-in layouts
    pub fn builtin(config: &SiteConfig) -> Result<Self> {
        Self::with_layouts(config, Vec::new(), Vec::new())
    }

    /// Built-in layouts plus the site's `_layouts` and `_includes`
    pub fn load(site: &Site) -> Result<Self> {
        let layouts = read_templates(&site.layouts_dir, true)?;
        let includes = read_templates(&site.includes_dir, false)?;

        tracing::debug!(
            "Loaded {} layouts and {} includes",
            layouts.len(),
            includes.len()
        );

        Self::with_layouts(&site.config, layouts, includes)
    }

    /// Built-in layouts plus the given (name, source) layouts and includes
    pub fn with_layouts(
        config: &SiteConfig,
        layouts: Vec<(String, String)>,
        includes: Vec<(String, String)>,
    ) -> Result<Self> {
        let mut templates: BTreeMap<String, String> = BUILTIN_LAYOUTS
            .iter()
            .map(|(name, source)| (name.to_string(), source.to_string()))
            .collect();

        for (name, source) in layouts {
            if templates.contains_key(&name) {
                tracing::debug!("Layout {:?} overrides the built-in one", name);
            }
            templates.insert(name, source);
        }

        let names: Vec<String> = templates.keys().cloned().collect();

        for (name, source) in includes {
            templates.insert(format!("includes/{}", name), source);
        }

        let mut tera = Tera::default();

        // Layouts bind pre-rendered HTML, so nothing is escaped implicitly;
        // templates opt in with `| escape`
        tera.autoescape_on(vec![]);

        // All at once so `{% extends %}` can resolve in any order
        tera.add_raw_templates(templates.iter().map(|(n, s)| (n.as_str(), s.as_str())))
            .map_err(|e| anyhow!("Invalid layout: {}", crate::content::describe_tera_error(&e)))?;

        // Register custom filters
        let filter_config = config.clone();
        tera.register_filter(
            "relative_url",
            move |value: &tera::Value, _: &HashMap<String, tera::Value>| -> tera::Result<tera::Value> {
                let s = tera::try_get_value!("relative_url", "value", String, value);
                Ok(tera::Value::String(relative_url(&filter_config, &s)))
            },
        );
        let filter_config = config.clone();
        tera.register_filter(
            "absolute_url",
            move |value: &tera::Value, _: &HashMap<String, tera::Value>| -> tera::Result<tera::Value> {
                let s = tera::try_get_value!("absolute_url", "value", String, value);
                Ok(tera::Value::String(absolute_url(&filter_config, &s)))
            },
        );
        tera.register_filter("strip_html", strip_html_filter);
        tera.register_filter("truncate_chars", truncate_chars_filter);
        tera.register_filter("date_format", date_format_filter);

        Ok(Self { tera, names })
    }

    /// Whether a layout with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Layout names in sorted order (includes are not layouts)
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Render a layout with given context
    pub fn render(&self, layout: &str, context: &Context) -> tera::Result<String> {
        self.tera.render(layout, context)
    }
}

/// Read every template file under `dir`.
///
/// Layouts are keyed by file stem (`post.html` -> `post`); includes keep
/// their relative path.
fn read_templates(dir: &Path, strip_extension: bool) -> Result<Vec<(String, String)>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut templates = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to read {:?}", dir))?;
        let path = entry.path();
        if !entry.file_type().is_file()
            || entry.file_name().to_string_lossy().starts_with('.')
        {
            continue;
        }

        let relative = path.strip_prefix(dir)?;
        let name = if strip_extension {
            relative.with_extension("")
        } else {
            relative.to_path_buf()
        };
        let name = name.to_string_lossy().replace('\\', "/");

        let source =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        templates.push((name, source));
    }

    Ok(templates)
}

/// Tera filter: strip HTML tags
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    Ok(tera::Value::String(strip_html(&s)))
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "...".to_string(),
    };

    Ok(tera::Value::String(truncate_chars(&s, length, &omission)))
}

/// Tera filter: reformat a `YYYY-MM-DD[ HH:MM:SS]` date with a strftime pattern
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "%B %d, %Y".to_string(),
    };

    let date = chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S")
        .map(|dt| dt.date())
        .or_else(|_| chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d"));

    let date = match date {
        Ok(date) => date,
        // Not a date we produced; leave it alone
        Err(_) => return Ok(tera::Value::String(s)),
    };

    let mut out = String::new();
    write!(out, "{}", date.format(&format))
        .map_err(|_| tera::Error::msg(format!("Invalid date format {:?}", format)))?;
    Ok(tera::Value::String(out))
}

// Data structures for template context

/// `page.*` in layouts
#[derive(Debug, Clone, Serialize)]
pub struct PageData {
    pub title: String,
    pub subtitle: Option<String>,
    /// Byline: document author, else the site author
    pub author: Option<String>,
    /// First hero image
    pub cover_img: Option<String>,
    pub cover_imgs: Vec<String>,
    pub tags: Vec<String>,
    /// `YYYY-MM-DD HH:MM:SS`
    pub date: Option<String>,
    pub layout: String,
    pub url: String,
    pub source: String,
    pub excerpt: Option<String>,
    pub toc: String,
    pub extra: IndexMap<String, serde_yaml::Value>,
}

/// `site.*` in layouts
#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub author: String,
    pub lang: String,
    pub url: String,
    pub baseurl: String,
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl SiteData {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            description: config.description.clone(),
            author: config.author.clone(),
            lang: config.lang.clone(),
            url: config.url.clone(),
            baseurl: config.baseurl.clone(),
            extra: config.extra.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(title: &str) -> Context {
        let mut context = Context::new();
        context.insert("site", &SiteData::from_config(&SiteConfig::default()));
        context.insert(
            "page",
            &PageData {
                title: title.to_string(),
                subtitle: None,
                author: None,
                cover_img: Some("/img/cover.png".to_string()),
                cover_imgs: vec!["/img/cover.png".to_string()],
                tags: vec!["rust".to_string()],
                date: Some("2024-01-15 00:00:00".to_string()),
                layout: "post".to_string(),
                url: "/2024/01/15/x/".to_string(),
                source: "_posts/2024-01-15-x.md".to_string(),
                excerpt: None,
                toc: String::new(),
                extra: IndexMap::new(),
            },
        );
        context.insert("content", "<p>body</p>");
        context
    }

    #[test]
    fn test_builtin_layouts() {
        let layouts = LayoutSet::builtin(&SiteConfig::default()).unwrap();
        assert_eq!(layouts.names(), ["default", "page", "post"]);
        assert!(layouts.contains("post"));
        assert!(!layouts.contains("includes/head.html"));

        let html = layouts.render("post", &context("Title Here")).unwrap();
        assert!(html.contains(r#"<h1 class="post-title">Title Here</h1>"#));
        assert!(html.contains("<title>Title Here</title>"));
        assert!(html.contains("<p>body</p>"));
        assert!(html.contains("January 15, 2024"));
        assert!(html.contains(r#"<span class="tag">rust</span>"#));
        assert!(html.contains("url('/img/cover.png')"));
    }

    #[test]
    fn test_site_layout_overrides_and_extends() {
        let layouts = LayoutSet::with_layouts(
            &SiteConfig::default(),
            vec![
                (
                    "post".to_string(),
                    r#"{% extends "base" %}{% block body %}<h1>{{ page.title }}</h1>{{ content }}{% endblock body %}"#
                        .to_string(),
                ),
                (
                    "base".to_string(),
                    r#"<html>{% include "includes/nav.html" %}{% block body %}{% endblock body %}</html>"#
                        .to_string(),
                ),
            ],
            vec![("nav.html".to_string(), "<nav>nav</nav>".to_string())],
        )
        .unwrap();

        assert!(layouts.contains("base"));
        let html = layouts.render("post", &context("Custom")).unwrap();
        assert_eq!(html, "<html><nav>nav</nav><h1>Custom</h1><p>body</p></html>");
    }

    #[test]
    fn test_invalid_layout_is_rejected() {
        let result = LayoutSet::with_layouts(
            &SiteConfig::default(),
            vec![("broken".to_string(), "{% if %}".to_string())],
            Vec::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_site() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("_layouts")).unwrap();
        fs::create_dir_all(dir.path().join("_includes/partials")).unwrap();
        fs::write(
            dir.path().join("_layouts/minimal.html"),
            r#"{% include "includes/partials/head.html" %}{{ content }}"#,
        )
        .unwrap();
        fs::write(dir.path().join("_includes/partials/head.html"), "<head></head>").unwrap();

        let site = Site::with_config(dir.path(), SiteConfig::default());
        let layouts = LayoutSet::load(&site).unwrap();
        assert!(layouts.contains("minimal"));

        let html = layouts.render("minimal", &context("x")).unwrap();
        assert_eq!(html, "<head></head><p>body</p>");
    }

    #[test]
    fn test_filters() {
        let config = SiteConfig {
            url: "https://example.com".to_string(),
            baseurl: "/blog".to_string(),
            ..SiteConfig::default()
        };
        let layouts = LayoutSet::with_layouts(
            &config,
            vec![(
                "f".to_string(),
                r#"{{ "/a b/" | relative_url }}|{{ "/x/" | absolute_url }}|{{ content | strip_html }}|{{ "abcdef" | truncate_chars(length=3) }}|{{ "2023-05-30" | date_format(format="%Y/%m") }}"#
                    .to_string(),
            )],
            Vec::new(),
        )
        .unwrap();

        let html = layouts.render("f", &context("x")).unwrap();
        assert_eq!(
            html,
            "/blog/a%20b/|https://example.com/blog/x/|body|abc...|2023/05"
        );
    }
}
