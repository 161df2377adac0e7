//! URL and output path resolution

use std::path::{Component, Path, PathBuf};

use super::{Document, DocumentKind};

/// Resolve the URL of a document (always starts with `/`)
pub fn url_for(doc: &Document, pattern: &str) -> String {
    if let Some(permalink) = &doc.front.permalink {
        return format!("/{}", permalink.trim().trim_start_matches('/'));
    }

    match (doc.kind, doc.date) {
        (DocumentKind::Post | DocumentKind::Draft, Some(date)) => {
            let result = pattern
                .replace(":year", &date.format("%Y").to_string())
                .replace(":i_month", &date.format("%-m").to_string())
                .replace(":month", &date.format("%m").to_string())
                .replace(":i_day", &date.format("%-d").to_string())
                .replace(":day", &date.format("%d").to_string())
                .replace(":hour", &date.format("%H").to_string())
                .replace(":minute", &date.format("%M").to_string())
                .replace(":second", &date.format("%S").to_string())
                .replace(":title", &doc.slug)
                .replace(":slug", &slug::slugify(&doc.slug));

            format!("/{}", result.trim_start_matches('/'))
        }
        // Posts and drafts without a usable filename date live at their slug
        (DocumentKind::Post | DocumentKind::Draft, None) => format!("/{}/", doc.slug),
        (DocumentKind::Page, _) => page_url(&doc.source),
    }
}

/// URL for a page: `about.md` -> `/about/`, `docs/index.md` -> `/docs/`
fn page_url(source: &Path) -> String {
    let without_ext = source.with_extension("");
    let path = without_ext.to_string_lossy().replace('\\', "/");

    if path == "index" {
        "/".to_string()
    } else if let Some(dir) = path.strip_suffix("/index") {
        format!("/{}/", dir)
    } else {
        format!("/{}/", path)
    }
}

/// Output file for a URL, relative to the destination directory.
///
/// Directory-style URLs get an `index.html`; extension-less file URLs get
/// `.html` appended. Returns `None` when the URL would leave the directory.
pub fn output_path(url: &str) -> Option<PathBuf> {
    let trimmed = url.trim_start_matches('/');
    if Path::new(trimmed)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        return None;
    }

    if trimmed.is_empty() || url.ends_with('/') {
        return Some(Path::new(trimmed).join("index.html"));
    }

    let path = PathBuf::from(trimmed);
    if path.extension().is_some() {
        Some(path)
    } else {
        Some(path.with_extension("html"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATTERN: &str = "/:year/:month/:day/:title/";

    fn doc(source: &str, front: &str) -> Document {
        Document::parse(source, &format!("---\nlayout: post\n{}---\n", front)).unwrap()
    }

    #[test]
    fn test_post_url() {
        let d = doc("_posts/2023-05-07-postgres-wal.md", "");
        assert_eq!(url_for(&d, PATTERN), "/2023/05/07/postgres-wal/");
        assert_eq!(url_for(&d, ":year/:i_month/:i_day/:title.html"), "/2023/5/7/postgres-wal.html");
    }

    #[test]
    fn test_page_url() {
        assert_eq!(url_for(&doc("aboutme.md", ""), PATTERN), "/aboutme/");
        assert_eq!(url_for(&doc("index.md", ""), PATTERN), "/");
        assert_eq!(url_for(&doc("docs/index.md", ""), PATTERN), "/docs/");
        assert_eq!(url_for(&doc("docs/setup.markdown", ""), PATTERN), "/docs/setup/");
    }

    #[test]
    fn test_explicit_permalink() {
        let d = doc("_posts/2023-05-07-wal.md", "permalink: /wal-internals/\n");
        assert_eq!(url_for(&d, PATTERN), "/wal-internals/");
    }

    #[test]
    fn test_undated_post_uses_slug() {
        assert_eq!(url_for(&doc("_posts/notes.md", ""), PATTERN), "/notes/");
        assert_eq!(url_for(&doc("_drafts/idea.md", ""), PATTERN), "/idea/");
        assert_eq!(url_for(&doc("_posts/2024-13-45-x.md", ""), PATTERN), "/x/");
    }

    #[test]
    fn test_output_path() {
        assert_eq!(output_path("/"), Some(PathBuf::from("index.html")));
        assert_eq!(output_path("/aboutme/"), Some(PathBuf::from("aboutme/index.html")));
        assert_eq!(output_path("/feed.xml"), Some(PathBuf::from("feed.xml")));
        assert_eq!(output_path("/about"), Some(PathBuf::from("about.html")));
    }

    #[test]
    fn test_output_path_stays_in_destination() {
        assert_eq!(output_path("/../../escaped/"), None);
        assert_eq!(output_path("/../about.md"), None);
        assert_eq!(output_path("/a/../../b/"), None);
    }
}
