//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use crate::config::SiteConfig;

/// Characters escaped in URL paths; `%` is left alone so encoded input stays stable
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Whether a reference points outside the site
pub fn is_external(path: &str) -> bool {
    path.starts_with("http://")
        || path.starts_with("https://")
        || path.starts_with("//")
        || path.starts_with("mailto:")
        || path.starts_with("data:")
        || path.starts_with('#')
}

/// Prefix a site path with `baseurl`
///
/// # Examples
/// ```ignore
/// relative_url(&config, "/css/style.css") // -> "/blog/css/style.css"
/// ```
pub fn relative_url(config: &SiteConfig, path: &str) -> String {
    if is_external(path) {
        return path.to_string();
    }

    let root = config.baseurl.trim_matches('/');
    let path = encode_path(path.trim_start_matches('/'));

    match (root.is_empty(), path.is_empty()) {
        (true, _) => format!("/{}", path),
        (false, true) => format!("/{}/", root),
        (false, false) => format!("/{}/{}", root, path),
    }
}

/// Generate a full URL including the domain
///
/// # Examples
/// ```ignore
/// absolute_url(&config, "/about/") // -> "https://example.com/blog/about/"
/// ```
pub fn absolute_url(config: &SiteConfig, path: &str) -> String {
    if is_external(path) {
        return path.to_string();
    }

    format!(
        "{}{}",
        config.url.trim_end_matches('/'),
        relative_url(config, path)
    )
}

/// Percent-encode the unsafe characters of a URL path
pub fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, PATH).to_string()
}
