//! Document model

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Component, Path, PathBuf};

use super::{FrontMatter, RenderError};

lazy_static! {
    /// `2024-01-15-my-post` -> date and slug
    static ref DATED_NAME: Regex = Regex::new(r"^(\d{4})-(\d{2})-(\d{2})-(.+)$").unwrap();
}

/// Where a document lives in the source tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Under `_posts/`
    Post,
    /// Under `_drafts/`
    Draft,
    /// Anywhere else
    Page,
}

impl DocumentKind {
    /// Classify a path relative to the source directory
    pub fn of(source: &Path) -> Self {
        match source.components().next() {
            Some(Component::Normal(first)) if first == "_posts" => Self::Post,
            Some(Component::Normal(first)) if first == "_drafts" => Self::Draft,
            _ => Self::Page,
        }
    }
}

/// One content entry: front matter plus Markdown body
#[derive(Debug, Clone)]
pub struct Document {
    /// Path relative to the source directory
    pub source: PathBuf,
    pub kind: DocumentKind,
    pub front: FrontMatter,
    /// Raw Markdown after the metadata block
    pub body: String,
    /// URL-friendly name taken from the file name
    pub slug: String,
    /// Publication date, from front matter or a dated file name
    pub date: Option<NaiveDateTime>,
}

impl Document {
    /// Parse a raw file into a document
    pub fn parse(source: impl Into<PathBuf>, raw: &str) -> Result<Self, RenderError> {
        let source = source.into();
        let (front, body) =
            FrontMatter::parse(raw).map_err(|reason| RenderError::malformed(&source, reason))?;

        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled")
            .to_string();

        let (name_date, slug) = match DATED_NAME.captures(&stem) {
            Some(caps) => {
                let date = NaiveDate::from_ymd_opt(
                    caps[1].parse().unwrap_or(0),
                    caps[2].parse().unwrap_or(0),
                    caps[3].parse().unwrap_or(0),
                )
                .and_then(|d| d.and_hms_opt(0, 0, 0));
                (date, caps[4].to_string())
            }
            None => (None, stem),
        };

        let date = match front.date.as_deref() {
            Some(raw_date) => Some(parse_date_string(raw_date).ok_or_else(|| {
                RenderError::malformed(&source, format!("unrecognized date `{}`", raw_date))
            })?),
            None => name_date,
        };

        Ok(Self {
            kind: DocumentKind::of(&source),
            source,
            body: body.to_string(),
            front,
            slug,
            date,
        })
    }

    /// Layout named by the document, if any
    pub fn layout(&self) -> Option<&str> {
        self.front.layout.as_deref()
    }

    /// Title from front matter, falling back to the slug
    pub fn title(&self) -> &str {
        self.front.title.as_deref().unwrap_or(&self.slug)
    }

    /// Whether the document belongs in a default (non-draft) build
    pub fn is_published(&self) -> bool {
        self.front.published && self.kind != DocumentKind::Draft
    }
}

/// Parse a date string in the formats front matter commonly uses
fn parse_date_string(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    let formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];

    for fmt in formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    // RFC 3339 and `2024-01-15 10:30:00 +0800`; keep the wall-clock time
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.naive_local());
    }

    None
}
