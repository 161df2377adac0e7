//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,
    pub lang: String,

    // URL
    pub url: String,
    pub baseurl: String,
    pub permalink: String,

    // Directory
    pub source: String,
    pub destination: String,
    pub layouts_dir: String,
    pub includes_dir: String,
    pub exclude: Vec<String>,

    // Writing
    pub default_layout: Option<String>,
    pub drafts: bool,
    pub excerpt_separator: String,
    pub highlight: HighlightConfig,

    // Build policy
    pub strict: bool,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            author: String::new(),
            lang: "en".to_string(),

            url: String::new(),
            baseurl: String::new(),
            permalink: "/:year/:month/:day/:title/".to_string(),

            source: ".".to_string(),
            destination: "_site".to_string(),
            layouts_dir: "_layouts".to_string(),
            includes_dir: "_includes".to_string(),
            exclude: vec![
                "README.md".to_string(),
                "LICENSE*".to_string(),
                "CHANGELOG.md".to_string(),
                "Gemfile*".to_string(),
                "node_modules".to_string(),
                "vendor".to_string(),
            ],

            default_layout: None,
            drafts: false,
            excerpt_separator: "<!-- more -->".to_string(),
            highlight: HighlightConfig::default(),

            strict: false,

            extra: IndexMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;

        // An empty file is a valid, all-defaults configuration
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {:?}", path))?;
        Ok(config)
    }
}

/// Code highlighting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Turn syntect highlighting off to emit plain `<pre><code>` blocks
    pub enable: bool,
    pub theme: String,
    pub line_numbers: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enable: true,
            theme: "base16-ocean.dark".to_string(),
            line_numbers: false,
        }
    }
}
