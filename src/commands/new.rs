//! Create a new post or page

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use std::fs;
use std::path::PathBuf;

use crate::Site;

const SCAFFOLD_DIR: &str = "_scaffolds";

/// Create a new document and return its path.
///
/// Posts go to `_posts/YYYY-MM-DD-<slug>.md`; any other layout creates
/// `<slug>.md` at the top of the source directory unless `path` says otherwise.
pub fn create_document(
    site: &Site,
    title: &str,
    layout: &str,
    path: Option<&str>,
    now: NaiveDateTime,
) -> Result<PathBuf> {
    let slug = slug::slugify(title);
    if slug.is_empty() && path.is_none() {
        bail!("Cannot derive a file name from title {:?}", title);
    }

    let relative = match path {
        Some(p) if p.ends_with(".md") || p.ends_with(".markdown") => PathBuf::from(p),
        Some(p) => PathBuf::from(format!("{}.md", p)),
        None if layout == "post" => {
            PathBuf::from("_posts").join(format!("{}-{}.md", now.format("%Y-%m-%d"), slug))
        }
        None => PathBuf::from(format!("{}.md", slug)),
    };
    let file_path = site.source_dir.join(relative);

    if file_path.exists() {
        bail!("File already exists: {:?}", file_path);
    }

    // Site scaffold, if any
    let scaffold_path = site
        .source_dir
        .join(SCAFFOLD_DIR)
        .join(format!("{}.md", layout));
    let scaffold = if scaffold_path.exists() {
        fs::read_to_string(&scaffold_path)
            .with_context(|| format!("Failed to read scaffold {:?}", scaffold_path))?
    } else {
        default_scaffold(layout)
    };

    let content = scaffold
        .replace("{{ layout }}", layout)
        .replace("{{ title }}", &yaml_string(title))
        .replace("{{ date }}", &now.format("%Y-%m-%d %H:%M:%S").to_string());

    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)
        .with_context(|| format!("Failed to write {:?}", file_path))?;

    Ok(file_path)
}

fn default_scaffold(layout: &str) -> String {
    let mut scaffold = String::from("---\nlayout: {{ layout }}\ntitle: {{ title }}\n");
    if layout == "post" {
        scaffold.push_str("date: {{ date }}\ntags: []\n");
    }
    scaffold.push_str("---\n");
    scaffold
}

/// Quote a title when plain YAML would misread it
fn yaml_string(value: &str) -> String {
    let plain = !value.is_empty()
        && !value.starts_with(|c: char| "!&*-?[]{}|>'\"%@`#,".contains(c) || c.is_whitespace())
        && !value.contains(": ")
        && !value.contains(" #")
        && !value.ends_with(':');

    if plain {
        value.to_string()
    } else {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

/// Run the new command
pub fn run(site: &Site, title: &str, layout: Option<&str>, path: Option<&str>) -> Result<()> {
    let layout = layout
        .or(site.config.default_layout.as_deref())
        .unwrap_or("post");
    let now = chrono::Local::now().naive_local();

    let file_path = create_document(site, title, layout, path, now)?;
    println!("Created: {:?}", file_path);

    Ok(())
}
