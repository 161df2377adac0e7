//! List site content

use anyhow::{bail, Result};
use std::collections::BTreeMap;

use crate::content::loader::ContentLoader;
use crate::content::{Document, DocumentKind};
use crate::templates::LayoutSet;
use crate::Site;

/// List site content by type
pub fn run(site: &Site, content_type: &str) -> Result<()> {
    let (heading, lines) = collect(site, content_type)?;
    println!("{} ({}):", heading, lines.len());
    for line in lines {
        println!("  {}", line);
    }
    Ok(())
}

/// Heading and one line per entry
fn collect(site: &Site, content_type: &str) -> Result<(&'static str, Vec<String>)> {
    match content_type {
        "post" | "posts" => {
            let lines = load_documents(site)?
                .iter()
                .filter(|doc| doc.kind != DocumentKind::Page)
                .map(|doc| {
                    let date = doc
                        .date
                        .map(|d| d.format("%Y-%m-%d").to_string())
                        .unwrap_or_else(|| "----------".to_string());
                    format!("{} - {} [{}]", date, doc.title(), doc.source.display())
                })
                .collect();
            Ok(("Posts", lines))
        }
        "page" | "pages" => {
            let lines = load_documents(site)?
                .iter()
                .filter(|doc| doc.kind == DocumentKind::Page)
                .map(|doc| format!("{} [{}]", doc.title(), doc.source.display()))
                .collect();
            Ok(("Pages", lines))
        }
        "tag" | "tags" => {
            let mut tags: BTreeMap<String, usize> = BTreeMap::new();
            for doc in load_documents(site)? {
                for tag in doc.front.tags {
                    *tags.entry(tag).or_insert(0) += 1;
                }
            }
            let mut tags: Vec<_> = tags.into_iter().collect();
            tags.sort_by(|a, b| b.1.cmp(&a.1));
            let lines = tags
                .into_iter()
                .map(|(tag, count)| format!("{} ({})", tag, count))
                .collect();
            Ok(("Tags", lines))
        }
        "layout" | "layouts" => {
            let layouts = LayoutSet::load(site)?;
            Ok(("Layouts", layouts.names().to_vec()))
        }
        _ => bail!(
            "Unknown type: {}. Available: posts, pages, tags, layouts",
            content_type
        ),
    }
}

/// Documents that parse; broken ones are reported and left out
fn load_documents(site: &Site) -> Result<Vec<Document>> {
    let loader = ContentLoader::new(site)?;
    let found = loader.discover()?;

    let mut documents = Vec::new();
    for relative in &found.documents {
        match loader.load(relative) {
            Ok(doc) => documents.push(doc),
            Err(e) => tracing::warn!("{}", e),
        }
    }
    Ok(documents)
}
