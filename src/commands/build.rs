//! Build the site

use anyhow::{bail, Result};
use notify_debouncer_mini::{new_debouncer, notify::RecursiveMode};
use std::path::{Component, Path};
use std::sync::mpsc::channel;
use std::time::Duration;

use crate::generator::{BuildReport, Generator};
use crate::Site;

/// Render every document and copy assets
pub fn run(site: &Site) -> Result<BuildReport> {
    let report = Generator::new(site)?.generate()?;

    if site.config.strict && !report.is_success() {
        for (source, err) in &report.failed {
            tracing::error!("{}: {}", source.display(), err);
        }
        bail!(
            "{} of {} documents failed to render",
            report.failed.len(),
            report.failed.len() + report.rendered.len()
        );
    }

    Ok(report)
}

/// Watch the source directory and rebuild on change, blocking forever.
///
/// `on_rebuild` runs after every successful rebuild.
pub fn watch<F>(site: &Site, mut on_rebuild: F) -> Result<()>
where
    F: FnMut(&BuildReport),
{
    let (tx, rx) = channel();
    let mut debouncer = new_debouncer(Duration::from_millis(300), tx)?;
    debouncer
        .watcher()
        .watch(&site.source_dir, RecursiveMode::Recursive)?;

    tracing::info!(
        "Watching {:?} for changes. Press Ctrl+C to stop.",
        site.source_dir
    );

    for result in rx {
        let events = match result {
            Ok(events) => events,
            Err(e) => {
                tracing::error!("Watch error: {:?}", e);
                continue;
            }
        };

        if events.iter().any(|e| e.path == site.config_path()) {
            tracing::warn!("{} changed; restart to apply it", Site::CONFIG_FILE);
        }

        let changed: Vec<_> = events
            .iter()
            .filter(|e| is_relevant(site, &e.path))
            .collect();
        if changed.is_empty() {
            continue;
        }

        for event in &changed {
            tracing::info!("File changed: {}", event.path.display());
        }

        match run(site) {
            Ok(report) => on_rebuild(&report),
            Err(e) => tracing::error!("Rebuild failed: {:#}", e),
        }
    }

    Ok(())
}

/// Whether a changed path should trigger a rebuild
fn is_relevant(site: &Site, path: &Path) -> bool {
    if path.starts_with(&site.dest_dir) || path == site.config_path() {
        return false;
    }

    if path.to_string_lossy().ends_with('~') {
        return false;
    }

    let relative = path.strip_prefix(&site.source_dir).unwrap_or(path);
    !relative.components().any(|c| match c {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}
