//! Static index page linking every published calendar.

use std::path::{Path, PathBuf};

use anyhow::Result;
use askama::Template;

pub const DEFAULT_BASE_URL: &str = "webcal://stankerstjens.github.io/cshl-shuttle-schedule";
pub const INDEX_FILE: &str = "index.html";

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate<'a> {
    title: &'a str,
    base_url: &'a str,
    links: Vec<IndexLink>,
}

struct IndexLink {
    path: String,
    label: String,
}

impl IndexLink {
    fn new(path: &Path) -> Self {
        let label = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().replace('_', " "))
            .unwrap_or_default();
        Self {
            path: path.to_string_lossy().replace('\\', "/"),
            label,
        }
    }
}

/// Renders the index page for calendar `paths` published under `base_url`.
pub fn render_index(title: &str, base_url: &str, paths: &[PathBuf]) -> Result<String> {
    let template = IndexTemplate {
        title,
        base_url: base_url.trim_end_matches('/'),
        links: paths.iter().map(|p| IndexLink::new(p)).collect(),
    };
    Ok(template.render()?)
}
