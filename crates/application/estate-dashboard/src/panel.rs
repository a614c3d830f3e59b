//! Image Panel Renderer
//!
//! Holds the chart container of the analysis view. Every render clears the
//! previous content and appends one item per path in display order. Paths
//! whose file is missing become a placeholder naming the file, in place, so
//! one broken chart never hides the rest.

use estate_core::ChartGroup;
use std::path::PathBuf;
use std::sync::Arc;

/// Checks whether a chart URL is backed by a file
pub trait AssetProbe: Send + Sync {
    fn exists(&self, path: &str) -> bool;
}

/// Chart files on disk, served under a URL prefix
#[derive(Debug, Clone)]
pub struct ChartDir {
    url_prefix: String,
    root: PathBuf,
}

impl ChartDir {
    pub fn new(url_prefix: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
            root: root.into(),
        }
    }

    /// File backing `path`, `None` outside the prefix or on traversal
    pub fn file_for(&self, path: &str) -> Option<PathBuf> {
        let relative = path.strip_prefix(&self.url_prefix)?.strip_prefix('/')?;
        if relative.is_empty() || relative.split('/').any(|s| s == ".." || s.is_empty()) {
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl AssetProbe for ChartDir {
    fn exists(&self, path: &str) -> bool {
        self.file_for(path).map(|p| p.is_file()).unwrap_or(false)
    }
}

/// Last path segment, used as placeholder text
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// One visual element of the panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelItem {
    Chart { src: String, alt: String },
    Placeholder { filename: String },
}

impl PanelItem {
    pub fn src(&self) -> Option<&str> {
        match self {
            PanelItem::Chart { src, .. } => Some(src),
            PanelItem::Placeholder { .. } => None,
        }
    }
}

/// Items rendered under an optional section title
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelSection {
    pub title: Option<String>,
    pub items: Vec<PanelItem>,
}

pub struct ImagePanel {
    probe: Arc<dyn AssetProbe>,
    sections: Vec<PanelSection>,
}

impl ImagePanel {
    pub fn new(probe: Arc<dyn AssetProbe>) -> Self {
        Self {
            probe,
            sections: Vec::new(),
        }
    }

    /// Replace the panel content with `groups`, preserving order
    pub fn render(&mut self, groups: &[ChartGroup]) {
        self.sections.clear();
        for group in groups {
            let items = group.paths.iter().map(|path| self.item_for(path)).collect();
            self.sections.push(PanelSection {
                title: group.title.clone(),
                items,
            });
        }
    }

    pub fn render_paths(&mut self, paths: Vec<String>) {
        self.render(&[ChartGroup::untitled(paths)]);
    }

    pub fn clear(&mut self) {
        self.sections.clear();
    }

    pub fn sections(&self) -> &[PanelSection] {
        &self.sections
    }

    pub fn items(&self) -> impl Iterator<Item = &PanelItem> {
        self.sections.iter().flat_map(|s| s.items.iter())
    }

    /// Whether `src` is currently displayed as a chart
    pub fn contains_chart(&self, src: &str) -> bool {
        self.items().any(|item| item.src() == Some(src))
    }

    fn item_for(&self, path: &str) -> PanelItem {
        if self.probe.exists(path) {
            PanelItem::Chart {
                src: path.to_string(),
                alt: "Data visualization chart".to_string(),
            }
        } else {
            tracing::warn!("Chart not found: {}", path);
            PanelItem::Placeholder {
                filename: file_name(path).to_string(),
            }
        }
    }
}

impl std::fmt::Debug for ImagePanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImagePanel")
            .field("sections", &self.sections)
            .finish_non_exhaustive()
    }
}
