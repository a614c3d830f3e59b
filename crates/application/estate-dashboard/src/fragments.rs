//! View fragment sources

use async_trait::async_trait;
use estate_core::{Error, Result};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

/// Where view fragments are fetched from
#[async_trait]
pub trait FragmentSource: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<String>;
}

/// Fragments read from a partials directory on every fetch
#[derive(Debug, Clone)]
pub struct DirFragments {
    root: PathBuf,
}

impl DirFragments {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let clean = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if path.is_empty() || !clean {
            return Err(Error::Load {
                path: path.to_string(),
                reason: "path escapes the partials directory".to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FragmentSource for DirFragments {
    async fn fetch(&self, path: &str) -> Result<String> {
        let file = self.resolve(path)?;
        tokio::fs::read_to_string(&file).await.map_err(|e| Error::Load {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Fragments compiled into the binary
#[derive(Debug, Clone, Default)]
pub struct StaticFragments {
    files: HashMap<String, String>,
}

impl StaticFragments {
    pub fn new<I, P, B>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, B)>,
        P: Into<String>,
        B: Into<String>,
    {
        Self {
            files: files.into_iter().map(|(p, b)| (p.into(), b.into())).collect(),
        }
    }
}

#[async_trait]
impl FragmentSource for StaticFragments {
    async fn fetch(&self, path: &str) -> Result<String> {
        self.files.get(path).cloned().ok_or_else(|| Error::Load {
            path: path.to_string(),
            reason: "not found".to_string(),
        })
    }
}
