//! Data loading.
//!
//! Fetches the link catalog and the site config through an [`AssetSource`] and
//! parses them into an [`AppState`]. Loading is all-or-nothing: any fetch or
//! parse failure is logged and the caller gets an empty state, so the page
//! still renders (without content) instead of failing the build.
//!
//! [`AssetSource`] is the seam between the pipeline and wherever the site's
//! files live. [`DirSource`] reads from a site directory on disk; tests swap in
//! an in-memory source.

use crate::config::DataConfig;
use crate::types::{AppState, Catalog, SiteConfig};
use log::{debug, error};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}: not found")]
    NotFound(String),
    #[error("{0}: path escapes the site directory")]
    OutsideRoot(String),
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("{path}: invalid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Something that can hand out the site's files by relative path.
///
/// `Sync` so icon fetches can run on the rayon pool.
pub trait AssetSource: Sync {
    fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError>;
}

/// Reads assets from a directory on disk.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for DirSource {
    fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let rel = Path::new(path);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(FetchError::OutsideRoot(path.to_string()));
        }
        let full = self.root.join(rel);
        std::fs::read(&full).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => FetchError::NotFound(path.to_string()),
            _ => FetchError::Io {
                path: path.to_string(),
                source,
            },
        })
    }
}

/// Load both JSON documents, falling back to an empty state on any failure.
pub fn load_data(source: &dyn AssetSource, paths: &DataConfig) -> AppState {
    match try_load_data(source, paths) {
        Ok(state) => state,
        Err(e) => {
            error!("Error loading data: {e}");
            AppState::default()
        }
    }
}

/// Load both JSON documents, reporting the first failure.
///
/// The catalog is fetched first, then the site config; nothing is returned
/// unless both succeed.
pub fn try_load_data(source: &dyn AssetSource, paths: &DataConfig) -> Result<AppState, LoadError> {
    let catalog: Catalog = fetch_json(source, &paths.links)?;
    let config: SiteConfig = fetch_json(source, &paths.site)?;
    debug!(
        "loaded {} link entries from {}, site config from {}",
        catalog.total(),
        paths.links,
        paths.site
    );
    Ok(AppState { catalog, config })
}

fn fetch_json<T: serde::de::DeserializeOwned>(
    source: &dyn AssetSource,
    path: &str,
) -> Result<T, LoadError> {
    let bytes = source.fetch(path)?;
    serde_json::from_slice(&bytes).map_err(|source| LoadError::Json {
        path: path.to_string(),
        source,
    })
}
