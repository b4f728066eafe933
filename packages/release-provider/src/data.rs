use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::changelog::Changelog;
use crate::error::{ResolveError, Result};
use crate::manifest::{FileMeta, ReleaseFiles};
use crate::source::ReleaseSource;

/// Latest release per channel.
pub type ReleaseList = BTreeMap<String, Release>;

#[derive(Debug, Clone, Serialize)]
pub struct Release {
    pub title: String,
    pub version: String,
    pub channel: String,
    pub link: String,
    /// Direct x64 download, superseded by `files`.
    pub download: String,
    #[serde(skip_serializing_if = "LazyFiles::is_unresolved")]
    pub files: LazyFiles,
    pub updated: String,
    pub changelog: Changelog,
}

impl Release {
    /// Installer for `arch`, fetching the manifest if needed.
    pub async fn file(&self, arch: &str) -> Result<&FileMeta> {
        self.files.resolve().await?.get(arch).ok_or_else(|| {
            ResolveError::NotFound(format!(
                "No {} download for release {} on channel \"{}\"",
                arch, self.version, self.channel
            ))
        })
    }
}

/// Installer files of a release, fetched on first use.
///
/// The first successful [`LazyFiles::resolve`] is kept, so every later call
/// (and every clone of the owning `Release`) sees the same value without
/// fetching the manifest again. Failures are not kept.
#[derive(Clone)]
pub struct LazyFiles {
    tag: String,
    source: Arc<dyn ReleaseSource>,
    files: Arc<OnceCell<ReleaseFiles>>,
}

impl LazyFiles {
    pub fn new(tag: impl Into<String>, source: Arc<dyn ReleaseSource>) -> Self {
        Self {
            tag: tag.into(),
            source,
            files: Arc::new(OnceCell::new()),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn get(&self) -> Option<&ReleaseFiles> {
        self.files.get()
    }

    pub fn is_unresolved(&self) -> bool {
        !self.files.initialized()
    }

    pub async fn resolve(&self) -> Result<&ReleaseFiles> {
        self.files
            .get_or_try_init(|| self.source.fetch_files(&self.tag))
            .await
    }
}

impl fmt::Debug for LazyFiles {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyFiles")
            .field("tag", &self.tag)
            .field("files", &self.files.get())
            .finish()
    }
}

impl Serialize for LazyFiles {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.files.get().serialize(serializer)
    }
}
