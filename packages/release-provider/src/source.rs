use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use release_cache::{MemoryPageCache, PageCache};
use release_utils::HttpClient;

use crate::config::GitHubRepo;
use crate::entry::{parse_feed_page, FeedEntry};
use crate::error::{ResolveError, Result};
use crate::manifest::{parse_manifest, ReleaseFiles};

pub type FeedPage = Vec<FeedEntry>;

/// Where releases come from: pages of the release feed, newest first, and
/// the installer manifest of a single release.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// One page of entries following `cursor` (the last tag of the previous
    /// page). `None` is the newest page; an empty page ends the feed.
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<FeedPage>;

    async fn fetch_files(&self, tag: &str) -> Result<ReleaseFiles>;
}

pub struct GitHubSource {
    repo: GitHubRepo,
    client: HttpClient,
    cache: Arc<dyn PageCache<FeedPage>>,
}

impl GitHubSource {
    pub fn new(repo: GitHubRepo, client: HttpClient, cache: Arc<dyn PageCache<FeedPage>>) -> Self {
        Self {
            repo,
            client,
            cache,
        }
    }

    /// Source with an unbounded in-memory page cache.
    pub fn with_memory_cache(repo: GitHubRepo, client: HttpClient) -> Self {
        Self::new(repo, client, Arc::new(MemoryPageCache::new()))
    }

    pub fn repo(&self) -> &GitHubRepo {
        &self.repo
    }

    async fn get_text(&self, url: &str, what: &str) -> Result<String> {
        let rsp = self
            .client
            .get(url)
            .await
            .map_err(|e| ResolveError::upstream(format!("Failed to fetch {}", what), e))?;
        if !rsp.is_ok() {
            return Err(ResolveError::upstream_msg(format!(
                "Failed to fetch {}: {} responded with status {}",
                what, url, rsp.status
            )));
        }
        Ok(rsp.text())
    }
}

#[async_trait]
impl ReleaseSource for GitHubSource {
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<FeedPage> {
        let key = cursor.unwrap_or_default();
        if let Some(page) = self.cache.get(key).await {
            debug!(cursor = key, "release feed page from cache");
            return Ok(page);
        }

        let url = self.repo.feed_url(cursor);
        let body = self.get_text(&url, "release feed").await?;
        let page = parse_feed_page(&body)?;
        debug!(cursor = key, entries = page.len(), "fetched release feed page");
        self.cache.set(key, page.clone()).await;
        Ok(page)
    }

    async fn fetch_files(&self, tag: &str) -> Result<ReleaseFiles> {
        let url = self.repo.manifest_url(tag);
        let body = self.get_text(&url, "release manifest").await?;
        debug!(tag, "fetched release manifest");
        parse_manifest(&body, &self.repo.download_base(tag))
    }
}
