use futures::future::try_join_all;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::changelog::extract_changelog;
use crate::channel::{classify, tag_from_link};
use crate::config::{GitHubRepo, ResolverConfig};
use crate::data::{LazyFiles, Release, ReleaseList};
use crate::entry::FeedEntry;
use crate::error::{ResolveError, Result};
use crate::manifest::ARCH_X64;
use crate::source::ReleaseSource;

/// Walks the release feed from newest to oldest and keeps the first release
/// seen for each channel.
pub struct ChannelResolver {
    source: Arc<dyn ReleaseSource>,
    repo: GitHubRepo,
    config: ResolverConfig,
}

impl ChannelResolver {
    pub fn new(source: Arc<dyn ReleaseSource>, repo: GitHubRepo, config: ResolverConfig) -> Self {
        Self {
            source,
            repo,
            config,
        }
    }

    pub fn repo(&self) -> &GitHubRepo {
        &self.repo
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Latest release of every channel in `wanted`, or of every channel in
    /// the feed when `wanted` is empty. Channels without any release are
    /// absent from the result.
    ///
    /// Files are not fetched; see [`LazyFiles`].
    pub async fn resolve_channels<S: AsRef<str>>(&self, wanted: &[S]) -> Result<ReleaseList> {
        let wanted: BTreeSet<&str> = wanted
            .iter()
            .map(|channel| channel.as_ref().trim())
            .filter(|channel| !channel.is_empty())
            .collect();
        let mut found = ReleaseList::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0;

        // `pages` counts pages with entries; the empty page ending the feed
        // is always fetched.
        loop {
            let entries = self.source.fetch_page(cursor.as_deref()).await?;
            if entries.is_empty() {
                debug!(pages, channels = found.len(), "release feed exhausted");
                return Ok(found);
            }
            if pages >= self.config.max_pages {
                let missing = wanted
                    .iter()
                    .filter(|channel| !found.contains_key(**channel))
                    .map(|channel| channel.to_string())
                    .collect();
                warn!(pages, "release feed page limit reached");
                return Err(ResolveError::PageLimitExceeded { pages, missing });
            }
            pages += 1;

            let mut last = None;
            for entry in &entries {
                let tag = tag_from_link(&entry.link);
                let channel = classify(tag);
                last = Some(tag.to_string());
                if (wanted.is_empty() || wanted.contains(channel.as_str()))
                    && !found.contains_key(&channel)
                {
                    let release = self.build_release(entry, tag, &channel);
                    found.insert(channel, release);
                }
            }

            if !wanted.is_empty() && wanted.iter().all(|channel| found.contains_key(*channel)) {
                debug!(pages, "all wanted channels resolved");
                return Ok(found);
            }
            if last == cursor {
                return Err(ResolveError::upstream_msg(format!(
                    "Release feed did not advance past {}",
                    last.unwrap_or_default()
                )));
            }
            cursor = last;
        }
    }

    fn build_release(&self, entry: &FeedEntry, tag: &str, channel: &str) -> Release {
        Release {
            title: entry.title.clone(),
            version: tag.to_string(),
            channel: channel.to_string(),
            link: entry.link.clone(),
            download: self.repo.legacy_download_url(tag),
            files: LazyFiles::new(tag, self.source.clone()),
            updated: entry.updated.clone(),
            changelog: extract_changelog(&entry.content),
        }
    }

    /// Latest release on `channel` with its files resolved.
    pub async fn find_latest(&self, channel: Option<&str>) -> Result<Release> {
        let channel = channel
            .map(str::trim)
            .filter(|channel| !channel.is_empty())
            .ok_or(ResolveError::MissingParameter("channel"))?;

        let mut releases = self.resolve_channels(&[channel]).await?;
        let release = releases.remove(channel).ok_or_else(|| {
            ResolveError::NotFound(format!("Could not find any release on channel \"{}\"", channel))
        })?;
        release.files.resolve().await?;
        Ok(release)
    }

    /// Latest release of each of `channels` (all channels when empty), with
    /// the files of every release fetched concurrently.
    pub async fn find_all<S: AsRef<str>>(&self, channels: &[S]) -> Result<ReleaseList> {
        let releases = self.resolve_channels(channels).await?;
        try_join_all(releases.values().map(|release| release.files.resolve())).await?;
        Ok(releases)
    }

    /// Installer url of the latest release on `channel` for `arch`
    /// (x64 when not given).
    pub async fn find_download(&self, channel: Option<&str>, arch: Option<&str>) -> Result<String> {
        let arch = arch
            .map(str::trim)
            .filter(|arch| !arch.is_empty())
            .unwrap_or(ARCH_X64);
        let release = self.find_latest(channel).await?;
        let file = release.file(arch).await?;
        Ok(file.download.clone())
    }
}
