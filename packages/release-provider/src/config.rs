pub const DEFAULT_REPO_URL: &str = "https://github.com/Xiphe/budgetbudget";
pub const DEFAULT_ASSET_PREFIX: &str = "BudgetBudget";
pub const MANIFEST_FILE_NAME: &str = "latest-mac.yml";
pub const DEFAULT_MAX_PAGES: usize = 50;

/// A GitHub repository publishing desktop releases, and the URL layout
/// derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubRepo {
    url: String,
    asset_prefix: String,
}

impl Default for GitHubRepo {
    fn default() -> Self {
        Self::new(DEFAULT_REPO_URL, DEFAULT_ASSET_PREFIX)
    }
}

impl GitHubRepo {
    pub fn new(url: impl Into<String>, asset_prefix: impl Into<String>) -> Self {
        let url = url.into().trim_end_matches('/').to_string();
        Self {
            url,
            asset_prefix: asset_prefix.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn asset_prefix(&self) -> &str {
        &self.asset_prefix
    }

    pub fn feed_url(&self, cursor: Option<&str>) -> String {
        match cursor.filter(|c| !c.is_empty()) {
            Some(after) => format!(
                "{}/releases.atom?after={}",
                self.url,
                urlencoding::encode(after)
            ),
            None => format!("{}/releases.atom", self.url),
        }
    }

    pub fn download_base(&self, tag: &str) -> String {
        format!("{}/releases/download/{}", self.url, tag)
    }

    pub fn manifest_url(&self, tag: &str) -> String {
        format!("{}/{}", self.download_base(tag), MANIFEST_FILE_NAME)
    }

    /// Direct x64 disk image url kept for clients that predate per-arch files.
    pub fn legacy_download_url(&self, tag: &str) -> String {
        format!(
            "{}/{}-{}.dmg",
            self.download_base(tag),
            self.asset_prefix,
            tag.strip_prefix('v').unwrap_or(tag)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Upper bound of feed pages fetched by a single resolution.
    pub max_pages: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}
