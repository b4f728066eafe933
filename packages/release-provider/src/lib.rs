pub mod changelog;
pub mod channel;
pub mod config;
pub mod data;
pub mod entry;
pub mod error;
pub mod manifest;
pub mod resolver;
pub mod source;

// Re-export common types
pub use changelog::{extract_changelog, Changelog, ChangelogEntry, NO_SCOPE};
pub use channel::{classify, tag_from_link, STABLE_CHANNEL};
pub use config::{GitHubRepo, ResolverConfig};
pub use data::{LazyFiles, Release, ReleaseList};
pub use entry::{parse_feed_page, validate_entry, FeedEntry, RawEntry};
pub use error::{ResolveError, Result};
pub use manifest::{parse_manifest, FileMeta, ReleaseFiles, ARCH_ARM64, ARCH_X64};
pub use resolver::ChannelResolver;
pub use source::{FeedPage, GitHubSource, ReleaseSource};
