//! Latest desktop release per channel, resolved from a GitHub releases feed.
//!
//! The work is split over the workspace crates; this crate re-exports them
//! under one name.

pub use release_cache as cache;
pub use release_provider as provider;
pub use release_server as server;
pub use release_utils as utils;

pub use release_cache::{MemoryPageCache, NoCache, PageCache};
pub use release_provider::{
    ChannelResolver, GitHubRepo, GitHubSource, Release, ReleaseList, ReleaseSource, ResolveError,
    ResolverConfig,
};
pub use release_server::{handle, ReleaseServer};
pub use release_utils::HttpClient;
