//! HTTP surface of the release channel resolver.

pub mod handlers;
pub mod server;

pub use handlers::{download, get_release, get_releases, preflight, split_channels, Body};
pub use server::{handle, ReleaseServer, ServerError};
