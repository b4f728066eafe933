use once_cell::sync::Lazy;
use regex::Regex;

pub const STABLE_CHANNEL: &str = "stable";

static CHANNEL_TAG_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^v[0-9.]+-([a-zA-Z]+)\.[0-9]+$").unwrap());

/// Channel of a release tag: `v1.2.3-beta.4` is "beta", anything without a
/// channel suffix is "stable".
pub fn classify(tag: &str) -> String {
    CHANNEL_TAG_REGEX
        .captures(tag)
        .and_then(|captures| captures.get(1))
        .map_or(STABLE_CHANNEL, |channel| channel.as_str())
        .to_string()
}

/// Tag of a release page link, i.e. its last path segment.
pub fn tag_from_link(link: &str) -> &str {
    let path = link.split(['?', '#']).next().unwrap_or(link);
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}
