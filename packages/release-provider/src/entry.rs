//! Atom feed entries as published on `<repo>/releases.atom`.
//!
//! The raw structures keep every repeated element so that an entry with a
//! missing or duplicated field can be rejected instead of silently picking
//! one of them.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ResolveError, Result};

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct RawFeed {
    #[serde(default)]
    pub entry: Vec<RawEntry>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawEntry {
    #[serde(default)]
    pub link: Vec<RawLink>,
    #[serde(default)]
    pub title: Vec<String>,
    #[serde(default)]
    pub updated: Vec<String>,
    #[serde(default)]
    pub content: Vec<RawContent>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawLink {
    #[serde(rename = "@href", default)]
    pub href: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawContent {
    #[serde(rename = "$text", default)]
    pub body: Option<String>,
}

/// A release feed item with exactly one of each field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub link: String,
    pub title: String,
    pub updated: String,
    /// Changelog as HTML.
    pub content: String,
}

pub const INVALID_ENTRY: &str = "Invalid feed entry format";

pub fn validate_entry(raw: &RawEntry) -> Result<FeedEntry> {
    let invalid = || ResolveError::malformed(INVALID_ENTRY, raw);

    let link = match raw.link.as_slice() {
        [RawLink { href: Some(href) }] => href.clone(),
        _ => return Err(invalid()),
    };
    let title = match raw.title.as_slice() {
        [title] => title.clone(),
        _ => return Err(invalid()),
    };
    let updated = match raw.updated.as_slice() {
        [updated] => updated.clone(),
        _ => return Err(invalid()),
    };
    let content = match raw.content.as_slice() {
        [RawContent { body: Some(body) }] => body.clone(),
        _ => return Err(invalid()),
    };

    Ok(FeedEntry {
        link,
        title,
        updated,
        content,
    })
}

/// Parses one page of the atom feed. Entries that fail validation are
/// skipped; a document that is not a feed at all is an upstream failure.
pub fn parse_feed_page(xml: &str) -> Result<Vec<FeedEntry>> {
    check_feed_root(xml)?;
    let feed: RawFeed = quick_xml::de::from_str(xml)
        .map_err(|e| ResolveError::upstream("Unable to parse release feed", e))?;

    Ok(feed
        .entry
        .iter()
        .filter_map(|raw| match validate_entry(raw) {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(error = %err, "skipping feed entry");
                None
            }
        })
        .collect())
}

/// Error pages and other XML documents would otherwise deserialize as a feed
/// without entries.
fn check_feed_root(xml: &str) -> Result<()> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return if e.local_name().as_ref() == b"feed" {
                    Ok(())
                } else {
                    Err(ResolveError::upstream_msg(format!(
                        "Release feed is not an atom feed (root element <{}>)",
                        String::from_utf8_lossy(e.local_name().as_ref())
                    )))
                };
            }
            Ok(Event::Eof) => {
                return Err(ResolveError::upstream_msg("Release feed is empty"));
            }
            Ok(_) => {}
            Err(e) => return Err(ResolveError::upstream("Unable to parse release feed", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_entry() -> RawEntry {
        RawEntry {
            link: vec![RawLink {
                href: Some("https://github.com/o/r/releases/tag/v1.0.0".into()),
            }],
            title: vec!["v1.0.0".into()],
            updated: vec!["2020-10-11T12:00:00Z".into()],
            content: vec![RawContent {
                body: Some("<h3>Features</h3>".into()),
            }],
        }
    }

    #[test]
    fn test_validate_entry() {
        let entry = validate_entry(&raw_entry()).unwrap();
        assert_eq!(entry.link, "https://github.com/o/r/releases/tag/v1.0.0");
        assert_eq!(entry.title, "v1.0.0");
        assert_eq!(entry.updated, "2020-10-11T12:00:00Z");
        assert_eq!(entry.content, "<h3>Features</h3>");
    }

    #[test]
    fn test_validate_entry_rejects_duplicates_and_gaps() {
        let mut two_links = raw_entry();
        two_links.link.push(two_links.link[0].clone());

        let mut no_href = raw_entry();
        no_href.link[0].href = None;

        let mut no_title = raw_entry();
        no_title.title.clear();

        let mut no_updated = raw_entry();
        no_updated.updated.clear();

        let mut empty_content = raw_entry();
        empty_content.content[0].body = None;

        for raw in [two_links, no_href, no_title, no_updated, empty_content] {
            let err = validate_entry(&raw).unwrap_err();
            assert!(matches!(err, ResolveError::MalformedInput { .. }));
            assert!(err.to_string().starts_with(INVALID_ENTRY));
        }
    }

    #[test]
    fn test_malformed_error_carries_raw_entry() {
        let mut raw = raw_entry();
        raw.title.clear();
        match validate_entry(&raw).unwrap_err() {
            ResolveError::MalformedInput { raw, .. } => {
                assert!(raw.contains("releases/tag/v1.0.0"));
                assert!(raw.contains("\"title\":[]"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_parse_feed_page_skips_invalid_entries() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xml:lang="en-US">
  <id>tag:github.com,2008:https://github.com/o/r/releases</id>
  <link type="text/html" rel="alternate" href="https://github.com/o/r/releases"/>
  <link type="application/atom+xml" rel="self" href="https://github.com/o/r/releases.atom"/>
  <title>Release notes from r</title>
  <updated>2020-10-11T12:00:00Z</updated>
  <entry>
    <id>tag:github.com,2008:Repository/1/v1.0.0</id>
    <updated>2020-10-11T12:00:00Z</updated>
    <link rel="alternate" type="text/html" href="https://github.com/o/r/releases/tag/v1.0.0"/>
    <title>v1.0.0</title>
    <content type="html">&lt;h3&gt;Features&lt;/h3&gt;</content>
    <author><name>someone</name></author>
  </entry>
  <entry>
    <id>tag:github.com,2008:Repository/1/v0.9.0</id>
    <updated>2020-10-01T12:00:00Z</updated>
    <link rel="alternate" type="text/html" href="https://github.com/o/r/releases/tag/v0.9.0"/>
    <content type="html">no title</content>
  </entry>
</feed>"#;
        let entries = parse_feed_page(xml).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "v1.0.0");
        assert_eq!(entries[0].content, "<h3>Features</h3>");
    }

    #[test]
    fn test_parse_empty_feed() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"><title>Release notes</title></feed>"#;
        assert!(parse_feed_page(xml).unwrap().is_empty());
    }

    #[test]
    fn test_parse_garbage_is_upstream_failure() {
        let err = parse_feed_page("<feed><entry>").unwrap_err();
        assert!(matches!(err, ResolveError::Upstream { .. }));
        assert_eq!(err.to_string(), "Unable to parse release feed");
    }

    #[test]
    fn test_parse_non_feed_documents_is_upstream_failure() {
        for xml in [
            "<html><body><p>Rate limited</p></body></html>",
            "<rss><channel><item/></channel></rss>",
            "<?xml version=\"1.0\"?><!-- nothing --><error/>",
            "",
        ] {
            let err = parse_feed_page(xml).unwrap_err();
            assert!(matches!(err, ResolveError::Upstream { .. }), "{xml} gave {err:?}");
            assert_eq!(err.status_code(), 500);
        }
    }

    #[test]
    fn test_prefixed_feed_root_is_accepted() {
        let xml = r#"<atom:feed xmlns:atom="http://www.w3.org/2005/Atom"></atom:feed>"#;
        assert!(check_feed_root(xml).is_ok());
    }
}
