//! Structured changelog from the HTML body of a release.
//!
//! Release notes generated by conventional-changelog look like
//!
//! ```html
//! <h3>Features</h3>
//! <ul>
//!   <li><strong>core:</strong> did X (<a href="https://…/commit/abc123">abc123</a>)</li>
//! </ul>
//! ```
//!
//! which becomes `{"Features": {"core": [{"message": "did X", "link": …, "commit": "abc123"}]}}`.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scope key for items without a bold scope prefix.
pub const NO_SCOPE: &str = "_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

/// kind -> scope -> entries
pub type Changelog = BTreeMap<String, BTreeMap<String, Vec<ChangelogEntry>>>;

static HEADING: Lazy<Selector> = Lazy::new(|| Selector::parse("h3").unwrap());
static BOLD: Lazy<Selector> = Lazy::new(|| Selector::parse("strong, b").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());

pub fn extract_changelog(html: &str) -> Changelog {
    let document = Html::parse_fragment(html);
    let mut changelog = Changelog::new();

    for heading in document.select(&HEADING) {
        let kind = collapse_whitespace(&heading.text().collect::<String>());
        let Some(list) = heading.next_siblings().find_map(ElementRef::wrap) else {
            continue;
        };
        if !matches!(list.value().name(), "ul" | "ol") {
            continue;
        }

        for item in list
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|child| child.value().name() == "li")
        {
            let (scope, entry) = parse_item(item);
            changelog
                .entry(kind.clone())
                .or_default()
                .entry(scope)
                .or_default()
                .push(entry);
        }
    }

    changelog
}

fn parse_item(item: ElementRef) -> (String, ChangelogEntry) {
    let scope_element = item.select(&BOLD).next();
    let commit_element = item.select(&LINK).last();

    let scope = scope_element
        .map(|element| {
            let text = collapse_whitespace(&element.text().collect::<String>());
            text.trim_end_matches(':').trim().to_string()
        })
        .filter(|scope| !scope.is_empty())
        .unwrap_or_else(|| NO_SCOPE.to_string());

    let commit = commit_element
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|commit| !commit.is_empty());
    let link = commit_element
        .and_then(|element| element.value().attr("href"))
        .map(str::to_string);

    let removed: Vec<ElementRef> = scope_element.into_iter().chain(commit_element).collect();
    let mut text = String::new();
    for node in item.descendants() {
        if let Node::Text(chunk) = node.value() {
            let inside_removed = node
                .ancestors()
                .any(|ancestor| removed.iter().any(|element| element.id() == ancestor.id()));
            if !inside_removed {
                text.push_str(chunk);
            }
        }
    }

    let entry = ChangelogEntry {
        message: strip_trailing_parens(&collapse_whitespace(&text)),
        link,
        commit,
    };
    (scope, entry)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Drops the `()` left behind once the commit link is cut out of
/// `message (<a>sha</a>)`.
fn strip_trailing_parens(message: &str) -> String {
    let mut message = message.trim_end();
    loop {
        if let Some(rest) = message.strip_suffix("()") {
            message = rest.trim_end();
        } else if let Some(rest) = message.strip_suffix('(') {
            message = rest.trim_end();
        } else {
            break;
        }
    }
    message.to_string()
}
