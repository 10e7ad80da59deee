use std::fmt;

use serde::{Serialize, Serializer};
use url::Url;

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_BODY_CHARS: usize = 50_000;

/// An absolute article URL sharing scheme, host and port with the seed page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArticleLink(Url);

impl ArticleLink {
    /// Returns `None` when `candidate` lives on a different origin than `seed`.
    pub fn new(candidate: Url, seed: &Url) -> Option<Self> {
        if candidate.origin() == seed.origin() {
            Some(Self(candidate))
        } else {
            None
        }
    }

    pub fn url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ArticleLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl Serialize for ArticleLink {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.as_str())
    }
}

/// Normalized title and body of one blog post. Length caps are applied on
/// construction and the record is read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    #[serde(rename = "url")]
    source_url: String,
    title: String,
    #[serde(rename = "content")]
    body: String,
}

impl Article {
    pub fn new(source_url: impl Into<String>, title: &str, body: &str) -> Self {
        Self {
            source_url: source_url.into(),
            title: truncate_chars(title, MAX_TITLE_CHARS),
            body: truncate_chars(body, MAX_BODY_CHARS),
        }
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Keeps at most `max_chars` characters, never splitting a code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
