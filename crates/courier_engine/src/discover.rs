use std::collections::HashSet;
use std::sync::Arc;

use courier_core::{ArticleLink, SeedRequest};
use courier_logging::{courier_debug, courier_info};
use scraper::{Html, Selector};
use url::Url;

use crate::decode::decode_html;
use crate::{Fetcher, PipelineError};

/// Anchors that look like article links: well-known path segments, anything
/// inside an `<article>`, and anything inside a post-like container.
const ARTICLE_ANCHORS: &str = concat!(
    r#"a[href*="/post/"], a[href*="/blog/"], a[href*="/article/"], "#,
    r#"article a[href], .post a[href], .posts a[href], [class*="post-"] a[href]"#,
);

/// Finds same-origin article links on a blog's entry page.
pub struct LinkDiscoverer {
    fetcher: Arc<dyn Fetcher>,
}

impl LinkDiscoverer {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    /// Fetches the seed page and returns at most `seed.limit()` article links in
    /// document order. An empty result is not an error.
    pub async fn discover(&self, seed: &SeedRequest) -> Result<Vec<ArticleLink>, PipelineError> {
        let seed_url = seed.origin().as_str();
        let output = self
            .fetcher
            .fetch(seed_url)
            .await
            .map_err(|err| PipelineError::from_fetch(seed_url, err))?;

        let decoded = decode_html(&output.bytes, output.metadata.content_type.as_deref());
        let page_url = Url::parse(&output.metadata.final_url).unwrap_or_else(|_| seed.origin().clone());
        let links = collect_article_links(&decoded.html, &page_url, seed.origin(), seed.limit());

        courier_info!("Discovered {} article links on {}", links.len(), seed_url);
        Ok(links)
    }
}

/// Pure part of discovery: scan `html` for article anchors, resolve them
/// against the page's base URL, keep those on the seed's origin, dedupe by
/// exact URL string in first-seen order and cap at `limit`.
pub fn collect_article_links(html: &str, page_url: &Url, seed: &Url, limit: usize) -> Vec<ArticleLink> {
    let Ok(selector) = Selector::parse(ARTICLE_ANCHORS) else {
        return Vec::new();
    };
    let doc = Html::parse_document(html);
    let base = document_base(&doc, page_url);

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for anchor in doc.select(&selector) {
        if links.len() >= limit {
            break;
        }
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(resolved) = resolve_href(href, &base) else {
            continue;
        };
        let Some(link) = ArticleLink::new(resolved, seed) else {
            courier_debug!("Skipping cross-origin link {}", href);
            continue;
        };
        if seen.insert(link.as_str().to_string()) {
            links.push(link);
        }
    }
    links
}

/// A `<base href>` overrides the fetched URL as resolution base.
fn document_base(doc: &Html, page_url: &Url) -> Url {
    Selector::parse("base[href]")
        .ok()
        .and_then(|sel| doc.select(&sel).next())
        .and_then(|base| base.value().attr("href"))
        .and_then(|href| page_url.join(href.trim()).ok())
        .unwrap_or_else(|| page_url.clone())
}

fn resolve_href(href: &str, base: &Url) -> Option<Url> {
    let trimmed = href.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    if trimmed.to_ascii_lowercase().starts_with("javascript:") {
        return None;
    }
    base.join(trimmed).ok()
}
