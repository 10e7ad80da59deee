use std::sync::Arc;

use courier_core::Article;
use courier_logging::{courier_debug, courier_info};
use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};

use crate::decode::decode_html;
use crate::text::{normalize_lines, visible_text};
use crate::{Fetcher, PipelineError};

/// Candidate content regions, most specific first. The first selector with a
/// match wins.
const CONTENT_SELECTORS: &[&str] = &[
    "article",
    ".post-content",
    ".post-body",
    ".entry-content",
    r#"[class*="content"]"#,
    "main",
];

/// Markup removed from the content region before any text is read.
const STRIPPED_MARKUP: &str =
    r#"script, style, nav, footer, [class*="ads"], [class*="sidebar"]"#;

const UNTITLED: &str = "Untitled";

/// Turns an already fetched page into an [`Article`].
pub trait Extractor: Send + Sync {
    fn extract(&self, html: &str, source_url: &str) -> Result<Article, PipelineError>;
}

/// Where the article title came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TitleSource {
    Heading,
    DocumentTitle,
    OpenGraph,
    Fallback,
}

type TitleStrategy = fn(&Html) -> Option<String>;

const TITLE_STRATEGIES: &[(TitleSource, TitleStrategy)] = &[
    (TitleSource::Heading, first_heading),
    (TitleSource::DocumentTitle, document_title),
    (TitleSource::OpenGraph, open_graph_title),
];

/// Generic, site-agnostic extractor:
/// - title from the first `<h1>`, then `<title>` up to `|`, then `og:title`
/// - content from the first matching region selector, else `<body>`
/// - navigation, scripts, ads and sidebars stripped before text extraction.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicExtractor;

impl Extractor for HeuristicExtractor {
    fn extract(&self, html: &str, source_url: &str) -> Result<Article, PipelineError> {
        let doc = Html::parse_document(html);
        let (title, source) = resolve_title(&doc);
        let raw_content = content_region(&doc);

        let mut fragment = Html::parse_fragment(&raw_content);
        strip_non_article(&mut fragment);
        if source == TitleSource::Heading {
            drop_title_heading(&mut fragment, &title);
        }

        let body = normalize_lines(&visible_text(&fragment));
        if body.is_empty() {
            return Err(PipelineError::Extract {
                url: source_url.to_string(),
                message: "page has no readable text".to_string(),
            });
        }

        Ok(Article::new(source_url, &title, &body))
    }
}

fn resolve_title(doc: &Html) -> (String, TitleSource) {
    TITLE_STRATEGIES
        .iter()
        .find_map(|(source, strategy)| strategy(doc).map(|title| (title, *source)))
        .unwrap_or_else(|| (UNTITLED.to_string(), TitleSource::Fallback))
}

fn first_match<'a>(doc: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(selector).ok()?;
    doc.select(&selector).next()
}

fn non_empty(text: String) -> Option<String> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

fn first_heading(doc: &Html) -> Option<String> {
    first_match(doc, "h1").and_then(|h1| non_empty(h1.text().collect()))
}

fn document_title(doc: &Html) -> Option<String> {
    let title: String = first_match(doc, "title")?.text().collect();
    non_empty(title.split('|').next().unwrap_or_default().to_string())
}

fn open_graph_title(doc: &Html) -> Option<String> {
    first_match(doc, r#"meta[property="og:title"]"#)
        .and_then(|meta| meta.value().attr("content"))
        .and_then(|content| non_empty(content.to_string()))
}

/// Inner markup of the first matching content region, falling back to the
/// whole body (or document) when nothing matches or the match is empty.
fn content_region(doc: &Html) -> String {
    for selector in CONTENT_SELECTORS {
        if let Some(region) = first_match(doc, selector) {
            courier_debug!("Content region matched {}", selector);
            let inner = region.inner_html();
            if !inner.trim().is_empty() {
                return inner;
            }
            break;
        }
    }
    first_match(doc, "body")
        .map(|body| body.inner_html())
        .unwrap_or_else(|| doc.root_element().inner_html())
}

fn strip_non_article(fragment: &mut Html) {
    let Ok(selector) = Selector::parse(STRIPPED_MARKUP) else {
        return;
    };
    let doomed: Vec<NodeId> = fragment.select(&selector).map(|el| el.id()).collect();
    detach_all(fragment, doomed);
}

/// The heading used as title is not repeated in the body.
fn drop_title_heading(fragment: &mut Html, title: &str) {
    let Ok(selector) = Selector::parse("h1") else {
        return;
    };
    let heading = fragment
        .select(&selector)
        .find(|h1| non_empty(h1.text().collect()).as_deref() == Some(title))
        .map(|h1| h1.id());
    if let Some(id) = heading {
        detach_all(fragment, vec![id]);
    }
}

fn detach_all(fragment: &mut Html, ids: Vec<NodeId>) {
    for id in ids {
        if let Some(mut node) = fragment.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Fetches an article page and runs an [`Extractor`] over it.
pub struct ContentExtractor {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn Extractor>,
}

impl ContentExtractor {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self::with_extractor(fetcher, Arc::new(HeuristicExtractor))
    }

    pub fn with_extractor(fetcher: Arc<dyn Fetcher>, extractor: Arc<dyn Extractor>) -> Self {
        Self { fetcher, extractor }
    }

    pub async fn extract(&self, url: &str) -> Result<Article, PipelineError> {
        let output = self
            .fetcher
            .fetch(url)
            .await
            .map_err(|err| PipelineError::from_fetch(url, err))?;
        let decoded = decode_html(&output.bytes, output.metadata.content_type.as_deref());
        let article = self.extractor.extract(&decoded.html, url)?;
        courier_info!(
            "Extracted \"{}\" from {} ({} chars)",
            article.title(),
            url,
            article.body().chars().count()
        );
        Ok(article)
    }
}
