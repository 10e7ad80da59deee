use std::sync::Arc;

use courier_core::SeedRequest;
use courier_engine::{
    collect_article_links, FetchSettings, LinkDiscoverer, PipelineError, ReqwestFetcher,
};
use pretty_assertions::assert_eq;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn seed() -> Url {
    Url::parse("https://blog.example.com/").unwrap()
}

fn hrefs(html: &str, limit: usize) -> Vec<String> {
    collect_article_links(html, &seed(), &seed(), limit)
        .into_iter()
        .map(|link| link.as_str().to_string())
        .collect()
}

#[test]
fn keeps_document_order_and_caps_at_limit() {
    let html = r#"
        <a href="/blog/one">One</a>
        <a href="/blog/two">Two</a>
        <a href="/blog/three">Three</a>
    "#;
    assert_eq!(
        hrefs(html, 2),
        vec![
            "https://blog.example.com/blog/one".to_string(),
            "https://blog.example.com/blog/two".to_string(),
        ]
    );
}

#[test]
fn ignores_anchors_that_do_not_look_like_posts() {
    let html = r#"<a href="/about">About</a><a href="/contact">Contact</a>"#;
    assert!(hrefs(html, 10).is_empty());
}

#[test]
fn drops_links_on_other_origins() {
    let html = r#"
        <a href="https://elsewhere.example.org/post/1">Away</a>
        <a href="http://blog.example.com/post/2">Other scheme</a>
        <a href="/post/3">Home</a>
    "#;
    assert_eq!(hrefs(html, 10), vec!["https://blog.example.com/post/3".to_string()]);
}

#[test]
fn duplicates_keep_first_occurrence() {
    let html = r#"
        <a href="/post/a">A</a>
        <a href="/post/b">B</a>
        <a href="https://blog.example.com/post/a">A again</a>
    "#;
    assert_eq!(
        hrefs(html, 10),
        vec![
            "https://blog.example.com/post/a".to_string(),
            "https://blog.example.com/post/b".to_string(),
        ]
    );
}

#[test]
fn anchors_inside_article_blocks_are_candidates() {
    let html = r##"
        <article><h2><a href="/2024/01/hello">Hello</a></h2></article>
        <div class="post"><a href="/2024/02/again">Again</a></div>
        <a href="javascript:void(0)" class="post-link">Nope</a>
        <article><a href="#comments">Comments</a></article>
    "##;
    assert_eq!(
        hrefs(html, 10),
        vec![
            "https://blog.example.com/2024/01/hello".to_string(),
            "https://blog.example.com/2024/02/again".to_string(),
        ]
    );
}

#[test]
fn base_href_changes_resolution() {
    let html = r#"
        <html><head><base href="https://blog.example.com/archive/"></head>
        <body><article><a href="first">First</a></article></body></html>
    "#;
    assert_eq!(
        hrefs(html, 10),
        vec!["https://blog.example.com/archive/first".to_string()]
    );
}

#[tokio::test]
async fn discoverer_fetches_seed_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><body>
                <a href="/blog/a">A</a>
                <a href="/blog/b">B</a>
                <a href="/blog/c">C</a>
            </body></html>"#,
            "text/html; charset=utf-8",
        ))
        .mount(&server)
        .await;

    let discoverer = LinkDiscoverer::new(Arc::new(ReqwestFetcher::new(FetchSettings::default()).unwrap()));
    let request = SeedRequest::new(&server.uri(), 2).unwrap();
    let links = discoverer.discover(&request).await.expect("discover ok");

    let expected = vec![format!("{}/blog/a", server.uri()), format!("{}/blog/b", server.uri())];
    let actual: Vec<String> = links.iter().map(|link| link.as_str().to_string()).collect();
    assert_eq!(actual, expected);
}

#[tokio::test]
async fn discoverer_reports_unreachable_seed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let discoverer = LinkDiscoverer::new(Arc::new(ReqwestFetcher::new(FetchSettings::default()).unwrap()));
    let request = SeedRequest::new(&server.uri(), 5).unwrap();
    let err = discoverer.discover(&request).await.expect_err("seed fails");
    assert!(matches!(err, PipelineError::Fetch { .. }));
}
