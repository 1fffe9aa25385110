//! End-to-end crawls over the HTTP provider against a mock server

use depthcrawl::{
    Backend, BrowserProvider, BrowserSession, CrawlError, Crawler, CrawlerConfig, HttpProvider,
    LaunchError, NavigationError, WebDriverProvider,
};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

async fn mount_html(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

fn http_config(start_url: String, max_depth: usize) -> CrawlerConfig {
    let mut config = CrawlerConfig::new(&start_url);
    config.max_depth = max_depth;
    config.max_concurrency = 2;
    config.browser.backend = Backend::Http;
    config
}

#[tokio::test]
async fn test_crawl_site_over_http() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(
        &server,
        "/",
        format!(
            r#"<html><head><title>Home</title></head><body>
            <a href="/page1">Page 1</a>
            <a href="{base}/page2#top">Page 2</a>
            <a href="mailto:owner@example.com">Mail</a>
            </body></html>"#
        ),
    )
    .await;
    mount_html(
        &server,
        "/page1",
        r#"<html><head><title>Page 1</title></head><body>
            <a href="/">Home</a>
            <a href="doc.pdf">PDF</a>
            </body></html>"#
            .to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/doc.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"))
        .mount(&server)
        .await;
    // /page2 is not mounted and answers 404

    let result = depthcrawl::crawl(&http_config(format!("{base}/"), 2))
        .await
        .unwrap();

    let urls: Vec<&str> = result.urls().collect();
    let expected = vec![
        format!("{base}/"),
        format!("{base}/doc.pdf"),
        format!("{base}/page1"),
        format!("{base}/page2"),
    ];
    assert_eq!(urls, expected);

    let home = result.get(&format!("{base}/")).unwrap();
    assert_eq!(home.title, "Home");
    assert!(home.content.contains("Page 1"));
    assert_eq!(home.links.len(), 3);
    assert!(home.is_success());

    assert_eq!(
        result.get(&format!("{base}/page2")).unwrap().error,
        Some(NavigationError::Status(404))
    );
    assert!(matches!(
        result.get(&format!("{base}/doc.pdf")).unwrap().error,
        Some(NavigationError::NotHtml(_))
    ));

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json[format!("{base}/")]["title"], "Home");
    assert!(json[format!("{base}/")]["error"].is_null());
    assert_eq!(
        json[format!("{base}/page2")]["error"],
        "unexpected HTTP status 404"
    );
}

#[tokio::test]
async fn test_redirect_is_keyed_by_final_url() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/start"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", format!("{base}/final")))
        .mount(&server)
        .await;
    mount_html(
        &server,
        "/final",
        r#"<html><head><title>Final</title></head><body><a href="/start">again</a></body></html>"#
            .to_string(),
    )
    .await;

    let result = depthcrawl::crawl(&http_config(format!("{base}/start"), 3))
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
    assert!(!result.contains(&format!("{base}/start")));
    assert_eq!(result.get(&format!("{base}/final")).unwrap().title, "Final");
}

#[tokio::test]
async fn test_redirect_to_error_page_is_keyed_by_final_url() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(
        &server,
        "/",
        r#"<html><body><a href="/old">old</a><a href="/new">new</a></body></html>"#.to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", format!("{base}/new")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = depthcrawl::crawl(&http_config(format!("{base}/"), 1))
        .await
        .unwrap();

    let urls: Vec<&str> = result.urls().collect();
    assert_eq!(urls, vec![format!("{base}/"), format!("{base}/new")]);
    assert_eq!(
        result.get(&format!("{base}/new")).unwrap().error,
        Some(NavigationError::Status(503))
    );
}

#[tokio::test]
async fn test_start_redirect_to_missing_page_is_keyed_by_final_url() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/start"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", format!("{base}/gone")))
        .mount(&server)
        .await;
    // /gone is not mounted and answers 404

    let result = depthcrawl::crawl(&http_config(format!("{base}/start"), 0))
        .await
        .unwrap();

    let urls: Vec<&str> = result.urls().collect();
    assert_eq!(urls, vec![format!("{base}/gone")]);
    assert_eq!(
        result.get(&format!("{base}/gone")).unwrap().error,
        Some(NavigationError::Status(404))
    );
}

#[tokio::test]
async fn test_http_session_reports_final_url_on_failure() {
    let server = MockServer::start().await;
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", format!("{base}/doc.pdf")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/doc.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"))
        .mount(&server)
        .await;

    let session = HttpProvider::new("depthcrawl-test").launch().await.unwrap();
    let failure = session.navigate(&format!("{base}/old")).await.unwrap_err();
    assert_eq!(failure.final_url, Some(format!("{base}/doc.pdf")));
    assert_eq!(
        failure.error,
        NavigationError::NotHtml("application/pdf".to_string())
    );
    session.close().await;
}

#[tokio::test]
async fn test_http_session_navigation() {
    let server = MockServer::start().await;
    mount_html(
        &server,
        "/",
        r#"<html><head><title> Spaced </title></head><body>
            <a href="a">A</a><a href="/b">B</a><a href="a">A again</a>
            </body></html>"#
            .to_string(),
    )
    .await;

    let session = HttpProvider::new("depthcrawl-test").launch().await.unwrap();
    let page = session.navigate(&format!("{}/", server.uri())).await.unwrap();
    assert_eq!(page.title, "Spaced");
    assert_eq!(page.raw_links, vec!["a", "/b", "a"]);
    assert_eq!(page.final_url, format!("{}/", server.uri()));
    session.close().await;
}

#[tokio::test]
async fn test_http_server_error_is_recorded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let result = Crawler::new(HttpProvider::new("depthcrawl-test"))
        .with_page_timeout(Duration::from_secs(5))
        .run(&format!("{}/", server.uri()), 1)
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result.error_count(), 1);
}

#[tokio::test]
async fn test_missing_start_url_is_config_error() {
    let mut config = CrawlerConfig::default();
    config.browser.backend = Backend::Http;
    let err = depthcrawl::crawl(&config).await.unwrap_err();
    assert!(matches!(err, CrawlError::Config(_)));
}

#[tokio::test]
async fn test_unreachable_webdriver_is_fatal() {
    // Only the closed port is tried, never a WebDriver running locally
    let provider = WebDriverProvider::new("http://127.0.0.1:1").with_fallbacks(false);
    let err = Crawler::new(provider)
        .run("https://example.com/", 1)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CrawlError::Launch(LaunchError::Unreachable { .. })
    ));
}
