//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use sitecrawl::config::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};
use sitecrawl::output::export_all;
use sitecrawl::{CrawlError, Crawler, Results, RunState};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with fast termination detection
fn create_test_config(max_depth: u32) -> Config {
    Config {
        crawler: CrawlerConfig {
            seed_url: "http://127.0.0.1/".to_string(),
            workers: 4,
            requests_per_second: 100,
            max_depth,
            queue_capacity: 50,
            request_timeout_ms: 5_000,
            poll_interval_ms: 50,
            stable_polls: 3,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: Some("https://example.com/contact".to_string()),
        },
        output: OutputConfig::default(),
    }
}

fn html_page(title: &str, links: &[&str]) -> ResponseTemplate {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();
    let body = format!(
        r#"<html><head><title>{}</title><meta name="description" content="{} page"></head><body>{}</body></html>"#,
        title, title, anchors
    );
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, route: &str, response: ResponseTemplate, hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .expect(hits)
        .mount(server)
        .await;
}

fn crawled_urls(results: &Results) -> Vec<String> {
    results.pages().into_iter().map(|p| p.url).collect()
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        html_page("Home", &["/a", "/b", "http://other.test/x", "#top", "mailto:a@b.c"]),
        1,
    )
    .await;
    mount_page(&server, "/a", html_page("A", &["/", "/b#section", "/c"]), 1).await;
    mount_page(&server, "/b", html_page("B", &["/a"]), 1).await;
    mount_page(&server, "/c", html_page("C", &[]), 1).await;

    let results = Arc::new(Results::new());
    let crawler = Crawler::new(&create_test_config(3), Arc::clone(&results)).unwrap();

    crawler.start(&format!("{}/", base)).await.unwrap();

    assert_eq!(crawler.state(), RunState::Stopped);
    assert!(results.is_complete());
    assert_eq!(crawler.dropped_links(), 0);

    let urls = crawled_urls(&results);
    let unique: HashSet<&String> = urls.iter().collect();
    assert_eq!(urls.len(), 4, "got {:?}", urls);
    assert_eq!(unique.len(), 4, "duplicate fetches: {:?}", urls);
    assert!(urls.iter().all(|u| u.starts_with(&base)));

    let home = results
        .pages()
        .into_iter()
        .find(|p| p.url == format!("{}/", base))
        .unwrap();
    assert!(home.success);
    assert_eq!(home.title, "Home");
    assert_eq!(home.description, "Home page");
    assert!(home.links.contains(&"http://other.test/x".to_string()));

    let stats = results.stats();
    assert_eq!(stats.total, 4);
    assert_eq!(stats.success_count, 4);
    assert_eq!(stats.fail_count, 0);
    assert!(stats.duration > Duration::ZERO);
}

#[tokio::test]
async fn test_depth_zero_fetches_only_seed() {
    let server = MockServer::start().await;

    mount_page(&server, "/", html_page("Home", &["/a"]), 1).await;
    mount_page(&server, "/a", html_page("A", &[]), 0).await;

    let results = Arc::new(Results::new());
    let crawler = Crawler::new(&create_test_config(0), Arc::clone(&results)).unwrap();
    crawler.start(&format!("{}/", server.uri())).await.unwrap();

    assert_eq!(crawled_urls(&results), vec![format!("{}/", server.uri())]);
}

#[tokio::test]
async fn test_links_at_max_depth_not_followed() {
    let server = MockServer::start().await;

    mount_page(&server, "/", html_page("Home", &["/a"]), 1).await;
    mount_page(&server, "/a", html_page("A", &["/b"]), 1).await;
    mount_page(&server, "/b", html_page("B", &[]), 0).await;

    let results = Arc::new(Results::new());
    let crawler = Crawler::new(&create_test_config(1), Arc::clone(&results)).unwrap();
    crawler.start(&format!("{}/", server.uri())).await.unwrap();

    assert_eq!(results.len(), 2);
    let a = results
        .pages()
        .into_iter()
        .find(|p| p.url.ends_with("/a"))
        .unwrap();
    // links are still recorded on the page even though they are not followed
    assert_eq!(a.links, vec![format!("{}/b", server.uri())]);
}

#[tokio::test]
async fn test_fetch_error_recorded_and_crawl_continues() {
    let server = MockServer::start().await;

    mount_page(&server, "/", html_page("Home", &["/missing", "/ok"]), 1).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/ok", html_page("Ok", &[]), 1).await;

    let results = Arc::new(Results::new());
    let crawler = Crawler::new(&create_test_config(2), Arc::clone(&results)).unwrap();
    crawler.start(&format!("{}/", server.uri())).await.unwrap();

    let pages = results.pages();
    assert_eq!(pages.len(), 3);

    let missing = pages.iter().find(|p| p.url.ends_with("/missing")).unwrap();
    assert!(!missing.success);
    assert_eq!(missing.error.as_deref(), Some("status 404"));

    let stats = results.stats();
    assert_eq!(stats.success_count, 2);
    assert_eq!(stats.fail_count, 1);
}

#[tokio::test]
async fn test_cancel_before_start() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("Home", &[]), 0).await;

    let results = Arc::new(Results::new());
    let crawler = Crawler::new(&create_test_config(2), Arc::clone(&results)).unwrap();
    crawler.cancel();

    let started = Instant::now();
    crawler.start(&format!("{}/", server.uri())).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(crawler.state(), RunState::Stopped);
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_cancel_mid_run_abandons_slow_fetch() {
    let server = MockServer::start().await;

    mount_page(&server, "/", html_page("Home", &["/slow"]), 1).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html_page("Slow", &[]).set_delay(Duration::from_secs(4)))
        .mount(&server)
        .await;

    let results = Arc::new(Results::new());
    let crawler = Crawler::new(&create_test_config(2), Arc::clone(&results)).unwrap();

    let cancel = crawler.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        cancel.cancel();
    });

    let started = Instant::now();
    crawler.start(&format!("{}/", server.uri())).await.unwrap();

    assert!(
        started.elapsed() < Duration::from_secs(2),
        "cancel took {:?}",
        started.elapsed()
    );
    assert_eq!(crawler.state(), RunState::Stopped);
    assert_eq!(crawled_urls(&results), vec![format!("{}/", server.uri())]);

    // no worker survives the run to append late results
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn test_second_start_while_running_rejected() {
    let server = MockServer::start().await;

    mount_page(&server, "/", html_page("Home", &["/slow"]), 1).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html_page("Slow", &[]).set_delay(Duration::from_secs(4)))
        .mount(&server)
        .await;

    let results = Arc::new(Results::new());
    let crawler = Arc::new(Crawler::new(&create_test_config(2), results).unwrap());
    let mut state = crawler.subscribe();

    let seed = format!("{}/", server.uri());
    let first = {
        let crawler = Arc::clone(&crawler);
        let seed = seed.clone();
        tokio::spawn(async move { crawler.start(&seed).await })
    };

    state
        .wait_for(|s| *s == RunState::Running)
        .await
        .unwrap();

    let second = crawler.start(&seed).await;
    assert!(matches!(second, Err(CrawlError::AlreadyRunning)));

    crawler.cancel();
    first.await.unwrap().unwrap();
    assert_eq!(crawler.state(), RunState::Stopped);
}

#[tokio::test]
async fn test_restart_after_stop() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("Home", &["/a"]), 2).await;
    mount_page(&server, "/a", html_page("A", &[]), 2).await;

    let results = Arc::new(Results::new());
    let crawler = Crawler::new(&create_test_config(1), Arc::clone(&results)).unwrap();
    let seed = format!("{}/", server.uri());

    crawler.start(&seed).await.unwrap();
    assert_eq!(results.len(), 2);

    // each run gets a fresh visited set, so pages are fetched again
    crawler.start(&seed).await.unwrap();
    assert_eq!(results.len(), 4);
    assert_eq!(crawler.state(), RunState::Stopped);
}

#[tokio::test]
async fn test_rate_limit_spaces_requests() {
    let server = MockServer::start().await;

    let children: Vec<String> = (0..11).map(|i| format!("/p{}", i)).collect();
    let child_refs: Vec<&str> = children.iter().map(String::as_str).collect();
    mount_page(&server, "/", html_page("Home", &child_refs), 1).await;
    for child in &children {
        mount_page(&server, child, html_page("Child", &[]), 1).await;
    }

    let mut config = create_test_config(1);
    config.crawler.workers = 12;
    config.crawler.requests_per_second = 5;

    let results = Arc::new(Results::new());
    let crawler = Crawler::new(&config, Arc::clone(&results)).unwrap();

    let started = Instant::now();
    crawler.start(&format!("{}/", server.uri())).await.unwrap();

    // a burst of 5, then the remaining 7 fetches one token per 200ms
    assert_eq!(results.len(), 12);
    assert!(
        started.elapsed() >= Duration::from_millis(1_200),
        "finished in {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn test_small_queue_drops_links_without_deadlock() {
    let server = MockServer::start().await;

    let children: Vec<String> = (0..20).map(|i| format!("/p{}", i)).collect();
    let child_refs: Vec<&str> = children.iter().map(String::as_str).collect();
    mount_page(&server, "/", html_page("Home", &child_refs), 1).await;
    for child in &children {
        Mock::given(method("GET"))
            .and(path(child.as_str()))
            .respond_with(html_page("Child", &[]))
            .mount(&server)
            .await;
    }

    let mut config = create_test_config(1);
    config.crawler.workers = 1;
    config.crawler.queue_capacity = 3;

    let results = Arc::new(Results::new());
    let crawler = Crawler::new(&config, Arc::clone(&results)).unwrap();

    tokio::time::timeout(
        Duration::from_secs(10),
        crawler.start(&format!("{}/", server.uri())),
    )
    .await
    .expect("crawl did not converge")
    .unwrap();

    // one worker and three slots: the seed's 20 links fill the queue once
    assert_eq!(results.len(), 4);
    assert_eq!(crawler.dropped_links(), 17);
}

#[tokio::test]
async fn test_invalid_configuration_rejected() {
    let mut config = create_test_config(2);
    config.crawler.requests_per_second = 0;
    let result = Crawler::new(&config, Arc::new(Results::new()));
    assert!(matches!(result, Err(CrawlError::Config(_))));

    let mut config = create_test_config(2);
    config.crawler.queue_capacity = 0;
    let result = Crawler::new(&config, Arc::new(Results::new()));
    assert!(matches!(result, Err(CrawlError::Config(_))));
}

#[tokio::test]
async fn test_invalid_seed_rejected() {
    let crawler = Crawler::new(&create_test_config(2), Arc::new(Results::new())).unwrap();
    let result = crawler.start("ftp://example.com/").await;
    assert!(matches!(result, Err(CrawlError::InvalidSeed { .. })));
    assert_eq!(crawler.state(), RunState::Idle);
}

#[tokio::test]
async fn test_crawl_then_export() {
    let server = MockServer::start().await;
    mount_page(&server, "/", html_page("Home", &["/a"]), 1).await;
    mount_page(&server, "/a", html_page("A", &[]), 1).await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(1);
    config.output.directory = dir.path().to_path_buf();

    let results = Arc::new(Results::new());
    let crawler = Crawler::new(&config, Arc::clone(&results)).unwrap();
    crawler.start(&format!("{}/", server.uri())).await.unwrap();

    let written = export_all(&results, &config.output).unwrap();
    assert_eq!(written.len(), 3);

    let json = std::fs::read_to_string(config.output.results_json_path()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.as_array().map(Vec::len), Some(2));

    let links = std::fs::read_to_string(config.output.links_csv_path()).unwrap();
    assert!(links.contains(&format!("{}/a", server.uri())));
}
