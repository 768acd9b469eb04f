//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a fixture website and drive full crawl
//! runs through `ForgeService` against in-memory storage.

use async_trait::async_trait;
use faq_forge::config::{Config, CrawlerConfig, UserAgentConfig};
use faq_forge::crawler::{build_http_client, fetch_page, FetchFailure};
use faq_forge::generation::{CompletionClient, GenerationError};
use faq_forge::storage::{shared, with_storage, SqliteStorage, Storage};
use faq_forge::{ForgeError, ForgeService, JobState, RunState};
use std::sync::Arc;
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Completion client for tests that never generate
struct UnusedClient;

#[async_trait]
impl CompletionClient for UnusedClient {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Other("not used in crawl tests".to_string()))
    }
}

/// Creates a test configuration with no politeness delay
fn create_test_config(max_depth: u32, max_pages: u32) -> Config {
    Config {
        crawler: CrawlerConfig {
            max_depth,
            max_pages,
            request_timeout_secs: 5,
            max_redirects: 5,
            politeness_delay_ms: 0,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestBot".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: None,
        },
        ..Config::default()
    }
}

fn create_service(config: Config) -> ForgeService {
    let storage = shared(SqliteStorage::new_in_memory().expect("Failed to create storage"));
    ForgeService::new(config, storage, Arc::new(UnusedClient))
}

fn html_page(title: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            title, body
        ))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, route: &str, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_crawl_respects_page_cap_and_depth() {
    let mock_server = MockServer::start().await;

    // Seed links to ten pages, one of them twice and one back to itself
    let mut links: String = (0..10)
        .map(|i| format!(r#"<a href="/p{}">Page {}</a>"#, i, i))
        .collect();
    links.push_str(r#"<a href="/p0#again">Again</a><a href="/">Home</a>"#);

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("Home", &links))
        .expect(1)
        .mount(&mock_server)
        .await;

    for i in 0..10 {
        Mock::given(method("GET"))
            .and(path(format!("/p{}", i)))
            .respond_with(html_page(
                &format!("Page {}", i),
                r#"<p>Some content that is long enough to keep.</p><a href="/deep">Deep</a>"#,
            ))
            .expect(0..=1)
            .mount(&mock_server)
            .await;
    }

    // Only reachable at depth 2
    Mock::given(method("GET"))
        .and(path("/deep"))
        .respond_with(html_page("Deep", "<p>Too far</p>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let service = create_service(create_test_config(1, 5));
    let trigger = service
        .trigger_crawl(&format!("{}/", mock_server.uri()))
        .expect("Crawl should be accepted");

    let summary = trigger
        .handle
        .await
        .expect("Crawl task panicked")
        .expect("Crawl should succeed");

    assert_eq!(summary.pages_crawled, 5);
    assert_eq!(summary.pages_failed, 0);

    let pages = service.list_pages(trigger.job_id).unwrap();
    assert_eq!(pages.len(), 5);
    assert!(pages.iter().all(|p| !p.url.ends_with("/deep")));

    let status = service.job_status(trigger.job_id).unwrap();
    assert_eq!(status.job.state, JobState::Completed);
    assert_eq!(status.job.total_pages, 5);

    let run = status.run.expect("Run should exist");
    assert_eq!(run.state, RunState::Completed);
    assert_eq!(run.counters.pages_discovered, 5);
    assert_eq!(run.counters.pages_crawled, 5);
    assert_eq!(run.progress, 100);

    mock_server.verify().await;
}

#[tokio::test]
async fn test_failed_page_does_not_abort_run() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/",
        html_page(
            "Home",
            r#"<a href="/ok">OK</a><a href="/missing">Missing</a>"#,
        ),
    )
    .await;
    mount_page(&mock_server, "/ok", html_page("OK", "<p>Fine page</p>")).await;
    mount_page(&mock_server, "/missing", ResponseTemplate::new(404)).await;

    let service = create_service(create_test_config(2, 20));
    let trigger = service
        .trigger_crawl(&format!("{}/", mock_server.uri()))
        .unwrap();
    let summary = trigger.handle.await.unwrap().unwrap();

    assert_eq!(summary.pages_crawled, 2);
    assert_eq!(summary.pages_failed, 1);

    let status = service.job_status(trigger.job_id).unwrap();
    assert_eq!(status.job.state, JobState::Completed);
    assert_eq!(status.job.total_pages, 2);
    assert!(status.job.error_message.is_none());

    let run = status.run.unwrap();
    assert_eq!(run.state, RunState::Completed);
    assert_eq!(run.counters.pages_discovered, 3);
    assert_eq!(run.counters.pages_failed, 1);
    assert_eq!(run.progress, 67);
    assert_eq!(run.errors.len(), 1);
    assert!(run.errors[0].url.ends_with("/missing"));
    assert!(run.errors[0].message.contains("404"));

    // Failed URLs are not stored as pages
    let pages = service.list_pages(trigger.job_id).unwrap();
    assert_eq!(pages.len(), 2);
}

#[tokio::test]
async fn test_unreachable_seed_completes_with_no_pages() {
    let service = create_service(create_test_config(1, 5));
    let trigger = service.trigger_crawl("http://127.0.0.1:9/").unwrap();
    let summary = trigger.handle.await.unwrap().unwrap();

    assert_eq!(summary.pages_crawled, 0);
    assert_eq!(summary.pages_failed, 1);

    let status = service.job_status(trigger.job_id).unwrap();
    assert_eq!(status.job.state, JobState::Completed);
    assert_eq!(status.job.total_pages, 0);
    assert_eq!(status.run.unwrap().progress, 0);
}

#[tokio::test]
async fn test_trigger_returns_initial_states() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/", html_page("Home", "<p>Hello</p>")).await;

    let service = create_service(create_test_config(1, 5));
    let trigger = service
        .trigger_crawl(&format!("  {}/  ", mock_server.uri()))
        .unwrap();

    assert_eq!(trigger.job_state, JobState::Pending);
    assert_eq!(trigger.run_state, RunState::Queued);

    trigger.handle.await.unwrap().unwrap();

    let status = service.job_status(trigger.job_id).unwrap();
    assert_eq!(status.job.state, JobState::Completed);
    assert!(status.job.started_at.is_some());
    assert!(status.job.completed_at.is_some());

    let run = status.run.unwrap();
    assert_eq!(run.id, trigger.run_id);
    assert!(run.started_at.is_some());
    assert!(run.completed_at.is_some());
}

#[tokio::test]
async fn test_retrigger_reuses_job() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/",
        html_page("Home", r#"<p>Hello</p><a href="/about">About</a>"#),
    )
    .await;
    mount_page(&mock_server, "/about", html_page("About", "<p>About us</p>")).await;

    let service = create_service(create_test_config(1, 5));
    let seed = format!("{}/", mock_server.uri());

    let first = service.trigger_crawl(&seed).unwrap();
    first.handle.await.unwrap().unwrap();

    let second = service.trigger_crawl(&seed).unwrap();
    assert_eq!(second.job_id, first.job_id);
    assert_ne!(second.run_id, first.run_id);
    assert_eq!(second.job_state, JobState::Pending);
    second.handle.await.unwrap().unwrap();

    assert_eq!(service.list_jobs().unwrap().len(), 1);

    // Re-crawled URLs reuse their existing page records
    assert_eq!(service.list_pages(first.job_id).unwrap().len(), 2);

    let status = service.job_status(first.job_id).unwrap();
    assert_eq!(status.run.unwrap().id, second.run_id);
}

#[tokio::test]
async fn test_invalid_seed_is_rejected_without_side_effects() {
    let service = create_service(create_test_config(1, 5));

    for seed in ["", "   ", "not a url", "ftp://example.com/file"] {
        let result = service.trigger_crawl(seed);
        assert!(
            matches!(result, Err(ForgeError::Validation(_))),
            "seed {:?} should be rejected",
            seed
        );
    }

    assert!(service.list_jobs().unwrap().is_empty());
    let runs = with_storage(service.storage(), |s| s.get_latest_run(1)).unwrap();
    assert!(runs.is_none());
}

#[tokio::test]
async fn test_fetch_sends_client_signature() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "TestBot/1.0"))
        .respond_with(html_page("Home", "<p>Hi</p>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(1, 5);
    let client = build_http_client(&config.crawler, &config.user_agent).unwrap();
    let body = fetch_page(&client, &format!("{}/", mock_server.uri()))
        .await
        .unwrap();
    assert!(body.contains("<title>Home</title>"));

    mock_server.verify().await;
}

#[tokio::test]
async fn test_fetch_follows_redirects() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/old",
        ResponseTemplate::new(301).insert_header("location", "/new"),
    )
    .await;
    mount_page(&mock_server, "/new", html_page("New", "<p>Moved here</p>")).await;

    let config = create_test_config(1, 5);
    let client = build_http_client(&config.crawler, &config.user_agent).unwrap();
    let body = fetch_page(&client, &format!("{}/old", mock_server.uri()))
        .await
        .unwrap();
    assert!(body.contains("Moved here"));
}

#[tokio::test]
async fn test_fetch_redirect_limit() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/a",
        ResponseTemplate::new(302).insert_header("location", "/b"),
    )
    .await;
    mount_page(
        &mock_server,
        "/b",
        ResponseTemplate::new(302).insert_header("location", "/c"),
    )
    .await;
    mount_page(&mock_server, "/c", html_page("C", "<p>End</p>")).await;

    let mut config = create_test_config(1, 5);
    config.crawler.max_redirects = 1;
    let client = build_http_client(&config.crawler, &config.user_agent).unwrap();

    let err = fetch_page(&client, &format!("{}/a", mock_server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.cause, FetchFailure::TooManyRedirects);
}

#[tokio::test]
async fn test_fetch_non_success_status() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/broken", ResponseTemplate::new(500)).await;

    let config = create_test_config(1, 5);
    let client = build_http_client(&config.crawler, &config.user_agent).unwrap();

    let url = format!("{}/broken", mock_server.uri());
    let err = fetch_page(&client, &url).await.unwrap_err();
    assert_eq!(err.cause, FetchFailure::Status(500));
    assert_eq!(err.url, url);
}

#[tokio::test]
async fn test_crawl_waits_politeness_delay_between_fetches() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/",
        html_page(
            "Home",
            r#"<a href="/a">A</a><a href="/b">B</a><a href="/c">C</a>"#,
        ),
    )
    .await;
    for route in ["/a", "/b", "/c"] {
        mount_page(&mock_server, route, html_page("Leaf", "<p>Leaf page</p>")).await;
    }

    let mut config = create_test_config(1, 10);
    config.crawler.politeness_delay_ms = 100;
    let service = create_service(config);

    let started = Instant::now();
    let summary = service
        .trigger_crawl(&format!("{}/", mock_server.uri()))
        .unwrap()
        .handle
        .await
        .unwrap()
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(summary.pages_crawled, 4);
    assert!(
        elapsed >= Duration::from_millis(300),
        "four fetches took only {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_recent_pages_span_jobs() {
    let first_site = MockServer::start().await;
    mount_page(&first_site, "/", html_page("First", "<p>First site</p>")).await;
    let second_site = MockServer::start().await;
    mount_page(&second_site, "/", html_page("Second", "<p>Second site</p>")).await;

    let service = create_service(create_test_config(1, 5));
    for site in [&first_site, &second_site] {
        let trigger = service.trigger_crawl(&format!("{}/", site.uri())).unwrap();
        trigger.handle.await.unwrap().unwrap();
    }

    let recent = service.list_recent_pages(100).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].title, "Second");
    assert_ne!(recent[0].job_id, recent[1].job_id);

    let newest = service.list_recent_pages(1).unwrap();
    assert_eq!(newest.len(), 1);
    assert_eq!(newest[0].title, "Second");
}
