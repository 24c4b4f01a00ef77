//! Integration tests for `run_feed` against a wiremock feed server and the
//! in-memory store.

mod common;

use std::time::Duration;

use feedhub_core::{ErrorType, FeedType};
use feedhub_ingest::{run_feed, FeedOutcome};
use feedhub_scraper::FeedClient;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::MemoryStore;

const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Pipeline Test</title>
    <link>https://pipeline.example.com/</link>
    <language>en</language>
    <item>
      <title>Dated</title>
      <link>https://pipeline.example.com/dated</link>
      <pubDate>Mon, 02 Jan 2006 15:04:05 GMT</pubDate>
    </item>
    <item>
      <title>Loose date</title>
      <link>https://pipeline.example.com/loose</link>
      <pubDate>2023-11-05 08:15:00</pubDate>
    </item>
    <item>
      <title>Undated</title>
      <link>https://pipeline.example.com/undated</link>
      <pubDate>sometime last week</pubDate>
    </item>
    <item>
      <title>No link</title>
      <pubDate>Mon, 02 Jan 2006 15:04:05 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

fn test_client() -> FeedClient {
    FeedClient::new(5, "feedhub-test/0.1", 0, 0).expect("failed to build test FeedClient")
}

async fn serve(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn stores_dated_linked_items_and_skips_the_rest() {
    let server = MockServer::start().await;
    serve(&server, "/feed.xml", ResponseTemplate::new(200).set_body_string(RSS)).await;

    let store = MemoryStore::new();
    let feed = store.add_feed(&format!("{}/feed.xml", server.uri()), None);

    let summary = run_feed(&store, &test_client(), &feed).await;

    assert_eq!(summary.outcome, FeedOutcome::Completed);
    assert_eq!(summary.items_seen, 4);
    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.skipped_undated, 1);
    assert_eq!(summary.skipped_no_link, 1);
    assert_eq!(store.post_count(feed.id), 2);
    assert!(store.error_rows(feed.id).is_empty());

    let state = store.state();
    let first = &state.posts[0].post;
    assert_eq!(first.channel_title, "Pipeline Test");
    assert_eq!(first.channel_language.as_deref(), Some("en"));
    assert_eq!(first.item_link, "https://pipeline.example.com/dated");
}

#[tokio::test]
async fn first_fetch_records_feed_type_and_channel_image() {
    let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Pictured</title>
  <id>urn:uuid:pictured</id>
  <updated>2024-03-02T10:00:00Z</updated>
  <logo>https://pictured.example.com/logo.png</logo>
  <entry>
    <title>One</title>
    <link href="https://pictured.example.com/one"/>
    <id>urn:uuid:one</id>
    <updated>2024-03-01T10:00:00Z</updated>
  </entry>
</feed>"#;
    let server = MockServer::start().await;
    serve(&server, "/atom.xml", ResponseTemplate::new(200).set_body_string(atom)).await;

    let store = MemoryStore::new();
    let feed = store.add_feed(&format!("{}/atom.xml", server.uri()), None);
    let client = test_client();

    let summary = run_feed(&store, &client, &feed).await;
    assert_eq!(summary.inserted, 1);

    let stored = store.feed(feed.id);
    assert_eq!(stored.kind().unwrap(), Some(FeedType::Atom));
    assert_eq!(
        stored.image_url.as_deref(),
        Some("https://pictured.example.com/logo.png")
    );

    // A row that already agrees is not written again.
    run_feed(&store, &client, &stored).await;
    let writes = store
        .state()
        .calls
        .iter()
        .filter(|c| c.starts_with("metadata:"))
        .count();
    assert_eq!(writes, 1);
}

#[tokio::test]
async fn refetching_the_same_feed_stores_nothing_new() {
    let server = MockServer::start().await;
    serve(&server, "/feed.xml", ResponseTemplate::new(200).set_body_string(RSS)).await;

    let store = MemoryStore::new();
    let feed = store.add_feed(&format!("{}/feed.xml", server.uri()), None);
    let client = test_client();

    run_feed(&store, &client, &feed).await;
    let second = run_feed(&store, &client, &feed).await;

    assert_eq!(second.outcome, FeedOutcome::Completed);
    assert_eq!(second.inserted, 0);
    assert_eq!(second.duplicates, 2);
    assert_eq!(store.post_count(feed.id), 2);
    assert!(store.error_rows(feed.id).is_empty());
}

#[tokio::test]
async fn feed_is_marked_fetched_before_download_even_when_it_fails() {
    let server = MockServer::start().await;
    serve(&server, "/broken.xml", ResponseTemplate::new(500)).await;

    let store = MemoryStore::new();
    let feed = store.add_feed(&format!("{}/broken.xml", server.uri()), None);

    let summary = run_feed(&store, &test_client(), &feed).await;

    assert_eq!(summary.outcome, FeedOutcome::Failed);
    let refreshed = store.feed(feed.id);
    assert!(refreshed.last_fetched_at.is_some());
    assert_eq!(refreshed.version, 2);
    assert_eq!(store.state().calls, vec![format!("mark:{}", feed.id)]);
}

#[tokio::test]
async fn repeated_http_failures_collapse_into_one_error_row() {
    let server = MockServer::start().await;
    serve(&server, "/missing.xml", ResponseTemplate::new(404)).await;

    let store = MemoryStore::new();
    let feed = store.add_feed(&format!("{}/missing.xml", server.uri()), None);
    let client = test_client();

    for _ in 0..3 {
        run_feed(&store, &client, &feed).await;
    }

    let rows = store.error_rows(feed.id);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].error_type, ErrorType::HttpStatus.as_str());
    assert_eq!(rows[0].status_code, Some(404));
    assert_eq!(rows[0].occurrence_count, 3);
    assert_eq!(rows[0].retry_attempts, 2);
}

#[tokio::test]
async fn non_feed_document_is_skipped_without_error_log() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/page.html",
        ResponseTemplate::new(200).set_body_string("<html><body>hello</body></html>"),
    )
    .await;

    let store = MemoryStore::new();
    let feed = store.add_feed(&format!("{}/page.html", server.uri()), None);

    let summary = run_feed(&store, &test_client(), &feed).await;

    assert_eq!(summary.outcome, FeedOutcome::Skipped);
    assert!(store.error_rows(feed.id).is_empty());
}

#[tokio::test]
async fn timeout_is_skipped_without_error_log() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/slow.xml",
        ResponseTemplate::new(200)
            .set_body_string(RSS)
            .set_delay(Duration::from_secs(3)),
    )
    .await;

    let store = MemoryStore::new();
    let feed = store.add_feed(&format!("{}/slow.xml", server.uri()), None);
    let client = FeedClient::new(1, "feedhub-test/0.1", 0, 0).expect("client");

    let summary = run_feed(&store, &client, &feed).await;

    assert_eq!(summary.outcome, FeedOutcome::Skipped);
    assert!(store.error_rows(feed.id).is_empty());
    assert_eq!(store.post_count(feed.id), 0);
}

#[tokio::test]
async fn malformed_feed_is_recorded_as_parse_error() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/bad.xml",
        ResponseTemplate::new(200)
            .set_body_string("<rss version=\"2.0\"><channel><title>x</title><item><title"),
    )
    .await;

    let store = MemoryStore::new();
    let feed = store.add_feed(&format!("{}/bad.xml", server.uri()), None);

    let summary = run_feed(&store, &test_client(), &feed).await;

    assert_eq!(summary.outcome, FeedOutcome::Failed);
    let rows = store.error_rows(feed.id);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].error_type, ErrorType::Parse.as_str());
    assert_eq!(rows[0].status_code, None);
}

#[tokio::test]
async fn unknown_feed_is_recorded_as_storage_error_and_not_fetched() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
        .expect(0)
        .mount(&server)
        .await;

    let store = MemoryStore::new();
    // Built by hand so it never lands in the store.
    let ghost = {
        let other = MemoryStore::new();
        other.add_feed(&format!("{}/feed.xml", server.uri()), None)
    };

    let summary = run_feed(&store, &test_client(), &ghost).await;

    assert_eq!(summary.outcome, FeedOutcome::Failed);
    let rows = store.error_rows(ghost.id);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].error_type, ErrorType::Storage.as_str());
}
