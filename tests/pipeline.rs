//! Integration tests for the crawl engine, converter, and full
//! pipeline, driven entirely by the deterministic mocks.

use std::time::Duration;

use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use webdistill::testing::{page_html, MockFetcher, MockOracle};
use webdistill::{
    pipeline, ConvertConfig, Converter, CrawlConfig, CrawlEngine, CrawlOutcome, DataStore,
    RunConfig, Schema, SchemaCoordinator,
};

/// Crawl config with no pacing, for fast tests.
fn crawl_config(seed: &str) -> CrawlConfig {
    CrawlConfig::new(seed).with_delay(Duration::ZERO)
}

/// Convert config with no pacing, for fast tests.
fn convert_config() -> ConvertConfig {
    ConvertConfig::new().with_conversion_delay(Duration::ZERO)
}

/// A site whose seed links to three in-domain and two out-of-domain
/// pages.
fn mixed_domain_site() -> MockFetcher {
    MockFetcher::new()
        .with_page(
            "https://example.com/",
            page_html(
                "Home",
                &[
                    "/a",
                    "/b",
                    "/c",
                    "https://other.com/x",
                    "https://other.com/y",
                ],
            ),
        )
        .with_page("https://example.com/a", page_html("A", &[]))
        .with_page("https://example.com/b", page_html("B", &[]))
        .with_page("https://example.com/c", page_html("C", &[]))
}

#[tokio::test]
async fn same_domain_crawl_stops_when_frontier_empties() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::open(dir.path()).unwrap();
    let fetcher = mixed_domain_site();

    let config = crawl_config("https://example.com/")
        .with_max_depth(1)
        .with_max_pages(10);
    let report = CrawlEngine::new(&fetcher, config, &store)
        .crawl()
        .await
        .unwrap();

    // Seed + the 3 in-domain links, even though max_pages allows more
    assert_eq!(report.pages_fetched, 4);
    assert_eq!(report.outcome, CrawlOutcome::Completed);
    assert_eq!(fetcher.fetch_call_count(), 4);

    let urls: Vec<_> = report.pages.iter().map(|p| p.source_url.as_str()).collect();
    assert!(!urls.iter().any(|u| u.contains("other.com")));
}

#[tokio::test]
async fn seed_is_fetched_first_and_never_refetched() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::open(dir.path()).unwrap();
    // a and b link back to the seed and to each other
    let fetcher = MockFetcher::new()
        .with_page("https://example.com/", page_html("Home", &["/a", "/b"]))
        .with_page("https://example.com/a", page_html("A", &["/", "/b"]))
        .with_page("https://example.com/b", page_html("B", &["/", "/a"]));

    let config = crawl_config("https://example.com/")
        .with_max_depth(3)
        .with_max_pages(10);
    let report = CrawlEngine::new(&fetcher, config, &store)
        .crawl()
        .await
        .unwrap();

    assert_eq!(report.pages_fetched, 3);
    let calls = fetcher.fetch_calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0], "https://example.com/");
    // No URL requested twice
    let mut deduped = calls.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), calls.len());
}

#[tokio::test]
async fn depth_zero_fetches_only_the_seed() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::open(dir.path()).unwrap();
    let fetcher = mixed_domain_site();

    let config = crawl_config("https://example.com/")
        .with_max_depth(0)
        .with_max_pages(10);
    let report = CrawlEngine::new(&fetcher, config, &store)
        .crawl()
        .await
        .unwrap();

    assert_eq!(report.pages_fetched, 1);
    assert_eq!(fetcher.fetch_call_count(), 1);
}

#[tokio::test]
async fn page_budget_bounds_an_unbounded_chain() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::open(dir.path()).unwrap();

    // A long chain standing in for an effectively infinite site
    let mut fetcher = MockFetcher::new();
    for i in 0..50 {
        let next = format!("/page{}", i + 1);
        fetcher = fetcher.with_page(
            format!("https://example.com/page{i}"),
            page_html(&format!("Page {i}"), &[next.as_str()]),
        );
    }

    let config = crawl_config("https://example.com/page0")
        .with_max_depth(100)
        .with_max_pages(5);
    let report = CrawlEngine::new(&fetcher, config, &store)
        .crawl()
        .await
        .unwrap();

    assert_eq!(fetcher.fetch_call_count(), 5);
    assert_eq!(report.pages_fetched, 5);
    assert_eq!(report.outcome, CrawlOutcome::BudgetExhausted);
}

#[tokio::test]
async fn failed_fetches_consume_budget_and_are_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::open(dir.path()).unwrap();
    let fetcher = MockFetcher::new()
        .with_page("https://example.com/", page_html("Home", &["/ok", "/bad"]))
        .with_page("https://example.com/ok", page_html("OK", &[]))
        .with_failure("https://example.com/bad");

    let config = crawl_config("https://example.com/")
        .with_max_depth(1)
        .with_max_pages(10);
    let report = CrawlEngine::new(&fetcher, config, &store)
        .crawl()
        .await
        .unwrap();

    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.pages_failed, 1);

    let progress = store.load_crawl_progress().unwrap().unwrap();
    assert_eq!(progress.pages_attempted, 3);
    assert!(progress.failures.contains_key("https://example.com/bad"));
    // Failed URL is marked done, so a resumed run will not retry it
    assert!(progress.visited.contains("https://example.com/bad"));
}

#[tokio::test]
async fn redirects_dedup_on_the_final_url() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::open(dir.path()).unwrap();
    let fetcher = MockFetcher::new()
        .with_page(
            "https://example.com/",
            page_html("Home", &["/alias", "/www"]),
        )
        .with_page("https://example.com/www", page_html("Target", &[]))
        .with_redirect("https://example.com/alias", "https://example.com/www");

    let config = crawl_config("https://example.com/")
        .with_max_depth(1)
        .with_max_pages(10);
    let report = CrawlEngine::new(&fetcher, config, &store)
        .crawl()
        .await
        .unwrap();

    // /alias redirected onto /www; only one record for the target
    let target_records = report
        .pages
        .iter()
        .filter(|p| p.source_url == "https://example.com/www")
        .count();
    assert_eq!(target_records, 1);
    assert_eq!(report.pages_fetched, 2);
}

#[tokio::test]
async fn completed_crawl_resumes_with_zero_fetches() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::open(dir.path()).unwrap();
    let config = crawl_config("https://example.com/")
        .with_max_depth(1)
        .with_max_pages(10);

    let first_fetcher = mixed_domain_site();
    let first = CrawlEngine::new(&first_fetcher, config.clone(), &store)
        .crawl()
        .await
        .unwrap();
    assert_eq!(first.pages_fetched, 4);

    // Fresh fetcher proves nothing is re-fetched on resume
    let second_fetcher = mixed_domain_site();
    let second = CrawlEngine::new(&second_fetcher, config, &store)
        .crawl()
        .await
        .unwrap();

    assert_eq!(second_fetcher.fetch_call_count(), 0);
    assert_eq!(second.outcome, CrawlOutcome::Completed);

    let first_urls: Vec<_> = first.pages.iter().map(|p| p.source_url.clone()).collect();
    let second_urls: Vec<_> = second.pages.iter().map(|p| p.source_url.clone()).collect();
    assert_eq!(first_urls, second_urls);
}

#[tokio::test]
async fn budget_exhausted_crawl_resumes_where_it_stopped() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::open(dir.path()).unwrap();

    let site = || {
        MockFetcher::new()
            .with_page(
                "https://example.com/",
                page_html("Home", &["/a", "/b", "/c"]),
            )
            .with_page("https://example.com/a", page_html("A", &[]))
            .with_page("https://example.com/b", page_html("B", &[]))
            .with_page("https://example.com/c", page_html("C", &[]))
    };

    let small_budget = crawl_config("https://example.com/")
        .with_max_depth(1)
        .with_max_pages(2);
    let first_fetcher = site();
    let first = CrawlEngine::new(&first_fetcher, small_budget, &store)
        .crawl()
        .await
        .unwrap();
    assert_eq!(first.outcome, CrawlOutcome::BudgetExhausted);
    assert_eq!(first.pages_fetched, 2);

    let full_budget = crawl_config("https://example.com/")
        .with_max_depth(1)
        .with_max_pages(10);
    let second_fetcher = site();
    let second = CrawlEngine::new(&second_fetcher, full_budget, &store)
        .crawl()
        .await
        .unwrap();

    // Only the two remaining pages are fetched
    assert_eq!(second_fetcher.fetch_call_count(), 2);
    assert_eq!(second.pages_fetched, 4);
    assert_eq!(second.outcome, CrawlOutcome::Completed);
}

#[tokio::test]
async fn cancelled_crawl_suspends_before_fetching() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::open(dir.path()).unwrap();
    let fetcher = mixed_domain_site();

    let cancel = CancellationToken::new();
    cancel.cancel();

    let config = crawl_config("https://example.com/")
        .with_max_depth(1)
        .with_max_pages(10);
    let report = CrawlEngine::new(&fetcher, config, &store)
        .with_cancellation(cancel)
        .crawl()
        .await
        .unwrap();

    assert_eq!(report.outcome, CrawlOutcome::Suspended);
    assert_eq!(fetcher.fetch_call_count(), 0);
    // The seed survives in the persisted frontier for resumption
    let progress = store.load_crawl_progress().unwrap().unwrap();
    assert_eq!(progress.frontier.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn crawl_waits_the_configured_delay_between_fetches() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::open(dir.path()).unwrap();
    let fetcher = mixed_domain_site();

    let config = CrawlConfig::new("https://example.com/")
        .with_delay(Duration::from_secs(1))
        .with_max_depth(1)
        .with_max_pages(10);

    let start = tokio::time::Instant::now();
    let report = CrawlEngine::new(&fetcher, config, &store)
        .crawl()
        .await
        .unwrap();

    assert_eq!(report.pages_fetched, 4);
    // First fetch is immediate; each later fetch waits out the
    // interval, and nothing stacks extra sleep on top
    assert_eq!(start.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn conversion_waits_the_configured_delay_between_oracle_calls() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::open(dir.path()).unwrap();
    let schema = Schema::new("pages").with_field("title", "string");

    let pages: Vec<_> = (0..3)
        .map(|i| {
            webdistill::RawPageRecord::new(format!("https://example.com/{i}"), "text")
                .with_title(format!("Page {i}"))
        })
        .collect();

    let oracle = MockOracle::new();
    let config = ConvertConfig::new().with_conversion_delay(Duration::from_secs(2));
    let converter = Converter::new(&oracle, config, &store);

    let start = tokio::time::Instant::now();
    let report = converter.convert_all(&pages, &schema, "test").await.unwrap();

    assert_eq!(report.records_converted, 3);
    assert_eq!(oracle.extract_call_count(), 3);
    assert_eq!(start.elapsed(), Duration::from_secs(4));
}

#[tokio::test]
async fn reused_schema_drops_fields_it_does_not_declare() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::open(dir.path()).unwrap();

    // Persisted schema from an earlier run declares only {a, b}
    let reused = Schema::new("listings")
        .with_field("a", "string")
        .with_field("b", "string");
    store.save_schema(&reused).unwrap();

    let pages = vec![
        webdistill::RawPageRecord::new("https://example.com/1", "text one").with_title("One"),
    ];

    // The oracle insists the content has a third field c
    let oracle = MockOracle::new().with_record(
        "https://example.com/1",
        json!({"a": "1", "b": "2", "c": "surplus"})
            .as_object()
            .unwrap()
            .clone(),
    );

    let config = convert_config().with_reuse_schema(store.schema_path());
    let coordinator = SchemaCoordinator::new(&oracle, &store);
    let schema = coordinator.obtain_schema(&pages, &config).await.unwrap();
    assert_eq!(oracle.infer_calls(), 0);

    let converter = Converter::new(&oracle, config, &store);
    let report = converter.convert_all(&pages, &schema, "test").await.unwrap();
    assert_eq!(report.records_converted, 1);

    let progress = store.load_conversion_progress().unwrap().unwrap();
    let record = &progress.structured_records[0];
    assert_eq!(record.get("a").unwrap(), "1");
    assert_eq!(record.get("b").unwrap(), "2");
    assert!(record.get("c").is_none());
    assert_eq!(record.fields.len(), 2);
}

#[tokio::test]
async fn interrupted_conversion_resumes_without_reconverting() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::open(dir.path()).unwrap();
    let schema = Schema::new("pages").with_field("title", "string");

    let pages: Vec<_> = (0..12)
        .map(|i| {
            webdistill::RawPageRecord::new(format!("https://example.com/{i}"), "text")
                .with_title(format!("Page {i}"))
        })
        .collect();

    // First invocation sees only the first batch of 5 before the
    // interruption
    let first_oracle = MockOracle::new();
    let converter = Converter::new(&first_oracle, convert_config(), &store);
    converter
        .convert_all(&pages[..5], &schema, "test")
        .await
        .unwrap();
    assert_eq!(first_oracle.extract_call_count(), 5);

    // Re-invocation processes only the remaining 7
    let second_oracle = MockOracle::new();
    let converter = Converter::new(&second_oracle, convert_config(), &store);
    let report = converter.convert_all(&pages, &schema, "test").await.unwrap();

    assert_eq!(second_oracle.extract_call_count(), 7);
    assert_eq!(report.records_converted, 12);

    let progress = store.load_conversion_progress().unwrap().unwrap();
    let urls: Vec<_> = progress
        .structured_records
        .iter()
        .map(|r| r.metadata.source_url.clone())
        .collect();
    let expected: Vec<_> = pages.iter().map(|p| p.source_url.clone()).collect();
    assert_eq!(urls, expected);
}

#[tokio::test]
async fn persistent_extraction_failure_is_skipped_after_one_retry() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::open(dir.path()).unwrap();
    let schema = Schema::new("pages").with_field("title", "string");

    let pages = vec![
        webdistill::RawPageRecord::new("https://example.com/ok", "text").with_title("OK"),
        webdistill::RawPageRecord::new("https://example.com/flaky", "text").with_title("Flaky"),
        webdistill::RawPageRecord::new("https://example.com/broken", "text").with_title("Broken"),
    ];

    let oracle = MockOracle::new()
        .with_extract_failures("https://example.com/flaky", 1)
        .with_extract_failures("https://example.com/broken", 2);

    let converter = Converter::new(&oracle, convert_config(), &store);
    let report = converter.convert_all(&pages, &schema, "test").await.unwrap();

    // Flaky succeeded on its retry; broken was skipped after its retry
    assert_eq!(report.records_converted, 2);
    assert_eq!(report.records_failed, 1);

    let progress = store.load_conversion_progress().unwrap().unwrap();
    assert_eq!(progress.errors.len(), 1);
    assert_eq!(progress.errors[0].url, "https://example.com/broken");
    // The failed page is done: a later invocation will not retry it
    assert!(progress.is_done("https://example.com/broken"));

    let before = oracle.extract_call_count();
    let converter = Converter::new(&oracle, convert_config(), &store);
    converter.convert_all(&pages, &schema, "test").await.unwrap();
    assert_eq!(oracle.extract_call_count(), before);
}

#[tokio::test]
async fn schema_violating_output_becomes_an_error_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::open(dir.path()).unwrap();
    let schema = Schema::new("pages")
        .with_field("a", "string")
        .with_field("b", "string");

    let pages =
        vec![webdistill::RawPageRecord::new("https://example.com/odd", "text").with_title("Odd")];

    // Candidate shares no fields with the schema, twice in a row
    let oracle = MockOracle::new().with_record(
        "https://example.com/odd",
        json!({"x": 1}).as_object().unwrap().clone(),
    );

    let converter = Converter::new(&oracle, convert_config(), &store);
    let report = converter.convert_all(&pages, &schema, "test").await.unwrap();

    assert_eq!(report.records_converted, 0);
    assert_eq!(report.records_failed, 1);
    assert_eq!(oracle.extract_call_count(), 2);
}

#[tokio::test]
async fn null_filling_keeps_every_schema_field_present() {
    let dir = tempfile::tempdir().unwrap();
    let store = DataStore::open(dir.path()).unwrap();
    let schema = Schema::new("pages")
        .with_field("title", "string")
        .with_field("missing", "string");

    let pages =
        vec![webdistill::RawPageRecord::new("https://example.com/p", "text").with_title("P")];
    let oracle = MockOracle::new().with_record(
        "https://example.com/p",
        json!({"title": "P"}).as_object().unwrap().clone(),
    );

    let converter = Converter::new(&oracle, convert_config(), &store);
    converter.convert_all(&pages, &schema, "test").await.unwrap();

    let progress = store.load_conversion_progress().unwrap().unwrap();
    let record = &progress.structured_records[0];
    assert_eq!(record.get("missing").unwrap(), &Value::Null);
}

#[tokio::test]
async fn full_pipeline_produces_a_summary() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = mixed_domain_site();
    let oracle = MockOracle::new()
        .with_schema(Schema::new("site pages").with_field("title", "string"));

    let config = RunConfig::new("https://example.com/", dir.path())
        .with_crawl(
            crawl_config("https://example.com/")
                .with_max_depth(1)
                .with_max_pages(10),
        )
        .with_convert(convert_config());

    let summary = pipeline::run(&config, &fetcher, &oracle).await.unwrap();

    assert_eq!(summary.pages_fetched, 4);
    assert_eq!(summary.pages_failed, 0);
    assert_eq!(summary.records_converted, 4);
    assert_eq!(summary.records_failed, 0);
    assert_eq!(summary.crawl_outcome, Some(CrawlOutcome::Completed));
    assert_eq!(oracle.infer_calls(), 1);

    // All four persisted snapshots exist
    assert!(dir.path().join("crawl_progress.json").exists());
    assert!(dir.path().join("scraped_data.json").exists());
    assert!(dir.path().join("schema_analysis.json").exists());
    assert!(dir.path().join("conversion_progress.json").exists());
}

#[tokio::test]
async fn skip_conversion_never_touches_the_oracle() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = mixed_domain_site();
    let oracle = MockOracle::new();

    let config = RunConfig::new("https://example.com/", dir.path())
        .with_crawl(
            crawl_config("https://example.com/")
                .with_max_depth(1)
                .with_max_pages(10),
        )
        .skip_conversion();

    let summary = pipeline::run(&config, &fetcher, &oracle).await.unwrap();

    assert_eq!(summary.pages_fetched, 4);
    assert_eq!(summary.records_converted, 0);
    assert_eq!(oracle.infer_calls(), 0);
    assert_eq!(oracle.extract_call_count(), 0);
    assert!(dir.path().join("scraped_data.json").exists());
}

#[tokio::test]
async fn inference_failure_aborts_conversion_but_keeps_raw_data() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = mixed_domain_site();
    let oracle = MockOracle::new().with_inference_failure();

    let config = RunConfig::new("https://example.com/", dir.path()).with_crawl(
        crawl_config("https://example.com/")
            .with_max_depth(1)
            .with_max_pages(10),
    );

    let result = pipeline::run(&config, &fetcher, &oracle).await;
    assert!(result.is_err());

    // The crawl's output survives, so conversion can be retried alone
    let store = DataStore::open(dir.path()).unwrap();
    let raw = store.load_raw_pages().unwrap().unwrap();
    assert_eq!(raw.len(), 4);
}
