// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{engine_with_timeout, read_warc, responses, run_options, write_url_list};
use harvestrs::application::use_cases::HarvestEngine;
use harvestrs::infrastructure::storage::WarcWriter;
use harvestrs::queue::url_source::{InputMode, UrlSource};
use harvestrs::workers::stage::ArchiveStage;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_url_gets_exactly_one_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/ok/\d+$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("payload")
                .set_delay(Duration::from_millis(20)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/err/\d+$"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let urls: Vec<String> = (0..120)
        .map(|i| {
            if i % 3 == 0 {
                format!("{}/err/{}", server.uri(), i)
            } else {
                format!("{}/ok/{}", server.uri(), i)
            }
        })
        .collect();

    let dir = TempDir::new().unwrap();
    let input = write_url_list(dir.path(), &urls);
    let output = dir.path().join("bulk.warc.gz");

    let source = UrlSource::open(&input, InputMode::Archive, None).unwrap();
    let run = HarvestEngine::new(
        engine_with_timeout(5, false),
        Arc::new(ArchiveStage),
        WarcWriter::create(&output).unwrap(),
        &output,
        run_options(8, Duration::from_secs(10)),
    )
    .run(source);
    let summary = tokio::time::timeout(Duration::from_secs(60), run)
        .await
        .expect("run did not drain")
        .unwrap();

    let stats = &summary.stats;
    assert_eq!(stats.seen, 120);
    assert_eq!(stats.saved + stats.failed, stats.seen);
    assert_eq!(stats.count_of("http_error"), 40);
    assert_eq!(stats.saved, 80);
    assert_eq!(responses(&read_warc(&output)).len() as u64, stats.saved);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_limit_stops_reading_input() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let urls: Vec<String> = (0..50)
        .map(|i| format!("{}/page/{}", server.uri(), i))
        .collect();
    let dir = TempDir::new().unwrap();
    let input = write_url_list(dir.path(), &urls);
    let output = dir.path().join("limited.warc.gz");

    let source = UrlSource::open(&input, InputMode::Archive, Some(7)).unwrap();
    let mut options = run_options(4, Duration::from_secs(10));
    options.limit = Some(7);
    let summary = HarvestEngine::new(
        engine_with_timeout(5, false),
        Arc::new(ArchiveStage),
        WarcWriter::create(&output).unwrap(),
        &output,
        options,
    )
    .run(source)
    .await
    .unwrap();

    assert_eq!(summary.stats.seen, 7);
    assert_eq!(summary.stats.saved, 7);
    assert_eq!(server.received_requests().await.unwrap().len(), 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_more_workers_than_urls_still_terminates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("few.warc.gz");
    let input = write_url_list(dir.path(), &[format!("{}/only", server.uri())]);

    let source = UrlSource::open(&input, InputMode::Archive, None).unwrap();
    let run = HarvestEngine::new(
        engine_with_timeout(5, false),
        Arc::new(ArchiveStage),
        WarcWriter::create(&output).unwrap(),
        &output,
        run_options(32, Duration::from_secs(10)),
    )
    .run(source);
    let summary = tokio::time::timeout(Duration::from_secs(20), run)
        .await
        .expect("run did not terminate")
        .unwrap();

    assert_eq!(summary.stats.seen, 1);
    assert_eq!(summary.stats.saved, 1);
}
