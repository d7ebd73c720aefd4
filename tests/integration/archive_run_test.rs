// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    engine_with_timeout, read_warc, responses, run_options, write_url_list,
};
use harvestrs::application::use_cases::HarvestEngine;
use harvestrs::infrastructure::storage::WarcWriter;
use harvestrs::queue::url_source::{InputMode, UrlSource};
use harvestrs::workers::stage::ArchiveStage;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_archive_run_classifies_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html><body>hello</body></html>", "text/html"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let input = write_url_list(
        dir.path(),
        &[
            format!("{}/ok", server.uri()),
            format!("{}/missing", server.uri()),
            format!("{}/slow", server.uri()),
        ],
    );
    let output = dir.path().join("out.warc.gz");

    let source = UrlSource::open(&input, InputMode::Archive, None).unwrap();
    let summary = HarvestEngine::new(
        engine_with_timeout(1, false),
        Arc::new(ArchiveStage),
        WarcWriter::create(&output).unwrap(),
        &output,
        run_options(3, Duration::from_secs(6)),
    )
    .run(source)
    .await
    .unwrap();

    assert_eq!(summary.stats.seen, 3);
    assert_eq!(summary.stats.saved, 1);
    assert_eq!(summary.stats.failed, 2);
    assert_eq!(summary.stats.count_of("http_error"), 1);
    assert_eq!(summary.stats.count_of("timeout"), 1);

    let records = read_warc(&output);
    assert_eq!(records[0].header("WARC-Type"), Some("warcinfo"));
    let saved = responses(&records);
    assert_eq!(saved.len(), 1);

    let record = saved[0];
    let target = format!("{}/ok", server.uri());
    assert_eq!(record.header("WARC-Target-URI"), Some(target.as_str()));
    assert_eq!(
        record.header("Content-Type"),
        Some("application/http; msgtype=response")
    );
    assert!(record.header("WARC-Record-ID").unwrap().starts_with("<urn:uuid:"));
    assert!(record.header("WARC-Date").unwrap().ends_with('Z'));

    let block = record.block_text();
    assert!(block.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(block.ends_with("<html><body>hello</body></html>"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_redirect_keeps_requested_and_resolved_uri() {
    let origin = MockServer::start().await;
    let mirror = MockServer::start().await;
    let final_url = format!("{}/final", mirror.uri());

    Mock::given(method("GET"))
        .and(path("/start"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", final_url.as_str()))
        .mount(&origin)
        .await;
    Mock::given(method("GET"))
        .and(path("/final"))
        .respond_with(ResponseTemplate::new(200).set_body_string("moved here"))
        .mount(&mirror)
        .await;

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("redirect.warc.gz");
    let start = format!("{}/start", origin.uri());

    let input = write_url_list(dir.path(), &[start.clone()]);
    let source = UrlSource::open(&input, InputMode::Archive, None).unwrap();
    let summary = HarvestEngine::new(
        engine_with_timeout(5, false),
        Arc::new(ArchiveStage),
        WarcWriter::create(&output).unwrap(),
        &output,
        run_options(1, Duration::from_secs(10)),
    )
    .run(source)
    .await
    .unwrap();

    assert_eq!(summary.stats.saved, 1);
    let records = read_warc(&output);
    let saved = responses(&records);
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].header("WARC-Target-URI"), Some(start.as_str()));
    assert_eq!(saved[0].header("WARC-Resolved-URI"), Some(final_url.as_str()));
    assert!(saved[0].block_text().ends_with("moved here"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_archive_mode_skips_non_http_lines() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let input = write_url_list(
        dir.path(),
        &[
            format!("{}/a", server.uri()),
            "ftp://example.com/file".to_string(),
            "".to_string(),
            "not a url".to_string(),
            format!("{}/b", server.uri()),
        ],
    );
    let output = dir.path().join("out.warc.gz");

    let source = UrlSource::open(&input, InputMode::Archive, None).unwrap();
    let summary = HarvestEngine::new(
        engine_with_timeout(5, false),
        Arc::new(ArchiveStage),
        WarcWriter::create(&output).unwrap(),
        &output,
        run_options(2, Duration::from_secs(10)),
    )
    .run(source)
    .await
    .unwrap();

    assert_eq!(summary.stats.seen, 2);
    assert_eq!(summary.stats.saved, 2);
    assert_eq!(responses(&read_warc(&output)).len(), 2);
}
