// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    engine_with_timeout, english_article, read_jsonl, run_options, write_url_list,
};
use flate2::write::GzEncoder;
use flate2::Compression;
use harvestrs::application::use_cases::{run_from_settings, HarvestEngine};
use harvestrs::config::settings::Settings;
use harvestrs::infrastructure::storage::WarcWriter;
use harvestrs::queue::url_source::{InputMode, UrlSource};
use harvestrs::workers::stage::ArchiveStage;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn offline_settings(mode: &str, input: &Path, output: &Path) -> Settings {
    Settings::defaults()
        .unwrap()
        .set_override("run.mode", mode)
        .unwrap()
        .set_override("run.input", input.to_str().unwrap())
        .unwrap()
        .set_override("run.output", output.to_str().unwrap())
        .unwrap()
        .build()
        .unwrap()
        .try_deserialize()
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_archived_pages_can_be_extracted_later() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/plain"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(english_article(5), "text/html"))
        .mount(&server)
        .await;

    let mut gz = GzEncoder::new(Vec::new(), Compression::default());
    gz.write_all(english_article(4).as_bytes()).unwrap();
    Mock::given(method("GET"))
        .and(path("/gzipped"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Encoding", "gzip")
                .set_body_raw(gz.finish().unwrap(), "text/html"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/stub"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>stub</p>", "text/html"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let input = write_url_list(
        dir.path(),
        &[
            format!("{}/plain", server.uri()),
            format!("{}/gzipped", server.uri()),
            format!("{}/stub", server.uri()),
        ],
    );
    let warc = dir.path().join("crawl.warc.gz");
    let archived = HarvestEngine::new(
        engine_with_timeout(5, false),
        Arc::new(ArchiveStage),
        WarcWriter::create(&warc).unwrap(),
        &warc,
        run_options(3, Duration::from_secs(10)),
    )
    .run(UrlSource::open(&input, InputMode::Archive, None).unwrap())
    .await
    .unwrap();
    assert_eq!(archived.stats.saved, 3);

    let docs = dir.path().join("docs.jsonl");
    let summary = run_from_settings(&offline_settings("extract", &warc, &docs))
        .await
        .unwrap();

    assert_eq!(summary.stats.seen, 3);
    assert_eq!(summary.stats.saved, 2);
    assert_eq!(summary.stats.count_of("too_short"), 1);

    let mut lines = read_jsonl(&docs);
    lines.sort_by_key(|l| l["url"].as_str().unwrap_or_default().to_string());
    assert_eq!(lines.len(), 2);
    assert!(lines[0]["url"].as_str().unwrap().ends_with("/gzipped"));
    assert_eq!(lines[0]["language"], "en");
    assert!(lines[0]["text"]
        .as_str()
        .unwrap()
        .contains("The river runs through the old town"));
    assert!(lines[1]["url"].as_str().unwrap().ends_with("/plain"));
    assert!(!lines[1]["text"].as_str().unwrap().contains("var x"));
}

#[tokio::test]
async fn test_clean_mode_refilters_stored_documents() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("docs.jsonl");
    let output = dir.path().join("clean.jsonl");

    let prose = "The river runs through the old town and the people who live there \
                 have worked in the mills for many years. In the spring the water \
                 rises and the farmers plant their fields along the banks of the valley. "
        .repeat(3);
    let rows = [
        serde_json::json!({"url": "http://a.test/", "text": prose}),
        serde_json::json!({"url": "http://b.test/", "text": prose, "language": "de", "score": 0.99}),
        serde_json::json!({"url": "http://c.test/", "text": prose, "toxic_label": "toxic", "toxic_score": 0.97}),
        serde_json::json!({"url": "http://d.test/", "text": ""}),
    ];
    let body: Vec<String> = rows.iter().map(|r| r.to_string()).collect();
    std::fs::write(&input, body.join("\n")).unwrap();

    let summary = run_from_settings(&offline_settings("clean", &input, &output))
        .await
        .unwrap();

    assert_eq!(summary.stats.seen, 4);
    assert_eq!(summary.stats.saved, 1);
    assert_eq!(summary.stats.count_of("language_filtered"), 1);
    assert_eq!(summary.stats.count_of("harmful_filtered"), 1);
    assert_eq!(summary.stats.count_of("too_short"), 1);

    let cleaned = read_jsonl(&output);
    assert_eq!(cleaned.len(), 1);
    assert_eq!(cleaned[0]["url"], "http://a.test/");
    assert_eq!(cleaned[0]["language"], "en");
}
