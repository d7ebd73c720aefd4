// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{
    engine_with_timeout, english_article, read_jsonl, run_options, CountingClassifier,
};
use harvestrs::application::use_cases::HarvestEngine;
use harvestrs::domain::models::document::ProcessedDocument;
use harvestrs::domain::models::task::UrlTask;
use harvestrs::domain::services::{ContentFilterConfig, ContentPipeline};
use harvestrs::infrastructure::storage::JsonlWriter;
use harvestrs::workers::offload_pool::OffloadPool;
use harvestrs::workers::stage::ContentStage;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_short_page_never_reaches_classifiers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/short"))
        .respond_with(html(
            "<html><body><p>one two three four five six seven eight nine ten</p></body></html>"
                .to_string(),
        ))
        .mount(&server)
        .await;

    let language = CountingClassifier::new("en", 0.99);
    let nsfw = CountingClassifier::new("non-nsfw", 0.99);
    let toxic = CountingClassifier::new("non-toxic", 0.99);
    let pipeline = ContentPipeline::new(
        ContentFilterConfig::default(),
        language.clone(),
        nsfw.clone(),
        toxic.clone(),
    );

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("docs.jsonl");
    let summary = HarvestEngine::new(
        engine_with_timeout(5, true),
        Arc::new(ContentStage::new(Arc::new(pipeline), OffloadPool::new(1))),
        JsonlWriter::<ProcessedDocument>::create(&output).unwrap(),
        &output,
        run_options(2, Duration::from_secs(10)),
    )
    .run(vec![UrlTask::new(format!("{}/short", server.uri()))])
    .await
    .unwrap();

    assert_eq!(summary.stats.seen, 1);
    assert_eq!(summary.stats.saved, 0);
    assert_eq!(summary.stats.count_of("too_short"), 1);
    assert!(read_jsonl(&output).is_empty());
    assert_eq!(language.calls(), 0);
    assert_eq!(nsfw.calls(), 0);
    assert_eq!(toxic.calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_content_run_writes_passing_documents() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(html(english_article(6)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let language = CountingClassifier::new("en", 0.97);
    let pipeline = ContentPipeline::new(
        ContentFilterConfig::default(),
        language.clone(),
        CountingClassifier::new("non-nsfw", 0.8),
        CountingClassifier::new("non-toxic", 0.7),
    );

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("docs.jsonl");
    let article = format!("{}/article", server.uri());
    let summary = HarvestEngine::new(
        engine_with_timeout(5, true),
        Arc::new(ContentStage::new(Arc::new(pipeline), OffloadPool::new(2))),
        JsonlWriter::<ProcessedDocument>::create(&output).unwrap(),
        &output,
        run_options(2, Duration::from_secs(10)),
    )
    .run(vec![
        UrlTask::new(article.clone()),
        UrlTask::new(format!("{}/gone", server.uri())),
    ])
    .await
    .unwrap();

    assert_eq!(summary.stats.seen, 2);
    assert_eq!(summary.stats.saved, 1);
    assert_eq!(summary.stats.count_of("http_error"), 1);
    assert_eq!(summary.stats.saved + summary.stats.failed, summary.stats.seen);
    assert_eq!(language.calls(), 1);

    let docs = read_jsonl(&output);
    assert_eq!(docs.len(), 1);
    let doc = &docs[0];
    assert_eq!(doc["url"], article.as_str());
    assert_eq!(doc["language"], "en");
    assert_eq!(doc["nsfw_label"], "non-nsfw");
    assert_eq!(doc["toxic_label"], "non-toxic");
    assert_eq!(doc["passes_quality"], true);
    let text = doc["text"].as_str().unwrap();
    assert!(text.contains("The river runs through the old town"));
    assert!(!text.contains("var x"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_html_served_as_plain_text_is_still_extracted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/mislabelled"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(english_article(5), "text/plain"))
        .mount(&server)
        .await;

    let pipeline = ContentPipeline::new(
        ContentFilterConfig::default(),
        CountingClassifier::new("en", 0.99),
        CountingClassifier::new("non-nsfw", 0.99),
        CountingClassifier::new("non-toxic", 0.99),
    );

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("docs.jsonl");
    let summary = HarvestEngine::new(
        engine_with_timeout(5, true),
        Arc::new(ContentStage::new(Arc::new(pipeline), OffloadPool::new(1))),
        JsonlWriter::<ProcessedDocument>::create(&output).unwrap(),
        &output,
        run_options(1, Duration::from_secs(10)),
    )
    .run(vec![UrlTask::new(format!("{}/mislabelled", server.uri()))])
    .await
    .unwrap();

    assert_eq!(summary.stats.saved, 1);
    let docs = read_jsonl(&output);
    let text = docs[0]["text"].as_str().unwrap();
    assert!(text.starts_with("Town\nThe river runs through the old town"));
    assert!(!text.contains("var x"));
    assert!(!text.contains("<p>"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_toxic_documents_are_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html(english_article(4)))
        .mount(&server)
        .await;

    let toxic = CountingClassifier::new("toxic", 0.95);
    let pipeline = ContentPipeline::new(
        ContentFilterConfig::default(),
        CountingClassifier::new("en", 0.99),
        CountingClassifier::new("non-nsfw", 0.99),
        toxic.clone(),
    );

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("docs.jsonl");
    let tasks: Vec<UrlTask> = (0..5)
        .map(|i| UrlTask::new(format!("{}/page/{}", server.uri(), i)))
        .collect();
    let summary = HarvestEngine::new(
        engine_with_timeout(5, true),
        Arc::new(ContentStage::new(Arc::new(pipeline), OffloadPool::new(2))),
        JsonlWriter::<ProcessedDocument>::create(&output).unwrap(),
        &output,
        run_options(3, Duration::from_secs(10)),
    )
    .run(tasks)
    .await
    .unwrap();

    assert_eq!(summary.stats.saved, 0);
    assert_eq!(summary.stats.count_of("harmful_filtered"), 5);
    assert_eq!(toxic.calls(), 5);
    assert!(read_jsonl(&output).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pii_is_masked_in_stored_text() {
    let server = MockServer::start().await;
    let page = english_article(5).replace(
        "</body>",
        "<p>Write to jane.doe@example.com or call 555-123-4567 from 192.168.1.20 today.</p></body>",
    );
    Mock::given(method("GET"))
        .respond_with(html(page))
        .mount(&server)
        .await;

    let config = ContentFilterConfig {
        mask_pii: true,
        ..ContentFilterConfig::default()
    };
    let pipeline = ContentPipeline::new(
        config,
        CountingClassifier::new("en", 0.99),
        CountingClassifier::new("non-nsfw", 0.99),
        CountingClassifier::new("non-toxic", 0.99),
    );

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("docs.jsonl");
    HarvestEngine::new(
        engine_with_timeout(5, true),
        Arc::new(ContentStage::new(Arc::new(pipeline), OffloadPool::new(1))),
        JsonlWriter::<ProcessedDocument>::create(&output).unwrap(),
        &output,
        run_options(1, Duration::from_secs(10)),
    )
    .run(vec![UrlTask::new(format!("{}/contact", server.uri()))])
    .await
    .unwrap();

    let docs = read_jsonl(&output);
    assert_eq!(docs.len(), 1);
    let text = docs[0]["text"].as_str().unwrap();
    assert!(text.contains("|||EMAIL_ADDRESS|||"));
    assert!(text.contains("|||PHONE_NUMBER|||"));
    assert!(text.contains("|||IP_ADDRESS|||"));
    assert!(!text.contains("jane.doe@example.com"));
}
