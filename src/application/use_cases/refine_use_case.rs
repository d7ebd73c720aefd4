// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::use_cases::harvest_use_case::RunSummary;
use crate::config::settings::{HarvestMode, Settings};
use crate::domain::models::document::{
    CleanedDocument, ProcessedDocument, RejectKind, StoredDocument,
};
use crate::domain::models::run_stats::{Outcome, RunStats};
use crate::domain::services::content_pipeline::ContentPipeline;
use crate::infrastructure::storage::{
    open_input, JsonlWriter, RecordWriter, WarcReader, WarcRecord,
};
use crate::utils::errors::HarvestError;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// 每处理这么多条记录输出一次进度日志
const PROGRESS_EVERY: u64 = 5000;

/// 离线任务参数
#[derive(Debug, Clone)]
pub struct RefineJob {
    /// 输入文件（可为gzip压缩）
    pub input: PathBuf,
    /// 输出的按行JSON文件
    pub output: PathBuf,
    /// 最多处理的记录数
    pub limit: Option<usize>,
}

impl RefineJob {
    fn from_settings(settings: &Settings) -> Self {
        Self {
            input: PathBuf::from(&settings.run.input),
            output: PathBuf::from(&settings.run.output),
            limit: settings.run.limit,
        }
    }

    fn summary(&self, stats: &RunStats, started: Instant) -> RunSummary {
        RunSummary {
            stats: stats.snapshot(),
            output_path: self.output.clone(),
            elapsed: started.elapsed(),
        }
    }
}

/// 从WARC文件提取正文
///
/// 逐条读取 `response` 记录，按 `Content-Encoding` 解码响应体后交给内容管道，
/// 通过过滤的文档写为按行JSON。文件末尾不完整的记录只记录警告，之前的记录照常输出。
pub fn extract_archive(
    job: &RefineJob,
    pipeline: &ContentPipeline,
) -> Result<RunSummary, HarvestError> {
    let started = Instant::now();
    let stats = RunStats::new();
    let mut writer = JsonlWriter::<ProcessedDocument>::create(&job.output)?;

    for record in WarcReader::open(&job.input)? {
        if job.limit.is_some_and(|limit| stats.seen() >= limit as u64) {
            break;
        }
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!("Stopping at unreadable WARC record: {}", e);
                break;
            }
        };
        if record.record_type() != Some("response") {
            continue;
        }

        stats.record_seen();
        match extract_record(&record, pipeline) {
            Ok(doc) => {
                writer.write_record(&doc)?;
                stats.record(Outcome::Saved);
            }
            Err(kind) => stats.record(Outcome::Rejected(kind)),
        }
        log_progress(&stats);
    }

    writer.finish()?;
    Ok(job.summary(&stats, started))
}

fn extract_record(
    record: &WarcRecord,
    pipeline: &ContentPipeline,
) -> Result<ProcessedDocument, RejectKind> {
    let url = record
        .header("WARC-Target-URI")
        .ok_or(RejectKind::Unsupported)?;
    let response = record.http_response().ok_or(RejectKind::Unsupported)?;
    let payload = response.decoded_payload().map_err(|e| {
        debug!("Skipping {}: {}", url, e);
        RejectKind::Unsupported
    })?;

    pipeline
        .evaluate(url, &payload, response.content_type())
        .map_err(|rejection| {
            debug!("Discarded {}: {}", url, rejection);
            rejection.kind()
        })
}

/// 对按行JSON文档重新过滤
///
/// 每行一个文档，空行跳过；无法解析的行计为 `processing_error`。
pub fn clean_documents(
    job: &RefineJob,
    pipeline: &ContentPipeline,
) -> Result<RunSummary, HarvestError> {
    let started = Instant::now();
    let stats = RunStats::new();
    let mut writer = JsonlWriter::<CleanedDocument>::create(&job.output)?;

    for (line_no, line) in open_input(&job.input)?.lines().enumerate() {
        if job.limit.is_some_and(|limit| stats.seen() >= limit as u64) {
            break;
        }
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        stats.record_seen();
        let doc: StoredDocument = match serde_json::from_str(&line) {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Skipping line {}: {}", line_no + 1, e);
                stats.record(Outcome::Rejected(RejectKind::ProcessingError));
                continue;
            }
        };

        match pipeline.refilter(doc) {
            Ok(cleaned) => {
                writer.write_record(&cleaned)?;
                stats.record(Outcome::Saved);
            }
            Err(rejection) => {
                debug!("Line {} discarded: {}", line_no + 1, rejection);
                stats.record(Outcome::Rejected(rejection.kind()));
            }
        }
        log_progress(&stats);
    }

    writer.finish()?;
    Ok(job.summary(&stats, started))
}

fn log_progress(stats: &RunStats) {
    let seen = stats.seen();
    if seen % PROGRESS_EVERY == 0 {
        info!(
            "Processed {} records: {} kept, {} discarded",
            seen,
            stats.saved(),
            stats.rejected()
        );
    }
}

/// 按配置执行离线模式
///
/// 处理在阻塞线程上进行，不占用运行时线程。
pub async fn run_offline(settings: &Settings) -> Result<RunSummary, HarvestError> {
    let mode = settings.run.mode;
    if mode.fetches() {
        return Err(HarvestError::Config(format!("{} is not an offline mode", mode)));
    }

    let pipeline = ContentPipeline::from_settings(settings)
        .map_err(|e| HarvestError::Config(format!("classifier: {}", e)))?;
    let pipeline = Arc::new(pipeline);
    let job = RefineJob::from_settings(settings);
    info!(
        "Running {} over {} into {}",
        mode,
        job.input.display(),
        job.output.display()
    );

    tokio::task::spawn_blocking(move || match mode {
        HarvestMode::Extract => extract_archive(&job, &pipeline),
        _ => clean_documents(&job, &pipeline),
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::fetch::FetchedPage;
    use crate::domain::services::classifier::{Classification, Classifier, ClassifierError};
    use crate::domain::services::content_pipeline::ContentFilterConfig;
    use crate::infrastructure::storage::WarcWriter;
    use bytes::Bytes;
    use chrono::Utc;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    struct Label(&'static str);

    impl Classifier for Label {
        fn classify(&self, _text: &str) -> Result<Classification, ClassifierError> {
            Ok(Classification::new(self.0, 0.99))
        }

        fn name(&self) -> &'static str {
            "label"
        }
    }

    fn pipeline() -> ContentPipeline {
        ContentPipeline::new(
            ContentFilterConfig::default(),
            Arc::new(Label("en")),
            Arc::new(Label("non-nsfw")),
            Arc::new(Label("non-toxic")),
        )
    }

    fn article() -> String {
        let paragraph = "The river runs through the old town and the people who live there \
                         have worked in the mills for many years. In the spring the water \
                         rises and the farmers plant their fields along the banks of the valley.";
        format!(
            "<html><head><script>var x = 1;</script></head><body><p>{}</p><p>{}</p></body></html>",
            paragraph, paragraph
        )
    }

    fn page(url: &str, headers: Vec<(&str, &str)>, body: Vec<u8>) -> FetchedPage {
        FetchedPage {
            url: url.to_string(),
            final_url: url.to_string(),
            status: 200,
            reason: "OK".to_string(),
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: Bytes::from(body),
            truncated: false,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_extract_archive_runs_the_content_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let warc = dir.path().join("crawl.warc.gz");
        let output = dir.path().join("docs.jsonl");

        let mut gz = GzEncoder::new(Vec::new(), Compression::default());
        gz.write_all(article().as_bytes()).unwrap();

        let mut writer = WarcWriter::create(&warc).unwrap();
        let html = vec![("content-type", "text/html")];
        writer
            .write_record(&page("http://a.test/", html.clone(), article().into_bytes()))
            .unwrap();
        writer
            .write_record(&page(
                "http://b.test/",
                vec![("content-type", "text/html"), ("content-encoding", "gzip")],
                gz.finish().unwrap(),
            ))
            .unwrap();
        writer
            .write_record(&page("http://c.test/", html.clone(), b"<p>too short</p>".to_vec()))
            .unwrap();
        writer
            .write_record(&page(
                "http://d.test/",
                vec![("content-type", "text/html"), ("content-encoding", "br")],
                vec![1, 2, 3],
            ))
            .unwrap();
        writer.finish().unwrap();

        let job = RefineJob {
            input: warc,
            output: output.clone(),
            limit: None,
        };
        let summary = extract_archive(&job, &pipeline()).unwrap();

        assert_eq!(summary.stats.seen, 4);
        assert_eq!(summary.stats.saved, 2);
        assert_eq!(summary.stats.count_of("too_short"), 1);
        assert_eq!(summary.stats.count_of("unsupported_content"), 1);

        let lines: Vec<ProcessedDocument> = std::fs::read_to_string(&output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].url, "http://a.test/");
        assert_eq!(lines[1].url, "http://b.test/");
        assert!(lines[1].text.starts_with("The river runs"));
        assert!(!lines[0].text.contains("var x"));
    }

    #[test]
    fn test_extract_archive_keeps_records_before_a_torn_tail() {
        let dir = tempfile::tempdir().unwrap();
        let warc = dir.path().join("crawl.warc.gz");
        let output = dir.path().join("docs.jsonl");

        let mut writer = WarcWriter::create(&warc).unwrap();
        writer
            .write_record(&page(
                "http://a.test/",
                vec![("content-type", "text/html")],
                article().into_bytes(),
            ))
            .unwrap();
        writer.finish().unwrap();

        // a final member whose record block stops short of its Content-Length
        let mut torn = GzEncoder::new(Vec::new(), Compression::default());
        torn.write_all(b"WARC/1.0\r\nWARC-Type: response\r\nContent-Length: 9999\r\n\r\nshort")
            .unwrap();
        std::fs::OpenOptions::new()
            .append(true)
            .open(&warc)
            .unwrap()
            .write_all(&torn.finish().unwrap())
            .unwrap();

        let job = RefineJob {
            input: warc,
            output,
            limit: None,
        };
        let summary = extract_archive(&job, &pipeline()).unwrap();
        assert_eq!(summary.stats.saved, 1);
    }

    #[test]
    fn test_clean_documents_reports_each_filter() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("docs.jsonl");
        let output = dir.path().join("clean.jsonl");

        let words = "river valley people mills history city ".repeat(10);
        let rows = [
            serde_json::json!({"url": "http://a.test/", "text": words, "language": "en", "score": 0.9}),
            serde_json::json!({"url": "http://b.test/", "text": words, "language": "fr", "score": 0.9}),
            serde_json::json!({"url": "http://c.test/", "text": words, "nsfw_label": "nsfw", "toxic_label": "non-toxic"}),
            serde_json::json!({"url": "http://d.test/", "text": "short text"}),
            serde_json::json!({"url": "http://e.test/", "text": words, "passes_quality": false}),
        ];
        let mut body = rows
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        body.push_str("\n\nnot json\n");
        std::fs::write(&input, body).unwrap();

        let job = RefineJob {
            input,
            output: output.clone(),
            limit: None,
        };
        let summary = clean_documents(&job, &pipeline()).unwrap();

        assert_eq!(summary.stats.seen, 6);
        assert_eq!(summary.stats.saved, 1);
        assert_eq!(summary.stats.count_of("language_filtered"), 1);
        assert_eq!(summary.stats.count_of("harmful_filtered"), 1);
        assert_eq!(summary.stats.count_of("quality_filtered"), 2);
        assert_eq!(summary.stats.count_of("processing_error"), 1);

        let cleaned: Vec<CleanedDocument> = std::fs::read_to_string(&output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].url, "http://a.test/");
        assert_eq!(cleaned[0].language_score, 0.9);
    }

    #[test]
    fn test_clean_documents_honours_the_limit() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("docs.jsonl");
        let words = "river valley people mills history city ".repeat(10);
        let line = serde_json::json!({"text": words}).to_string();
        std::fs::write(&input, vec![line; 10].join("\n")).unwrap();

        let job = RefineJob {
            input,
            output: dir.path().join("clean.jsonl"),
            limit: Some(3),
        };
        let summary = clean_documents(&job, &pipeline()).unwrap();
        assert_eq!(summary.stats.seen, 3);
        assert_eq!(summary.stats.saved, 3);
    }

    #[tokio::test]
    async fn test_run_offline_refuses_fetching_modes() {
        let settings: Settings = Settings::defaults()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        let err = run_offline(&settings).await.unwrap_err();
        assert!(matches!(err, HarvestError::Config(_)));
    }
}
