// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use flate2::read::MultiGzDecoder;
use harvestrs::application::use_cases::RunOptions;
use harvestrs::config::settings::FetchTimeouts;
use harvestrs::domain::services::{Classification, Classifier, ClassifierError};
use harvestrs::engines::reqwest_engine::{EngineConfig, ReqwestEngine};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 测试中使用的运行参数
pub fn run_options(workers: usize, deadline: Duration) -> RunOptions {
    RunOptions {
        workers,
        deadline,
        fd_limit: 0,
        quiet: true,
        limit: None,
    }
}

/// 以单一超时值创建引擎
pub fn engine_with_timeout(total_secs: u64, decompress: bool) -> Arc<ReqwestEngine> {
    let config = EngineConfig {
        timeouts: FetchTimeouts::from_single(total_secs, 5),
        decompress,
        ..EngineConfig::default()
    };
    Arc::new(ReqwestEngine::new(config).expect("failed to build HTTP client"))
}

/// 把URL逐行写入文件
pub fn write_url_list(dir: &Path, urls: &[String]) -> PathBuf {
    let path = dir.join("urls.txt");
    let mut file = File::create(&path).unwrap();
    for url in urls {
        writeln!(file, "{}", url).unwrap();
    }
    path
}

/// 解析出的WARC记录
#[derive(Debug)]
pub struct WarcRecord {
    pub headers: Vec<(String, String)>,
    pub block: Vec<u8>,
}

impl WarcRecord {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn block_text(&self) -> String {
        String::from_utf8_lossy(&self.block).into_owned()
    }
}

/// 读取gzip WARC文件中的全部记录
pub fn read_warc(path: &Path) -> Vec<WarcRecord> {
    let mut raw = Vec::new();
    MultiGzDecoder::new(File::open(path).unwrap())
        .read_to_end(&mut raw)
        .unwrap();

    let mut records = Vec::new();
    let mut pos = 0;
    while pos < raw.len() {
        let head_end = find(&raw[pos..], b"\r\n\r\n").expect("unterminated WARC header") + pos;
        let head = String::from_utf8_lossy(&raw[pos..head_end]).into_owned();
        let mut lines = head.split("\r\n");
        assert_eq!(lines.next(), Some("WARC/1.0"));
        let headers: Vec<(String, String)> = lines
            .filter_map(|line| line.split_once(": "))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let length: usize = headers
            .iter()
            .find(|(k, _)| k == "Content-Length")
            .map(|(_, v)| v.parse().unwrap())
            .expect("record without Content-Length");
        let block_start = head_end + 4;
        let block = raw[block_start..block_start + length].to_vec();
        assert_eq!(&raw[block_start + length..block_start + length + 4], b"\r\n\r\n");
        pos = block_start + length + 4;

        records.push(WarcRecord { headers, block });
    }
    records
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// 只保留 `response` 记录
pub fn responses(records: &[WarcRecord]) -> Vec<&WarcRecord> {
    records
        .iter()
        .filter(|r| r.header("WARC-Type") == Some("response"))
        .collect()
}

/// 读取按行JSON输出
pub fn read_jsonl(path: &Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

/// 固定结果并记录调用次数的分类器
pub struct CountingClassifier {
    label: &'static str,
    score: f32,
    calls: AtomicUsize,
}

impl CountingClassifier {
    pub fn new(label: &'static str, score: f32) -> Arc<Self> {
        Arc::new(Self {
            label,
            score,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Classifier for CountingClassifier {
    fn classify(&self, _text: &str) -> Result<Classification, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Classification::new(self.label, self.score))
    }

    fn name(&self) -> &'static str {
        "counting"
    }
}

/// 一段能通过质量过滤的英文正文
pub fn english_article(paragraphs: usize) -> String {
    let paragraph = "The river runs through the old town and the people who live there \
                     have worked in the mills for many years. In the spring the water \
                     rises and the farmers plant their fields along the banks of the valley.";
    let body: String = (0..paragraphs)
        .map(|_| format!("<p>{}</p>", paragraph))
        .collect();
    format!(
        "<html><head><title>Town</title><script>var x = 1;</script></head><body>{}</body></html>",
        body
    )
}
