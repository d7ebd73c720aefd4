// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::fetch::FetchedPage;
use crate::infrastructure::storage::{close_output, create_output, RecordWriter};
use crate::utils::errors::SinkError;
use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use uuid::Uuid;

const WARC_VERSION: &str = "WARC/1.0";

/// WARC写入器
///
/// 每条记录单独压缩为一个gzip成员，文件中任意前缀截断后仍可逐条恢复。
/// 文件以一条 `warcinfo` 记录开头。
pub struct WarcWriter {
    out: BufWriter<File>,
    written: u64,
}

impl WarcWriter {
    /// 创建WARC文件并写入 `warcinfo` 记录
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref();
        let mut writer = Self {
            out: create_output(path)?,
            written: 0,
        };

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let info = format!(
            "software: harvestrs/{}\r\nformat: WARC File Format 1.0\r\n",
            env!("CARGO_PKG_VERSION")
        );
        let mut headers = record_headers("warcinfo", Utc::now());
        headers.push(("WARC-Filename".to_string(), filename));
        headers.push(("Content-Type".to_string(), "application/warc-fields".to_string()));
        writer.write_member(&headers, info.as_bytes())?;
        Ok(writer)
    }

    fn write_member(&mut self, headers: &[(String, String)], block: &[u8]) -> Result<(), SinkError> {
        let mut encoder = GzEncoder::new(&mut self.out, Compression::default());
        encoder.write_all(WARC_VERSION.as_bytes())?;
        encoder.write_all(b"\r\n")?;
        for (name, value) in headers {
            write_header(&mut encoder, name, value)?;
        }
        write_header(&mut encoder, "Content-Length", &block.len().to_string())?;
        encoder.write_all(b"\r\n")?;
        encoder.write_all(block)?;
        encoder.write_all(b"\r\n\r\n")?;
        encoder.finish()?;
        self.out.flush()?;
        Ok(())
    }
}

impl RecordWriter<FetchedPage> for WarcWriter {
    /// 写入 `response` 记录
    fn write_record(&mut self, page: &FetchedPage) -> Result<(), SinkError> {
        let block = http_block(page);

        let mut headers = record_headers("response", page.fetched_at);
        headers.push(("WARC-Target-URI".to_string(), page.url.clone()));
        headers.push(("WARC-Resolved-URI".to_string(), page.final_url.clone()));
        if page.truncated {
            headers.push(("WARC-Truncated".to_string(), "length".to_string()));
        }
        headers.push((
            "Content-Type".to_string(),
            "application/http; msgtype=response".to_string(),
        ));

        self.write_member(&headers, &block)?;
        self.written += 1;
        Ok(())
    }

    fn records_written(&self) -> u64 {
        self.written
    }

    fn finish(self) -> Result<(), SinkError> {
        close_output(self.out)
    }
}

fn record_headers(kind: &str, date: DateTime<Utc>) -> Vec<(String, String)> {
    vec![
        ("WARC-Type".to_string(), kind.to_string()),
        (
            "WARC-Record-ID".to_string(),
            format!("<urn:uuid:{}>", Uuid::new_v4()),
        ),
        ("WARC-Date".to_string(), warc_date(date)),
    ]
}

/// WARC日期格式：UTC，精确到秒
pub fn warc_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// 构建HTTP响应块：状态行、响应头（按抓取结果中的顺序）、空行、响应体
pub fn http_block(page: &FetchedPage) -> Vec<u8> {
    let mut block = Vec::with_capacity(page.body.len() + 1024);
    block.extend_from_slice(format!("HTTP/1.1 {} {}", page.status, page.reason).trim_end().as_bytes());
    block.extend_from_slice(b"\r\n");
    for (name, value) in &page.headers {
        block.extend_from_slice(name.as_bytes());
        block.extend_from_slice(b": ");
        block.extend_from_slice(single_line(value).as_bytes());
        block.extend_from_slice(b"\r\n");
    }
    block.extend_from_slice(b"\r\n");
    block.extend_from_slice(&page.body);
    block
}

fn write_header<W: Write>(out: &mut W, name: &str, value: &str) -> std::io::Result<()> {
    write!(out, "{}: {}\r\n", name, single_line(value))
}

fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}
