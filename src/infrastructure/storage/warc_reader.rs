// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::infrastructure::storage::open_input;
use flate2::read::{DeflateDecoder, MultiGzDecoder, ZlibDecoder};
use std::borrow::Cow;
use std::io::{self, BufRead, Read};
use std::path::Path;

/// 读出的WARC记录
#[derive(Debug, Clone, PartialEq)]
pub struct WarcRecord {
    /// 记录头，保持文件中的顺序
    pub headers: Vec<(String, String)>,
    /// 记录块
    pub block: Vec<u8>,
}

impl WarcRecord {
    /// 按名称查找记录头（不区分大小写）
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// `WARC-Type`
    pub fn record_type(&self) -> Option<&str> {
        self.header("WARC-Type")
    }

    /// 解析 `response` 记录中的HTTP响应
    pub fn http_response(&self) -> Option<HttpResponse<'_>> {
        HttpResponse::parse(&self.block)
    }
}

/// WARC读取器
///
/// 顺序读取WARC文件中的记录。gzip压缩（每条记录一个成员或整体压缩）按魔数识别。
pub struct WarcReader<R> {
    inner: R,
    line: String,
}

impl WarcReader<Box<dyn BufRead + Send>> {
    /// 打开WARC文件
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(open_input(path.as_ref())?))
    }
}

impl<R: BufRead> WarcReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line: String::new(),
        }
    }

    fn read_record(&mut self) -> io::Result<Option<WarcRecord>> {
        // records are separated by blank lines
        loop {
            self.line.clear();
            if self.inner.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            if !self.line.trim().is_empty() {
                break;
            }
        }
        if !self.line.starts_with("WARC/") {
            return Err(invalid(format!(
                "expected a WARC version line, found {:?}",
                self.line.trim_end()
            )));
        }

        let mut headers = Vec::new();
        loop {
            self.line.clear();
            if self.inner.read_line(&mut self.line)? == 0 {
                return Err(invalid("unterminated WARC header".to_string()));
            }
            let line = self.line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                headers.push((name.trim().to_string(), value.trim().to_string()));
            }
        }

        let length: usize = find_header(&headers, "Content-Length")
            .ok_or_else(|| invalid("WARC record without Content-Length".to_string()))?
            .parse()
            .map_err(|e| invalid(format!("bad Content-Length: {}", e)))?;
        let mut block = vec![0u8; length];
        self.inner.read_exact(&mut block)?;

        Ok(Some(WarcRecord { headers, block }))
    }
}

impl<R: BufRead> Iterator for WarcReader<R> {
    type Item = io::Result<WarcRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_record().transpose()
    }
}

/// 记录块中的HTTP响应
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse<'a> {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub payload: &'a [u8],
}

impl<'a> HttpResponse<'a> {
    /// 解析状态行、响应头与响应体
    pub fn parse(block: &'a [u8]) -> Option<Self> {
        let split = block.windows(4).position(|w| w == b"\r\n\r\n")?;
        let head = String::from_utf8_lossy(&block[..split]);
        let mut lines = head.split("\r\n");

        let status_line = lines.next()?;
        if !status_line.starts_with("HTTP/") {
            return None;
        }
        let status = status_line.split_whitespace().nth(1)?.parse().ok()?;
        let headers = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
            .collect();

        Some(Self {
            status,
            headers,
            payload: &block[split + 4..],
        })
    }

    /// 按名称查找响应头（不区分大小写）
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// `Content-Type` 响应头
    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    /// 按 `Content-Encoding` 解码后的响应体
    ///
    /// 支持 gzip 与 deflate；其他编码返回 `Unsupported` 错误。
    pub fn decoded_payload(&self) -> io::Result<Cow<'a, [u8]>> {
        let encoding = self
            .header("Content-Encoding")
            .map(|e| e.trim().to_ascii_lowercase())
            .unwrap_or_default();

        let mut out = Vec::with_capacity(self.payload.len() * 4);
        match encoding.as_str() {
            "" | "identity" => return Ok(Cow::Borrowed(self.payload)),
            "gzip" | "x-gzip" => {
                MultiGzDecoder::new(self.payload).read_to_end(&mut out)?;
            }
            "deflate" => {
                // servers send both zlib-wrapped and raw deflate
                if ZlibDecoder::new(self.payload).read_to_end(&mut out).is_err() {
                    out.clear();
                    DeflateDecoder::new(self.payload).read_to_end(&mut out)?;
                }
            }
            other => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("content encoding {}", other),
                ))
            }
        }
        Ok(Cow::Owned(out))
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

fn invalid(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}
