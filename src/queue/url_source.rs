// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::UrlTask;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// 输入行的接受规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// 只接受带主机的 http/https 绝对URL
    Archive,
    /// 接受任意非空行
    Content,
}

/// URL源
///
/// 惰性读取按行组织的URL文件（可为gzip压缩），产出 `UrlTask`。
/// 只能通过重新打开来重新开始。
pub struct UrlSource {
    lines: io::Lines<Box<dyn BufRead + Send>>,
    mode: InputMode,
    remaining: Option<usize>,
    skipped: usize,
}

impl UrlSource {
    /// 打开URL文件
    ///
    /// 通过魔数识别gzip压缩，文件名无需以 `.gz` 结尾。
    ///
    /// # 参数
    ///
    /// * `path` - 文件路径
    /// * `mode` - 接受规则
    /// * `limit` - 最多产出的URL数
    pub fn open(
        path: impl AsRef<Path>,
        mode: InputMode,
        limit: Option<usize>,
    ) -> io::Result<Self> {
        let path = path.as_ref();
        let mut file = File::open(path)?;
        let mut magic = [0u8; 2];
        let read = read_prefix(&mut file, &mut magic)?;
        let prefix = io::Cursor::new(magic[..read].to_vec());
        let stream = prefix.chain(file);

        let reader: Box<dyn BufRead + Send> = if read == 2 && magic == GZIP_MAGIC {
            debug!("Reading gzip-compressed URL list from {}", path.display());
            Box::new(BufReader::new(MultiGzDecoder::new(stream)))
        } else {
            Box::new(BufReader::new(stream))
        };

        Ok(Self::from_reader(reader, mode, limit))
    }

    /// 从任意读取器构建
    pub fn from_reader(
        reader: Box<dyn BufRead + Send>,
        mode: InputMode,
        limit: Option<usize>,
    ) -> Self {
        Self {
            lines: reader.lines(),
            mode,
            remaining: limit,
            skipped: 0,
        }
    }

    /// 因不符合规则而跳过的行数
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn accepts(&self, line: &str) -> bool {
        match self.mode {
            InputMode::Content => true,
            InputMode::Archive => is_fetchable_url(line),
        }
    }
}

impl Iterator for UrlSource {
    type Item = UrlTask;

    fn next(&mut self) -> Option<UrlTask> {
        if self.remaining == Some(0) {
            return None;
        }

        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    warn!("Stopping URL source on unreadable input: {}", e);
                    return None;
                }
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if !self.accepts(trimmed) {
                self.skipped += 1;
                continue;
            }

            if let Some(remaining) = self.remaining.as_mut() {
                *remaining -= 1;
            }
            return Some(UrlTask::new(trimmed));
        }
    }
}

/// 是否为可抓取的 http/https 绝对URL
pub fn is_fetchable_url(line: &str) -> bool {
    match url::Url::parse(line) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host().is_some(),
        Err(_) => false,
    }
}

fn read_prefix(file: &mut File, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
