// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::SinkError;
use flate2::read::MultiGzDecoder;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter};
use std::path::Path;

pub mod jsonl_writer;
pub mod warc_reader;
pub mod warc_writer;

pub use jsonl_writer::JsonlWriter;
pub use warc_reader::{HttpResponse, WarcReader, WarcRecord};
pub use warc_writer::WarcWriter;

/// 记录写入器特质
///
/// 独占输出文件，只在结果写入线程上使用，因此是同步接口。
pub trait RecordWriter<T>: Send + 'static {
    /// 写入一条记录
    fn write_record(&mut self, record: &T) -> Result<(), SinkError>;

    /// 已写入的记录数
    fn records_written(&self) -> u64;

    /// 刷新并关闭输出
    fn finish(self) -> Result<(), SinkError>
    where
        Self: Sized;
}

/// 创建输出文件，必要时创建父目录
pub(crate) fn create_output(path: &Path) -> Result<BufWriter<File>, SinkError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(BufWriter::with_capacity(256 * 1024, File::create(path)?))
}

/// 刷新缓冲并同步到磁盘
pub(crate) fn close_output(out: BufWriter<File>) -> Result<(), SinkError> {
    let file = out.into_inner().map_err(|e| SinkError::Io(e.into_error()))?;
    file.sync_all()?;
    Ok(())
}

/// 打开输入文件，按魔数识别gzip压缩
pub fn open_input(path: &Path) -> io::Result<Box<dyn BufRead + Send>> {
    let mut file = BufReader::new(File::open(path)?);
    if file.fill_buf()?.starts_with(&[0x1f, 0x8b]) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(file))
    }
}
