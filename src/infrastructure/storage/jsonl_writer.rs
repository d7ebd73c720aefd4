// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::infrastructure::storage::{close_output, create_output, RecordWriter};
use crate::utils::errors::SinkError;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::Path;

/// 按行JSON写入器
///
/// 每条记录序列化为一行UTF-8 JSON，非ASCII字符不转义。
/// 每行写完即刷新到文件，计入 `saved` 的记录不会只停留在缓冲区里。
pub struct JsonlWriter<T> {
    out: BufWriter<File>,
    written: u64,
    _record: PhantomData<fn(&T)>,
}

impl<T> JsonlWriter<T> {
    /// 创建输出文件
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        Ok(Self {
            out: create_output(path.as_ref())?,
            written: 0,
            _record: PhantomData,
        })
    }
}

impl<T: Serialize + 'static> RecordWriter<T> for JsonlWriter<T> {
    fn write_record(&mut self, record: &T) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
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
