// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::document::{ProcessedDocument, RejectKind};
use crate::domain::models::fetch::FetchedPage;
use crate::domain::services::content_pipeline::ContentPipeline;
use crate::workers::offload_pool::OffloadPool;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// 处理阶段特质
///
/// 把成功抓取的页面转换为待写入的输出；返回 `Err` 表示丢弃并给出丢弃类型。
#[async_trait]
pub trait ProcessingStage: Send + Sync + 'static {
    /// 输出类型
    type Output: Send + 'static;

    /// 处理页面
    async fn process(&self, page: FetchedPage) -> Result<Self::Output, RejectKind>;
}

/// 归档阶段：页面原样写出
pub struct ArchiveStage;

#[async_trait]
impl ProcessingStage for ArchiveStage {
    type Output = FetchedPage;

    async fn process(&self, page: FetchedPage) -> Result<FetchedPage, RejectKind> {
        Ok(page)
    }
}

/// 内容阶段：在卸载池中运行内容管道
pub struct ContentStage {
    pipeline: Arc<ContentPipeline>,
    pool: OffloadPool,
}

impl ContentStage {
    /// 创建内容阶段
    pub fn new(pipeline: Arc<ContentPipeline>, pool: OffloadPool) -> Self {
        Self { pipeline, pool }
    }
}

#[async_trait]
impl ProcessingStage for ContentStage {
    type Output = ProcessedDocument;

    async fn process(&self, page: FetchedPage) -> Result<ProcessedDocument, RejectKind> {
        let pipeline = self.pipeline.clone();
        self.pool
            .run(move || {
                let evaluated = pipeline
                    .evaluate(&page.url, &page.body, page.content_type())
                    .map_err(|rejection| {
                        debug!("Discarded {}: {}", page.url, rejection);
                        rejection.kind()
                    });
                Some(evaluated)
            })
            .await
            .unwrap_or(Err(RejectKind::ProcessingError))
    }
}
