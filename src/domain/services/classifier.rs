// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

/// 分类器错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifierError {
    #[error("模型加载失败: {0}")]
    LoadFailed(String),

    #[error("分类失败: {0}")]
    ClassificationFailed(String),
}

/// 分类结果
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// 标签
    pub label: String,
    /// 置信度，范围 [0, 1]
    pub score: f32,
}

impl Classification {
    /// 创建分类结果，置信度会被限制在 [0, 1]
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score: if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) },
        }
    }
}

/// 文本分类器特质
///
/// 每个进程启动时加载一次，被所有处理任务共享。
pub trait Classifier: Send + Sync {
    /// 对文本进行分类
    fn classify(&self, text: &str) -> Result<Classification, ClassifierError>;

    /// 分类器名称
    fn name(&self) -> &'static str;
}
