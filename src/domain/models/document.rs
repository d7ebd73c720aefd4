// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 处理后的文档
///
/// 内容管道的输出：通过语言、有害内容和质量过滤的正文及其分类结果。
/// 序列化为一行JSON写入输出文件。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedDocument {
    /// 来源URL
    pub url: String,
    /// 提取出的正文（可能已脱敏）
    pub text: String,
    /// 语言代码
    pub language: String,
    /// 语言置信度
    pub language_score: f32,
    /// NSFW标签
    pub nsfw_label: String,
    /// NSFW置信度
    pub nsfw_score: f32,
    /// 有害言论标签
    pub toxic_label: String,
    /// 有害言论置信度
    pub toxic_score: f32,
    /// 是否通过质量过滤
    pub passes_quality: bool,
}

/// 已存储的文档
///
/// 重新过滤时读入的一行JSON。除正文外的字段都可缺省，缺省的分类结果在过滤时重新计算。
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StoredDocument {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub text: String,
    pub language: Option<String>,
    #[serde(alias = "score")]
    pub language_score: Option<f32>,
    pub nsfw_label: Option<String>,
    pub nsfw_score: Option<f32>,
    pub toxic_label: Option<String>,
    pub toxic_score: Option<f32>,
    pub passes_quality: Option<bool>,
    /// 上游已脱敏的正文
    pub masked_text: Option<String>,
}

/// 重新过滤后的文档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedDocument {
    pub url: String,
    pub text: String,
    pub language: String,
    pub language_score: f32,
}

/// 文档丢弃类型
///
/// 内容管道拒绝文档的原因分类，与 `FailureKind` 一样使用固定下标计数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectKind {
    /// 响应不是可提取正文的类型
    Unsupported,
    /// 正文过短
    TooShort,
    /// 语言不在目标范围或置信度不足
    Language,
    /// NSFW或有害言论
    Harmful,
    /// 未通过质量规则或最少词数
    Quality,
    /// 分类器出错或处理任务异常
    ProcessingError,
}

impl RejectKind {
    pub const ALL: [RejectKind; 6] = [
        RejectKind::Unsupported,
        RejectKind::TooShort,
        RejectKind::Language,
        RejectKind::Harmful,
        RejectKind::Quality,
        RejectKind::ProcessingError,
    ];

    /// 稳定的字符串名称
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectKind::Unsupported => "unsupported_content",
            RejectKind::TooShort => "too_short",
            RejectKind::Language => "language_filtered",
            RejectKind::Harmful => "harmful_filtered",
            RejectKind::Quality => "quality_filtered",
            RejectKind::ProcessingError => "processing_error",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            RejectKind::Unsupported => 0,
            RejectKind::TooShort => 1,
            RejectKind::Language => 2,
            RejectKind::Harmful => 3,
            RejectKind::Quality => 4,
            RejectKind::ProcessingError => 5,
        }
    }
}

impl fmt::Display for RejectKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
