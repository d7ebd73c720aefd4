// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 该模块包含内容管道的各个纯函数式步骤，不涉及任何IO调度。
///
/// 包含的服务：
/// - 分类器契约（classifier）：语言与有害内容分类器的统一接口
/// - 提取服务（extraction_service）：解码响应并提取可见文本
/// - 语言识别（language_service）：基于文字系统和停用词
/// - 有害内容（harmful_content_service）：基于词表的NSFW/有害言论分类
/// - 质量过滤（quality_service）：Gopher启发式规则
/// - 个人信息脱敏（pii_service）：邮箱、电话、IP地址
/// - 内容管道（content_pipeline）：按顺序组合以上步骤
pub mod classifier;
pub mod content_pipeline;
pub mod extraction_service;
pub mod harmful_content_service;
pub mod language_service;
pub mod pii_service;
pub mod quality_service;

pub use classifier::{Classification, Classifier, ClassifierError};
pub use content_pipeline::{ContentFilterConfig, ContentPipeline, Rejection};
