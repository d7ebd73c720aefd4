// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::Settings;
use crate::domain::models::document::{
    CleanedDocument, ProcessedDocument, RejectKind, StoredDocument,
};
use crate::domain::services::classifier::{Classification, Classifier, ClassifierError};
use crate::domain::services::extraction_service::{ExtractionError, ExtractionService};
use crate::domain::services::harmful_content_service::LexiconClassifier;
use crate::domain::services::language_service::ScriptLanguageIdentifier;
use crate::domain::services::pii_service;
use crate::domain::services::quality_service::{QualityFailure, QualityService};
use std::sync::Arc;
use thiserror::Error;

/// 内容过滤配置
#[derive(Debug, Clone, PartialEq)]
pub struct ContentFilterConfig {
    /// 保留的语言
    pub target_languages: Vec<String>,
    /// 语言置信度下限
    pub language_threshold: f32,
    /// NSFW拒绝阈值
    pub nsfw_threshold: f32,
    /// 有害言论拒绝阈值
    pub toxic_threshold: f32,
    /// 正文最少字符数
    pub min_text_chars: usize,
    /// 正文最少词数
    pub min_words: Option<usize>,
    /// 是否应用Gopher质量规则
    pub quality_filter: bool,
    /// 是否脱敏个人信息
    pub mask_pii: bool,
}

impl Default for ContentFilterConfig {
    fn default() -> Self {
        Self {
            target_languages: vec!["en".to_string()],
            language_threshold: 0.5,
            nsfw_threshold: 0.9,
            toxic_threshold: 0.9,
            min_text_chars: 100,
            min_words: None,
            quality_filter: true,
            mask_pii: false,
        }
    }
}

impl ContentFilterConfig {
    /// 从应用配置构建
    pub fn from_settings(settings: &Settings) -> Self {
        let c = &settings.content;
        Self {
            target_languages: c.target_languages.clone(),
            language_threshold: c.language_threshold,
            nsfw_threshold: c.nsfw_threshold,
            toxic_threshold: c.toxic_threshold,
            min_text_chars: c.min_text_chars,
            min_words: c.min_words,
            quality_filter: c.quality_filter,
            mask_pii: c.mask_pii,
        }
    }
}

/// 文档被丢弃的原因
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Rejection {
    #[error("extraction: {0}")]
    Extraction(#[from] ExtractionError),
    #[error("text too short ({0} chars)")]
    TooShort(usize),
    #[error("language {label} ({score:.2})")]
    Language { label: String, score: f32 },
    #[error("nsfw ({0:.2})")]
    Nsfw(f32),
    #[error("toxic ({0:.2})")]
    Toxic(f32),
    #[error("quality: {0:?}")]
    Quality(QualityFailure),
    #[error("marked low quality upstream")]
    MarkedLowQuality,
    #[error("too few words ({0})")]
    TooFewWords(usize),
    #[error("classifier: {0}")]
    Classifier(#[from] ClassifierError),
}

impl Rejection {
    /// 统计使用的丢弃类型
    pub fn kind(&self) -> RejectKind {
        match self {
            Rejection::Extraction(_) => RejectKind::Unsupported,
            Rejection::TooShort(_) => RejectKind::TooShort,
            Rejection::Language { .. } => RejectKind::Language,
            Rejection::Nsfw(_) | Rejection::Toxic(_) => RejectKind::Harmful,
            Rejection::Quality(_) | Rejection::MarkedLowQuality | Rejection::TooFewWords(_) => {
                RejectKind::Quality
            }
            Rejection::Classifier(_) => RejectKind::ProcessingError,
        }
    }
}

/// 内容管道
///
/// 纯函数式的处理流程：提取 → 长度 → 语言 → NSFW → 有害言论 → 质量 → 词数 → 脱敏。
/// 每一步都可能短路，已被拒绝的文档不会再调用后续分类器。
pub struct ContentPipeline {
    config: ContentFilterConfig,
    language: Arc<dyn Classifier>,
    nsfw: Arc<dyn Classifier>,
    toxic: Arc<dyn Classifier>,
    quality: QualityService,
}

impl ContentPipeline {
    /// 用给定分类器创建管道
    pub fn new(
        config: ContentFilterConfig,
        language: Arc<dyn Classifier>,
        nsfw: Arc<dyn Classifier>,
        toxic: Arc<dyn Classifier>,
    ) -> Self {
        Self {
            config,
            language,
            nsfw,
            toxic,
            quality: QualityService::default(),
        }
    }

    /// 按应用配置加载内置分类器并创建管道
    pub fn from_settings(settings: &Settings) -> Result<Self, ClassifierError> {
        let nsfw = LexiconClassifier::nsfw(settings.content.nsfw_lexicon.as_deref())?;
        let toxic = LexiconClassifier::toxic(settings.content.toxic_lexicon.as_deref())?;
        Ok(Self::new(
            ContentFilterConfig::from_settings(settings),
            Arc::new(ScriptLanguageIdentifier::new()),
            Arc::new(nsfw),
            Arc::new(toxic),
        ))
    }

    /// 管道配置
    pub fn config(&self) -> &ContentFilterConfig {
        &self.config
    }

    /// 处理页面，未通过过滤时返回 `None`
    pub fn process(
        &self,
        url: &str,
        body: &[u8],
        content_type: Option<&str>,
    ) -> Option<ProcessedDocument> {
        self.evaluate(url, body, content_type).ok()
    }

    /// 处理页面并给出拒绝原因
    pub fn evaluate(
        &self,
        url: &str,
        body: &[u8],
        content_type: Option<&str>,
    ) -> Result<ProcessedDocument, Rejection> {
        let text = ExtractionService::extract_text(body, content_type)?;

        let chars = text.trim().chars().count();
        if chars < self.config.min_text_chars {
            return Err(Rejection::TooShort(chars));
        }

        let language = self.language.classify(&text)?;
        self.check_language(&language)?;

        let nsfw = self.nsfw.classify(&text)?;
        self.check_nsfw(&nsfw)?;

        let toxic = self.toxic.classify(&text)?;
        self.check_toxic(&toxic)?;

        // with the filter off the heuristic result is still recorded
        let passes_quality = if self.config.quality_filter {
            self.quality.check(&text).map_err(Rejection::Quality)?;
            true
        } else {
            self.quality.passes(&text)
        };
        self.check_min_words(&text)?;

        let text = if self.config.mask_pii {
            pii_service::mask_all(&text).0
        } else {
            text
        };

        Ok(ProcessedDocument {
            url: url.to_string(),
            text,
            language: language.label,
            language_score: language.score,
            nsfw_label: nsfw.label,
            nsfw_score: nsfw.score,
            toxic_label: toxic.label,
            toxic_score: toxic.score,
            passes_quality,
        })
    }

    /// 对已存储的文档重新过滤
    ///
    /// 文档中已有的语言、有害内容和质量结果直接使用，缺失的才调用分类器；
    /// 过滤顺序与 `evaluate` 相同。上游给出标签但没有置信度时按 1.0 处理。
    pub fn refilter(&self, doc: StoredDocument) -> Result<CleanedDocument, Rejection> {
        let text = doc.text;
        if text.trim().is_empty() {
            return Err(Rejection::TooShort(0));
        }

        let language = match doc.language {
            Some(label) => Classification::new(label, doc.language_score.unwrap_or(1.0)),
            None => self.language.classify(&text)?,
        };
        self.check_language(&language)?;

        let nsfw = match doc.nsfw_label {
            Some(label) => Classification::new(label, doc.nsfw_score.unwrap_or(1.0)),
            None => self.nsfw.classify(&text)?,
        };
        self.check_nsfw(&nsfw)?;

        let toxic = match doc.toxic_label {
            Some(label) => Classification::new(label, doc.toxic_score.unwrap_or(1.0)),
            None => self.toxic.classify(&text)?,
        };
        self.check_toxic(&toxic)?;

        if self.config.quality_filter {
            match doc.passes_quality {
                Some(true) => {}
                Some(false) => return Err(Rejection::MarkedLowQuality),
                None => self.quality.check(&text).map_err(Rejection::Quality)?,
            }
        }
        self.check_min_words(&text)?;

        let text = match (self.config.mask_pii, doc.masked_text) {
            (true, Some(masked)) => masked,
            (true, None) => pii_service::mask_all(&text).0,
            (false, _) => text,
        };

        Ok(CleanedDocument {
            url: doc.url,
            text,
            language: language.label,
            language_score: language.score,
        })
    }

    fn check_language(&self, language: &Classification) -> Result<(), Rejection> {
        if !self.config.target_languages.iter().any(|l| *l == language.label)
            || language.score < self.config.language_threshold
        {
            return Err(Rejection::Language {
                label: language.label.clone(),
                score: language.score,
            });
        }
        Ok(())
    }

    fn check_nsfw(&self, nsfw: &Classification) -> Result<(), Rejection> {
        if nsfw.label == "nsfw" && nsfw.score >= self.config.nsfw_threshold {
            return Err(Rejection::Nsfw(nsfw.score));
        }
        Ok(())
    }

    fn check_toxic(&self, toxic: &Classification) -> Result<(), Rejection> {
        if toxic.label == "toxic" && toxic.score >= self.config.toxic_threshold {
            return Err(Rejection::Toxic(toxic.score));
        }
        Ok(())
    }

    fn check_min_words(&self, text: &str) -> Result<(), Rejection> {
        if let Some(min_words) = self.config.min_words {
            let words = text.split_whitespace().count();
            if words < min_words {
                return Err(Rejection::TooFewWords(words));
            }
        }
        Ok(())
    }
}
