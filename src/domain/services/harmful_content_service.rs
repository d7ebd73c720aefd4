// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::classifier::{Classification, Classifier, ClassifierError};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// 命中词占比达到该值时正类置信度为 1
const SATURATION_DENSITY: f32 = 0.02;

/// 内置NSFW词表
const BUILTIN_NSFW: &str = include_str!("../../../config/lexicons/nsfw.txt");
/// 内置有害言论词表
const BUILTIN_TOXIC: &str = include_str!("../../../config/lexicons/toxic.txt");

/// 基于词表的二分类器
///
/// 词表每行一个词或短语，`#` 开头的行为注释。置信度由命中词占全文词数的比例决定。
/// 空词表永远给出负类标签。
pub struct LexiconClassifier {
    name: &'static str,
    positive_label: String,
    negative_label: String,
    terms: HashSet<String>,
    phrases: Vec<Vec<String>>,
}

impl LexiconClassifier {
    /// 用内存中的词表创建分类器
    pub fn new<I, S>(name: &'static str, positive: &str, negative: &str, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut words = HashSet::new();
        let mut phrases = Vec::new();
        for term in terms {
            let term = term.as_ref().trim();
            if term.is_empty() || term.starts_with('#') {
                continue;
            }
            let parts = tokenize(term);
            match parts.len() {
                0 => {}
                1 => {
                    words.extend(parts);
                }
                _ => phrases.push(parts),
            }
        }
        Self {
            name,
            positive_label: positive.to_string(),
            negative_label: negative.to_string(),
            terms: words,
            phrases,
        }
    }

    /// 从词表文件加载分类器
    pub fn from_file(
        name: &'static str,
        positive: &str,
        negative: &str,
        path: impl AsRef<Path>,
    ) -> Result<Self, ClassifierError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ClassifierError::LoadFailed(format!("{}: {}", path.display(), e)))?;
        let classifier = Self::new(name, positive, negative, content.lines());
        info!(
            "Loaded {} lexicon from {} ({} terms, {} phrases)",
            name,
            path.display(),
            classifier.terms.len(),
            classifier.phrases.len()
        );
        Ok(classifier)
    }

    /// NSFW分类器，标签 `nsfw` / `non-nsfw`
    ///
    /// 未指定词表文件时使用内置词表。
    pub fn nsfw(path: Option<&str>) -> Result<Self, ClassifierError> {
        match path {
            Some(path) => Self::from_file("nsfw", "nsfw", "non-nsfw", path),
            None => Ok(Self::builtin("nsfw", "nsfw", "non-nsfw", BUILTIN_NSFW)),
        }
    }

    /// 有害言论分类器，标签 `toxic` / `non-toxic`
    ///
    /// 未指定词表文件时使用内置词表。
    pub fn toxic(path: Option<&str>) -> Result<Self, ClassifierError> {
        match path {
            Some(path) => Self::from_file("toxic", "toxic", "non-toxic", path),
            None => Ok(Self::builtin("toxic", "toxic", "non-toxic", BUILTIN_TOXIC)),
        }
    }

    fn builtin(name: &'static str, positive: &str, negative: &str, lexicon: &str) -> Self {
        let classifier = Self::new(name, positive, negative, lexicon.lines());
        info!(
            "Using built-in {} lexicon ({} terms, {} phrases)",
            name,
            classifier.terms.len(),
            classifier.phrases.len()
        );
        classifier
    }

    /// 词表是否为空
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.phrases.is_empty()
    }

    fn count_hits(&self, words: &[String]) -> usize {
        let single = words.iter().filter(|w| self.terms.contains(*w)).count();
        let multi: usize = self
            .phrases
            .iter()
            .map(|phrase| {
                words
                    .windows(phrase.len())
                    .filter(|window| window == &phrase.as_slice())
                    .count()
                    * phrase.len()
            })
            .sum();
        single + multi
    }
}

impl Classifier for LexiconClassifier {
    fn classify(&self, text: &str) -> Result<Classification, ClassifierError> {
        if self.is_empty() {
            return Ok(Classification::new(self.negative_label.as_str(), 1.0));
        }

        let words = tokenize(text);
        if words.is_empty() {
            return Ok(Classification::new(self.negative_label.as_str(), 1.0));
        }

        let density = self.count_hits(&words) as f32 / words.len() as f32;
        let positive = (density / SATURATION_DENSITY).min(1.0);
        if positive >= 0.5 {
            Ok(Classification::new(self.positive_label.as_str(), positive))
        } else {
            Ok(Classification::new(self.negative_label.as_str(), 1.0 - positive))
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}
