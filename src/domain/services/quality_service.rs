// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// Gopher质量规则参数
#[derive(Debug, Clone, PartialEq)]
pub struct GopherRules {
    /// 最少词数
    pub min_words: usize,
    /// 最多词数
    pub max_words: usize,
    /// 平均词长下限
    pub min_mean_word_len: f64,
    /// 平均词长上限
    pub max_mean_word_len: f64,
    /// 以省略号结尾的行的最大占比
    pub max_ellipsis_line_ratio: f64,
    /// 含字母的词的最小占比
    pub min_alpha_word_ratio: f64,
}

impl Default for GopherRules {
    fn default() -> Self {
        Self {
            min_words: 50,
            max_words: 100_000,
            min_mean_word_len: 3.0,
            max_mean_word_len: 10.0,
            max_ellipsis_line_ratio: 0.3,
            min_alpha_word_ratio: 0.8,
        }
    }
}

/// 质量检查未通过的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityFailure {
    TooFewWords,
    TooManyWords,
    MeanWordLength,
    EllipsisLines,
    NonAlphabetic,
}

/// 质量过滤服务
///
/// 按空白切词，依次检查词数、平均词长、省略号行占比和字母词占比。
pub struct QualityService {
    rules: GopherRules,
}

impl QualityService {
    /// 创建质量过滤服务
    pub fn new(rules: GopherRules) -> Self {
        Self { rules }
    }

    /// 检查文本质量
    pub fn check(&self, text: &str) -> Result<(), QualityFailure> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let count = words.len();

        if count < self.rules.min_words {
            return Err(QualityFailure::TooFewWords);
        }
        if count > self.rules.max_words {
            return Err(QualityFailure::TooManyWords);
        }

        let total_len: usize = words.iter().map(|w| w.chars().count()).sum();
        let mean = total_len as f64 / count as f64;
        if mean < self.rules.min_mean_word_len || mean > self.rules.max_mean_word_len {
            return Err(QualityFailure::MeanWordLength);
        }

        // a trailing newline yields an empty last line that still counts
        let lines: Vec<&str> = text.split('\n').collect();
        let ellipsis = lines
            .iter()
            .filter(|l| l.trim_end().ends_with("..."))
            .count();
        if ellipsis as f64 / lines.len() as f64 > self.rules.max_ellipsis_line_ratio {
            return Err(QualityFailure::EllipsisLines);
        }

        let alpha = words
            .iter()
            .filter(|w| w.chars().any(|c| c.is_alphabetic()))
            .count();
        if (alpha as f64 / count as f64) < self.rules.min_alpha_word_ratio {
            return Err(QualityFailure::NonAlphabetic);
        }

        Ok(())
    }

    /// 是否通过质量检查
    pub fn passes(&self, text: &str) -> bool {
        self.check(text).is_ok()
    }
}

impl Default for QualityService {
    fn default() -> Self {
        Self::new(GopherRules::default())
    }
}
