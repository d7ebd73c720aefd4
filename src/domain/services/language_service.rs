// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::classifier::{Classification, Classifier, ClassifierError};
use std::collections::HashSet;

/// 拉丁字母语言的高频停用词
const STOPWORDS: &[(&str, &[&str])] = &[
    (
        "en",
        &[
            "the", "and", "of", "to", "in", "is", "that", "it", "for", "was", "on", "are",
            "with", "as", "this", "be", "at", "by", "from", "have", "or", "not", "but", "you",
        ],
    ),
    (
        "de",
        &[
            "der", "die", "und", "in", "den", "von", "zu", "das", "mit", "sich", "des", "auf",
            "für", "ist", "im", "dem", "nicht", "ein", "eine", "als", "auch", "es", "an", "wird",
        ],
    ),
    (
        "fr",
        &[
            "le", "la", "les", "de", "des", "et", "en", "un", "une", "du", "est", "que", "qui",
            "dans", "pour", "pas", "sur", "au", "avec", "ce", "il", "sont", "par", "plus",
        ],
    ),
    (
        "es",
        &[
            "el", "la", "de", "que", "y", "en", "los", "del", "se", "las", "por", "un", "para",
            "con", "no", "una", "su", "al", "es", "lo", "como", "más", "pero", "sus",
        ],
    ),
    (
        "it",
        &[
            "il", "di", "che", "e", "la", "per", "un", "in", "non", "del", "della", "sono",
            "una", "con", "si", "da", "le", "gli", "anche", "come", "ma", "alla", "nel", "più",
        ],
    ),
    (
        "pt",
        &[
            "o", "de", "que", "e", "do", "da", "em", "um", "para", "com", "não", "uma", "os",
            "no", "se", "na", "por", "mais", "as", "dos", "como", "mas", "ao", "das",
        ],
    ),
    (
        "nl",
        &[
            "de", "het", "een", "en", "van", "in", "is", "dat", "op", "te", "zijn", "voor",
            "met", "niet", "die", "aan", "er", "ook", "als", "bij", "maar", "om", "nog", "wordt",
        ],
    ),
];

/// 非拉丁文字与其语言
const SCRIPTS: &[(&str, fn(char) -> bool)] = &[
    ("zh", is_han),
    ("ja", is_kana),
    ("ko", is_hangul),
    ("ru", is_cyrillic),
    ("ar", is_arabic),
    ("el", is_greek),
    ("he", is_hebrew),
    ("hi", is_devanagari),
    ("th", is_thai),
];

/// 基于文字和停用词的语言识别器
///
/// 先按文字系统判断（汉字、假名、西里尔字母等），拉丁文字再按停用词命中率区分语言。
/// 置信度为获胜语言的占比。
pub struct ScriptLanguageIdentifier {
    stopwords: Vec<(&'static str, HashSet<&'static str>)>,
}

impl ScriptLanguageIdentifier {
    /// 创建语言识别器
    pub fn new() -> Self {
        Self {
            stopwords: STOPWORDS
                .iter()
                .map(|(lang, words)| (*lang, words.iter().copied().collect()))
                .collect(),
        }
    }

    fn classify_script(&self, text: &str) -> Option<Classification> {
        let mut counts = vec![0usize; SCRIPTS.len()];
        let mut latin = 0usize;
        for c in text.chars().filter(|c| c.is_alphabetic()) {
            if c.is_ascii_alphabetic() || ('\u{00C0}'..='\u{024F}').contains(&c) {
                latin += 1;
                continue;
            }
            if let Some(i) = SCRIPTS.iter().position(|(_, test)| test(c)) {
                counts[i] += 1;
            }
        }

        let letters = latin + counts.iter().sum::<usize>();
        if letters == 0 {
            return None;
        }

        let (best, best_count) = counts
            .iter()
            .enumerate()
            .max_by_key(|(_, count)| **count)
            .map(|(i, count)| (i, *count))?;

        // Japanese text mixes kana with kanji; kana presence decides it.
        let ja = counts[1];
        if ja > 0 && ja * 10 >= counts[0] {
            let share = (ja + counts[0]) as f32 / letters as f32;
            if share > 0.5 {
                return Some(Classification::new("ja", share));
            }
        }

        if best_count * 2 > letters {
            return Some(Classification::new(
                SCRIPTS[best].0,
                best_count as f32 / letters as f32,
            ));
        }
        None
    }

    fn classify_latin(&self, text: &str) -> Classification {
        let mut hits = vec![0usize; self.stopwords.len()];
        let mut words = 0usize;
        for word in text
            .split(|c: char| !c.is_alphabetic())
            .filter(|w| !w.is_empty())
        {
            words += 1;
            let lower = word.to_lowercase();
            for (i, (_, set)) in self.stopwords.iter().enumerate() {
                if set.contains(lower.as_str()) {
                    hits[i] += 1;
                }
            }
        }

        let total_hits: usize = hits.iter().sum();
        if total_hits == 0 || words == 0 {
            return Classification::new("unknown", 0.0);
        }

        let (best, best_hits) = hits
            .iter()
            .enumerate()
            .max_by_key(|(_, h)| **h)
            .map(|(i, h)| (i, *h))
            .unwrap_or((0, 0));

        // share of stop-word hits won, damped when the text has few stop words
        let share = best_hits as f32 / total_hits as f32;
        let density = (best_hits as f32 / words as f32 / 0.2).min(1.0);
        Classification::new(self.stopwords[best].0, share * (0.5 + 0.5 * density))
    }
}

impl Default for ScriptLanguageIdentifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for ScriptLanguageIdentifier {
    fn classify(&self, text: &str) -> Result<Classification, ClassifierError> {
        let text = text.replace('\n', " ");
        if text.trim().is_empty() {
            return Ok(Classification::new("unknown", 0.0));
        }
        Ok(self
            .classify_script(&text)
            .unwrap_or_else(|| self.classify_latin(&text)))
    }

    fn name(&self) -> &'static str {
        "language"
    }
}

fn is_han(c: char) -> bool {
    matches!(c as u32, 0x4E00..=0x9FFF | 0x3400..=0x4DBF | 0xF900..=0xFAFF)
}

fn is_kana(c: char) -> bool {
    matches!(c as u32, 0x3040..=0x30FF)
}

fn is_hangul(c: char) -> bool {
    matches!(c as u32, 0xAC00..=0xD7AF | 0x1100..=0x11FF)
}

fn is_cyrillic(c: char) -> bool {
    matches!(c as u32, 0x0400..=0x04FF)
}

fn is_arabic(c: char) -> bool {
    matches!(c as u32, 0x0600..=0x06FF)
}

fn is_greek(c: char) -> bool {
    matches!(c as u32, 0x0370..=0x03FF)
}

fn is_hebrew(c: char) -> bool {
    matches!(c as u32, 0x0590..=0x05FF)
}

fn is_devanagari(c: char) -> bool {
    matches!(c as u32, 0x0900..=0x097F)
}

fn is_thai(c: char) -> bool {
    matches!(c as u32, 0x0E00..=0x0E7F)
}
