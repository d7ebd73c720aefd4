// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;

pub const EMAIL_MASK: &str = "|||EMAIL_ADDRESS|||";
pub const PHONE_MASK: &str = "|||PHONE_NUMBER|||";
pub const IP_MASK: &str = "|||IP_ADDRESS|||";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap()
});

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}").unwrap());

static IPV4_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\.){3}(?:25[0-5]|2[0-4]\d|1\d\d|[1-9]?\d)\b")
        .unwrap()
});

/// 脱敏统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaskCounts {
    pub emails: usize,
    pub phones: usize,
    pub ips: usize,
}

impl MaskCounts {
    /// 脱敏总数
    pub fn total(&self) -> usize {
        self.emails + self.phones + self.ips
    }
}

/// 替换邮箱地址，返回替换后的文本与替换次数
pub fn mask_emails(text: &str) -> (String, usize) {
    replace_counting(&EMAIL_RE, text, EMAIL_MASK)
}

/// 替换美国格式电话号码
pub fn mask_phone_numbers(text: &str) -> (String, usize) {
    replace_counting(&PHONE_RE, text, PHONE_MASK)
}

/// 替换IPv4地址
pub fn mask_ips(text: &str) -> (String, usize) {
    replace_counting(&IPV4_RE, text, IP_MASK)
}

/// 依次替换邮箱、IP和电话号码
///
/// IP先于电话处理，避免点分地址被误识别为电话号码。
pub fn mask_all(text: &str) -> (String, MaskCounts) {
    let (text, emails) = mask_emails(text);
    let (text, ips) = mask_ips(&text);
    let (text, phones) = mask_phone_numbers(&text);
    (text, MaskCounts { emails, phones, ips })
}

fn replace_counting(re: &Regex, text: &str, mask: &str) -> (String, usize) {
    let count = re.find_iter(text).count();
    if count == 0 {
        return (text.to_string(), 0);
    }
    (re.replace_all(text, mask).into_owned(), count)
}
