// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};
use tracing::debug;

/// 编码检测结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingSource {
    /// 字节顺序标记
    Bom,
    /// Content-Type 中的 charset 参数
    Header,
    /// 合法的UTF-8
    Utf8,
    /// chardetng 猜测
    Detected,
}

/// 解码网页字节为UTF-8字符串
///
/// 依次尝试：BOM、响应头中的 charset、UTF-8 校验、chardetng 检测。
/// 解码永不失败，非法序列替换为 U+FFFD。
pub fn decode_body(input: &[u8], content_type: Option<&str>) -> (String, EncodingSource) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(input) {
        let (decoded, _) = encoding.decode_without_bom_handling(&input[bom_len..]);
        return (decoded.into_owned(), EncodingSource::Bom);
    }

    if let Some(encoding) = content_type.and_then(charset_from_content_type) {
        let (decoded, _, had_errors) = encoding.decode(input);
        if !had_errors || encoding != UTF_8 {
            return (decoded.into_owned(), EncodingSource::Header);
        }
    }

    if let Ok(text) = std::str::from_utf8(input) {
        return (text.to_string(), EncodingSource::Utf8);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(input, true);
    let encoding = detector.guess(None, true);
    debug!("Detected body encoding: {}", encoding.name());

    let (decoded, _, _) = encoding.decode(input);
    (decoded.into_owned(), EncodingSource::Detected)
}

/// 从 Content-Type 头中解析 charset
fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
        .and_then(|(_, value)| {
            Encoding::for_label(value.trim().trim_matches('"').as_bytes())
        })
}
