use crate::utils::text_encoding::decode_body;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Node};
use thiserror::Error;

/// 声明为这些类型的响应不含可提取的正文
const BINARY_TYPES: &[&str] = &[
    "image/",
    "audio/",
    "video/",
    "font/",
    "application/pdf",
    "application/zip",
    "application/gzip",
    "application/x-gzip",
];

/// 判定二进制内容时检查的前缀长度
const SNIFF_LEN: usize = 1024;

static MARKUP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)<(?:!doctype|!--|html|head|body|script|style|meta|link|title|div|span|p|br|a|table|ul|ol|li|h[1-6])[\s>/]",
    )
    .unwrap()
});

/// 不产生可见文本的元素
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "template", "svg", "math", "iframe", "object", "canvas",
];

/// 块级元素：其中的文本另起一行
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "details", "dialog", "div",
    "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4",
    "h5", "h6", "header", "hr", "html", "li", "main", "nav", "ol", "p", "pre", "section",
    "summary", "table", "td", "th", "title", "tr", "ul",
];

/// 提取错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("不支持的内容类型: {0}")]
    UnsupportedContentType(String),
}

/// 提取服务
///
/// 负责把响应字节解码并提取可见文本
pub struct ExtractionService;

impl ExtractionService {
    /// 提取正文
    ///
    /// 内容类型只作为字符集提示：正文中出现HTML标记时总是按HTML提取，
    /// 即使响应被标为 `text/plain` 或 `application/octet-stream`。
    /// 声明为图片、音视频、压缩包等类型，或前 1KiB 含 NUL 字节的响应返回错误。
    pub fn extract_text(body: &[u8], content_type: Option<&str>) -> Result<String, ExtractionError> {
        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|m| m.trim().to_ascii_lowercase())
            .unwrap_or_default();

        if BINARY_TYPES.iter().any(|t| mime.starts_with(t)) {
            return Err(ExtractionError::UnsupportedContentType(mime));
        }
        if body[..body.len().min(SNIFF_LEN)].contains(&0) {
            let label = if mime.is_empty() { "binary".to_string() } else { mime };
            return Err(ExtractionError::UnsupportedContentType(label));
        }

        let (decoded, _) = decode_body(body, content_type);
        if mime == "text/plain" && !Self::looks_like_markup(&decoded) {
            return Ok(decoded.trim().to_string());
        }
        Ok(Self::html_to_text(&decoded))
    }

    /// 文本中是否含有HTML标记
    pub fn looks_like_markup(text: &str) -> bool {
        MARKUP_RE.is_match(text)
    }

    /// 从HTML中提取可见文本
    ///
    /// 跳过脚本、样式等不可见元素；不同块级元素中的文本以换行分隔，
    /// 同一块内的空白折叠为单个空格。
    pub fn html_to_text(html: &str) -> String {
        let document = Html::parse_document(html);

        let mut out = String::new();
        let mut last_block = None;
        let mut line_break = false;
        let mut gap = false;

        for node in document.root_element().descendants() {
            match node.value() {
                Node::Element(element) if element.name() == "br" => {
                    line_break = true;
                }
                Node::Text(text) => {
                    let raw: &str = text;
                    let skipped = node.ancestors().any(|a| {
                        a.value()
                            .as_element()
                            .is_some_and(|e| SKIPPED_ELEMENTS.contains(&e.name()))
                    });
                    if skipped {
                        continue;
                    }

                    let words: Vec<&str> = raw.split_whitespace().collect();
                    if words.is_empty() {
                        gap |= !raw.is_empty();
                        continue;
                    }

                    let block = node
                        .ancestors()
                        .find(|a| {
                            a.value()
                                .as_element()
                                .is_some_and(|e| BLOCK_ELEMENTS.contains(&e.name()))
                        })
                        .map(|a| a.id());

                    if !out.is_empty() {
                        if line_break || block != last_block {
                            out.push('\n');
                        } else if gap || raw.starts_with(char::is_whitespace) {
                            out.push(' ');
                        }
                    }
                    out.push_str(&words.join(" "));

                    last_block = block;
                    line_break = false;
                    gap = raw.ends_with(char::is_whitespace);
                }
                _ => {}
            }
        }

        out
    }
}

#[cfg(test)]
#[path = "extraction_service_test.rs"]
mod tests;
