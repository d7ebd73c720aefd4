// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 抓取失败类型
///
/// 封闭的失败分类，每次抓取尝试最多记录一种。新增类别必须修改此枚举，
/// 所有计数点都使用穷尽匹配。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// HTTP状态码 >= 400
    HttpError,
    /// 任一阶段超过其超时时间
    Timeout,
    /// TCP/TLS连接无法建立
    ConnectFail,
    /// 其他协议层错误
    ClientError,
    /// 外层截止时间触发，放弃本次尝试
    WrapperTimeout,
    /// 未分类的异常
    Other,
}

impl FailureKind {
    /// 全部失败类型，按声明顺序
    pub const ALL: [FailureKind; 6] = [
        FailureKind::HttpError,
        FailureKind::Timeout,
        FailureKind::ConnectFail,
        FailureKind::ClientError,
        FailureKind::WrapperTimeout,
        FailureKind::Other,
    ];

    /// 稳定的字符串名称
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::HttpError => "http_error",
            FailureKind::Timeout => "timeout",
            FailureKind::ConnectFail => "connect_fail",
            FailureKind::ClientError => "client_error",
            FailureKind::WrapperTimeout => "wrapper_timeout",
            FailureKind::Other => "other",
        }
    }

    /// 在计数数组中的下标
    pub fn index(&self) -> usize {
        match self {
            FailureKind::HttpError => 0,
            FailureKind::Timeout => 1,
            FailureKind::ConnectFail => 2,
            FailureKind::ClientError => 3,
            FailureKind::WrapperTimeout => 4,
            FailureKind::Other => 5,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailureKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "http_error" => Ok(FailureKind::HttpError),
            "timeout" => Ok(FailureKind::Timeout),
            "connect_fail" => Ok(FailureKind::ConnectFail),
            "client_error" => Ok(FailureKind::ClientError),
            "wrapper_timeout" => Ok(FailureKind::WrapperTimeout),
            "other" => Ok(FailureKind::Other),
            _ => Err(()),
        }
    }
}

/// 抓取失败
#[derive(Error, Debug, Clone)]
#[error("{kind}: {message}")]
pub struct FetchFailure {
    /// 失败类型
    pub kind: FailureKind,
    /// 人类可读的描述
    pub message: String,
}

impl FetchFailure {
    /// 创建新的抓取失败
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// 成功抓取的页面
///
/// 由抓取工作器创建，转交给处理阶段或直接交给结果写入器。
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// 原始请求URL
    pub url: String,
    /// 跟随重定向后的最终URL
    pub final_url: String,
    /// HTTP状态码
    pub status: u16,
    /// 状态原因短语
    pub reason: String,
    /// 响应头，保持服务器返回的顺序
    pub headers: Vec<(String, String)>,
    /// 响应体（已按上限截断）
    pub body: Bytes,
    /// 响应体是否被截断
    pub truncated: bool,
    /// 抓取完成时间
    pub fetched_at: DateTime<Utc>,
}

impl FetchedPage {
    /// 查找响应头（不区分大小写），返回第一个匹配值
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// 响应的内容类型
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// 是否发生过重定向
    pub fn was_redirected(&self) -> bool {
        self.url != self.final_url
    }
}
