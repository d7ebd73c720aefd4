// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::fetch::{FailureKind, FetchFailure, FetchedPage};
use crate::domain::models::task::UrlTask;
use async_trait::async_trait;

/// 抓取引擎特质
///
/// 一次抓取尝试要么得到页面，要么得到恰好一种分类后的失败。不做重试。
#[async_trait]
pub trait FetchEngine: Send + Sync {
    /// 执行抓取
    async fn fetch(&self, task: &UrlTask) -> Result<FetchedPage, FetchFailure>;

    /// 引擎名称
    fn name(&self) -> &'static str;
}

/// 将 reqwest 错误归类为失败类型
///
/// 超时优先判断：连接阶段的超时也记为 `timeout`。
pub fn classify_reqwest_error(error: &reqwest::Error) -> FailureKind {
    if error.is_timeout() {
        FailureKind::Timeout
    } else if error.is_connect() {
        FailureKind::ConnectFail
    } else if error.is_builder()
        || error.is_request()
        || error.is_redirect()
        || error.is_body()
        || error.is_decode()
    {
        FailureKind::ClientError
    } else {
        FailureKind::Other
    }
}

impl From<reqwest::Error> for FetchFailure {
    fn from(error: reqwest::Error) -> Self {
        let kind = classify_reqwest_error(&error);
        FetchFailure::new(kind, error.without_url().to_string())
    }
}
