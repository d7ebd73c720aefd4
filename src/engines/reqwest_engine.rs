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

use crate::config::settings::{FetchTimeouts, HarvestMode, Settings};
use crate::domain::models::fetch::{FailureKind, FetchFailure, FetchedPage};
use crate::domain::models::task::UrlTask;
use crate::engines::host_limiter::HostLimiter;
use crate::engines::traits::FetchEngine;
use async_trait::async_trait;
use bytes::BytesMut;
use chrono::Utc;
use reqwest::redirect::Policy;
use tracing::trace;

/// 引擎配置
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// 超时设置
    pub timeouts: FetchTimeouts,
    /// User-Agent
    pub user_agent: String,
    /// 最大重定向次数
    pub max_redirects: usize,
    /// 响应体上限（字节）
    pub max_body_bytes: usize,
    /// 单主机连接上限
    pub per_host_limit: usize,
    /// 是否透明解压响应体
    pub decompress: bool,
}

impl EngineConfig {
    /// 从应用配置构建
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            timeouts: settings.timeouts(),
            user_agent: settings.fetch.user_agent.clone(),
            max_redirects: settings.fetch.max_redirects,
            max_body_bytes: settings.max_body_bytes(),
            per_host_limit: settings.per_host_limit(),
            // archived payloads keep the bytes exactly as served
            decompress: settings.run.mode == HarvestMode::Content,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeouts: FetchTimeouts::default(),
            user_agent: "Mozilla/5.0 (compatible; harvestrs/0.1)".to_string(),
            max_redirects: 10,
            max_body_bytes: 10 * 1024 * 1024,
            per_host_limit: 20,
            decompress: false,
        }
    }
}

/// 抓取引擎
///
/// 基于reqwest实现的HTTP抓取引擎。整个运行共享一个客户端与连接池。
pub struct ReqwestEngine {
    client: reqwest::Client,
    limiter: HostLimiter,
    max_body_bytes: usize,
}

impl ReqwestEngine {
    /// 创建抓取引擎
    ///
    /// # 参数
    ///
    /// * `config` - 引擎配置
    ///
    /// # 返回值
    ///
    /// * `Ok(ReqwestEngine)` - 引擎实例
    /// * `Err(reqwest::Error)` - 客户端构建失败
    pub fn new(config: EngineConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(config.timeouts.connect)
            .read_timeout(config.timeouts.read)
            .timeout(config.timeouts.total)
            .redirect(Policy::limited(config.max_redirects))
            .pool_max_idle_per_host(config.per_host_limit);

        if !config.decompress {
            builder = builder.no_gzip().no_brotli();
        }

        Ok(Self {
            client: builder.build()?,
            limiter: HostLimiter::new(config.per_host_limit),
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// 单主机限流器
    pub fn limiter(&self) -> &HostLimiter {
        &self.limiter
    }
}

#[async_trait]
impl FetchEngine for ReqwestEngine {
    /// 执行HTTP抓取
    ///
    /// 在获得主机许可后发起请求；状态码 >= 400 时不读取响应体。
    async fn fetch(&self, task: &UrlTask) -> Result<FetchedPage, FetchFailure> {
        let _permit = self
            .limiter
            .acquire(&task.url)
            .await
            .map_err(|e| FetchFailure::new(FailureKind::Other, e.to_string()))?;

        let mut response = self.client.get(&task.url).send().await?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(FetchFailure::new(
                FailureKind::HttpError,
                format!("HTTP {}", status.as_u16()),
            ));
        }

        let final_url = response.url().to_string();
        // HeaderMap does not keep wire order or case: names are lowercase, repeats grouped
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let hint = response
            .content_length()
            .map(|len| (len as usize).min(self.max_body_bytes))
            .unwrap_or(0);
        let mut body = BytesMut::with_capacity(hint);
        let mut truncated = false;
        while let Some(chunk) = response.chunk().await? {
            let remaining = self.max_body_bytes - body.len();
            if chunk.len() > remaining {
                body.extend_from_slice(&chunk[..remaining]);
                truncated = true;
                break;
            }
            body.extend_from_slice(&chunk);
        }

        if truncated {
            trace!("Body of {} truncated at {} bytes", task.url, self.max_body_bytes);
        }

        Ok(FetchedPage {
            url: task.url.clone(),
            final_url,
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            headers,
            body: body.freeze(),
            truncated,
            fetched_at: Utc::now(),
        })
    }

    /// 获取引擎名称
    fn name(&self) -> &'static str {
        "reqwest"
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
