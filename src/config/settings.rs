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

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// 运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HarvestMode {
    /// 原样归档为 WARC
    Archive,
    /// 提取、分类、过滤正文
    Content,
    /// 离线：从已有WARC文件提取并过滤正文
    Extract,
    /// 离线：对已有按行JSON文档重新过滤
    Clean,
}

impl HarvestMode {
    /// 是否需要联网抓取
    pub fn fetches(&self) -> bool {
        matches!(self, HarvestMode::Archive | HarvestMode::Content)
    }

    /// 模式默认的抓取工作器数量
    pub fn default_workers(&self) -> usize {
        match self {
            HarvestMode::Archive => 500,
            HarvestMode::Content => 1000,
            HarvestMode::Extract | HarvestMode::Clean => 1,
        }
    }

    /// 模式默认的单主机连接上限
    pub fn default_per_host_limit(&self) -> usize {
        match self {
            HarvestMode::Archive => 20,
            HarvestMode::Content | HarvestMode::Extract | HarvestMode::Clean => 30,
        }
    }

    /// 模式默认的响应体上限（字节）
    pub fn default_max_body_bytes(&self) -> usize {
        match self {
            HarvestMode::Archive => 10 * 1024 * 1024,
            HarvestMode::Content | HarvestMode::Extract | HarvestMode::Clean => 5 * 1024 * 1024,
        }
    }
}

impl fmt::Display for HarvestMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HarvestMode::Archive => f.write_str("archive"),
            HarvestMode::Content => f.write_str("content"),
            HarvestMode::Extract => f.write_str("extract"),
            HarvestMode::Clean => f.write_str("clean"),
        }
    }
}

/// 应用程序配置设置
///
/// 包含运行参数、抓取参数和内容过滤参数
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 运行配置
    pub run: RunSettings,
    /// 抓取配置
    pub fetch: FetchSettings,
    /// 内容管道配置
    pub content: ContentSettings,
}

/// 运行配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct RunSettings {
    /// 运行模式
    pub mode: HarvestMode,
    /// URL列表文件路径（可为gzip压缩）
    pub input: String,
    /// 输出文件路径
    pub output: String,
    /// 抓取工作器数量，未设置时使用模式默认值
    pub workers: Option<usize>,
    /// 最多处理的URL数量
    pub limit: Option<usize>,
    /// 是否关闭进度条
    pub quiet: bool,
    /// 期望的文件描述符上限
    pub fd_limit: u64,
    /// Prometheus 指标监听地址
    pub metrics_addr: Option<String>,
    /// 统一的请求超时（秒），设置后覆盖 fetch 中的各项超时
    pub timeout_secs: Option<u64>,
}

/// 抓取配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct FetchSettings {
    /// 连接超时（秒）
    pub connect_timeout_secs: u64,
    /// 读取超时（秒）
    pub read_timeout_secs: u64,
    /// 总超时（秒）
    pub total_timeout_secs: u64,
    /// 外层截止时间相对总超时的余量（秒）
    pub wrapper_grace_secs: u64,
    /// 单主机连接上限，未设置时使用模式默认值
    pub per_host_limit: Option<usize>,
    /// 响应体上限（字节），未设置时使用模式默认值
    pub max_body_bytes: Option<usize>,
    /// User-Agent
    pub user_agent: String,
    /// 最大重定向次数
    pub max_redirects: usize,
}

/// 内容管道配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ContentSettings {
    /// CPU处理线程数，未设置时为 核数-2（至少1）
    pub cpu_workers: Option<usize>,
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
    /// NSFW词表路径
    pub nsfw_lexicon: Option<String>,
    /// 有害言论词表路径
    pub toxic_lexicon: Option<String>,
}

/// 解析后的抓取超时
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTimeouts {
    /// 连接超时
    pub connect: Duration,
    /// 读取超时
    pub read: Duration,
    /// 总超时
    pub total: Duration,
    /// 外层截止时间
    pub wrapper: Duration,
}

impl FetchTimeouts {
    /// 从单一超时值推导各项超时
    ///
    /// total = t，connect = max(3, t/3)，read = max(5, t/2)，两者都不超过 t。
    pub fn from_single(total_secs: u64, grace_secs: u64) -> Self {
        let connect = (total_secs / 3).max(3).min(total_secs);
        let read = (total_secs / 2).max(5).min(total_secs);
        Self {
            connect: Duration::from_secs(connect),
            read: Duration::from_secs(read),
            total: Duration::from_secs(total_secs),
            wrapper: Duration::from_secs(total_secs + grace_secs),
        }
    }
}

impl Default for FetchTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            read: Duration::from_secs(10),
            total: Duration::from_secs(15),
            wrapper: Duration::from_secs(20),
        }
    }
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加：代码默认值、`config/default`、`config/{APP_ENVIRONMENT}`、
    /// 以 `HARVESTRS__` 为前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("HARVESTRS")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("content.target_languages")
                    .try_parsing(true),
            );

        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// 仅包含代码默认值的构建器
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            // Run
            .set_default("run.mode", "archive")?
            .set_default("run.input", "urls.txt")?
            .set_default("run.output", "output.warc.gz")?
            .set_default("run.quiet", false)?
            .set_default("run.fd_limit", 10000)?
            // Fetch
            .set_default("fetch.connect_timeout_secs", 5)?
            .set_default("fetch.read_timeout_secs", 10)?
            .set_default("fetch.total_timeout_secs", 15)?
            .set_default("fetch.wrapper_grace_secs", 5)?
            .set_default(
                "fetch.user_agent",
                "Mozilla/5.0 (compatible; harvestrs/0.1; +https://github.com/Kirky-X)",
            )?
            .set_default("fetch.max_redirects", 10)?
            // Content
            .set_default("content.target_languages", vec!["en"])?
            .set_default("content.language_threshold", 0.5)?
            .set_default("content.nsfw_threshold", 0.9)?
            .set_default("content.toxic_threshold", 0.9)?
            .set_default("content.min_text_chars", 100)?
            .set_default("content.quality_filter", true)?
            .set_default("content.mask_pii", false)
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.run.workers == Some(0) {
            return Err(ConfigError::Message("run.workers must be at least 1".into()));
        }
        if self.content.cpu_workers == Some(0) {
            return Err(ConfigError::Message(
                "content.cpu_workers must be at least 1".into(),
            ));
        }
        if self.fetch.per_host_limit == Some(0) {
            return Err(ConfigError::Message(
                "fetch.per_host_limit must be at least 1".into(),
            ));
        }
        if self.fetch.max_body_bytes == Some(0) {
            return Err(ConfigError::Message(
                "fetch.max_body_bytes must be at least 1".into(),
            ));
        }
        if self.run.timeout_secs == Some(0) {
            return Err(ConfigError::Message("run.timeout_secs must be positive".into()));
        }
        if self.run.timeout_secs.is_none() {
            let f = &self.fetch;
            if f.connect_timeout_secs == 0 || f.read_timeout_secs == 0 || f.total_timeout_secs == 0
            {
                return Err(ConfigError::Message("fetch timeouts must be positive".into()));
            }
            if f.connect_timeout_secs > f.total_timeout_secs
                || f.read_timeout_secs > f.total_timeout_secs
            {
                return Err(ConfigError::Message(
                    "fetch connect/read timeouts must not exceed the total timeout".into(),
                ));
            }
        }
        Ok(())
    }

    /// 实际使用的抓取工作器数量
    pub fn workers(&self) -> usize {
        self.run
            .workers
            .unwrap_or_else(|| self.run.mode.default_workers())
    }

    /// 实际使用的单主机连接上限
    pub fn per_host_limit(&self) -> usize {
        self.fetch
            .per_host_limit
            .unwrap_or_else(|| self.run.mode.default_per_host_limit())
    }

    /// 实际使用的响应体上限
    pub fn max_body_bytes(&self) -> usize {
        self.fetch
            .max_body_bytes
            .unwrap_or_else(|| self.run.mode.default_max_body_bytes())
    }

    /// 实际使用的CPU处理线程数
    pub fn cpu_workers(&self) -> usize {
        self.content
            .cpu_workers
            .unwrap_or_else(|| num_cpus::get().saturating_sub(2).max(1))
    }

    /// 解析抓取超时
    pub fn timeouts(&self) -> FetchTimeouts {
        match self.run.timeout_secs {
            Some(t) => FetchTimeouts::from_single(t, self.fetch.wrapper_grace_secs),
            None => FetchTimeouts {
                connect: Duration::from_secs(self.fetch.connect_timeout_secs),
                read: Duration::from_secs(self.fetch.read_timeout_secs),
                total: Duration::from_secs(self.fetch.total_timeout_secs),
                wrapper: Duration::from_secs(
                    self.fetch.total_timeout_secs + self.fetch.wrapper_grace_secs,
                ),
            },
        }
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
