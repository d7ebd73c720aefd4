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

use anyhow::Context;
use harvestrs::application::use_cases::harvest_use_case;
use harvestrs::config::settings::Settings;
use harvestrs::infrastructure::metrics;
use harvestrs::utils::telemetry;
use std::net::SocketAddr;
use tracing::info;

/// 主函数
///
/// 加载配置，初始化日志与指标，执行一次采集运行并打印摘要
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting harvestrs...");

    // 2. Load configuration
    let settings = Settings::new().context("failed to load configuration")?;
    info!("Configuration loaded");

    // 3. Metrics
    let metrics_addr = settings
        .run
        .metrics_addr
        .as_deref()
        .map(str::parse::<SocketAddr>)
        .transpose()
        .context("invalid run.metrics_addr")?;
    let sampler = metrics::init_metrics(metrics_addr);

    // 4. Run
    let summary = harvest_use_case::run_from_settings(&settings).await?;

    if let Some(sampler) = sampler {
        sampler.abort();
    }
    println!("{}", summary.render());
    Ok(())
}
