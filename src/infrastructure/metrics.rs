// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Duration;
use sysinfo::{MemoryRefreshKind, RefreshKind, System};
use tokio::task::JoinHandle;
use tracing::{info, warn};

static SYSTEM: Lazy<Mutex<System>> = Lazy::new(|| {
    Mutex::new(System::new_with_specifics(
        RefreshKind::nothing().with_memory(MemoryRefreshKind::everything()),
    ))
});

/// 初始化指标系统
///
/// 注册收集指标的描述；给出地址时启动 Prometheus HTTP 监听并定期采样内存占用。
pub fn init_metrics(addr: Option<SocketAddr>) -> Option<JoinHandle<()>> {
    describe_counter!("harvest_urls_total", "URLs fed to the work queue");
    describe_counter!("harvest_saved_total", "Records written to the output file");
    describe_counter!(
        "harvest_failed_total",
        "Tasks that ended without a saved record, by kind"
    );
    describe_gauge!("harvest_queue_depth", "Items waiting in the work queue");
    describe_gauge!(
        "system_memory_usage_ratio",
        "Current memory usage ratio (0.0 to 1.0)"
    );

    let addr = addr?;
    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!("Failed to install Prometheus recorder on {}: {}", addr, e);
        return None;
    }
    info!("Metrics exporter listening on {}", addr);

    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5));
        loop {
            interval.tick().await;
            gauge!("system_memory_usage_ratio").set(memory_usage());
        }
    }))
}

/// 获取当前系统内存使用率 (0.0 - 1.0)
pub fn memory_usage() -> f64 {
    match SYSTEM.lock() {
        Ok(mut sys) => {
            sys.refresh_memory();
            let total = sys.total_memory();
            if total > 0 {
                sys.used_memory() as f64 / total as f64
            } else {
                0.0
            }
        }
        Err(_) => 0.0,
    }
}
