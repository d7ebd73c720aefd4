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

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// 每主机并发信号量管理器
///
/// 为每个主机提供一个独立的信号量，限制同时连接同一主机的请求数。
/// 主机没有持有者和等待者时，其信号量会从表中移除。
#[derive(Clone, Debug)]
pub struct HostLimiter {
    /// 存储每个主机的信号量
    semaphores: Arc<DashMap<String, Arc<Semaphore>>>,
    /// 每个主机的许可数
    permits_per_host: usize,
}

/// 主机许可
///
/// 释放时归还许可，并清理空闲主机的信号量。
#[derive(Debug)]
pub struct HostPermit {
    permit: Option<OwnedSemaphorePermit>,
    key: String,
    semaphores: Arc<DashMap<String, Arc<Semaphore>>>,
}

impl HostLimiter {
    /// 创建一个新的HostLimiter实例
    ///
    /// # 参数
    ///
    /// * `permits_per_host` - 每个主机的并发许可数
    pub fn new(permits_per_host: usize) -> Self {
        Self {
            semaphores: Arc::new(DashMap::new()),
            permits_per_host: permits_per_host.max(1),
        }
    }

    /// 获取URL所属主机的许可
    ///
    /// 主机已满时挂起等待。
    pub async fn acquire(&self, url: &str) -> Result<HostPermit, AcquireError> {
        let key = host_key(url);
        let permit = self.get_or_create(&key).acquire_owned().await?;
        Ok(HostPermit {
            permit: Some(permit),
            key,
            semaphores: self.semaphores.clone(),
        })
    }

    /// 当前跟踪的主机数
    pub fn tracked_hosts(&self) -> usize {
        self.semaphores.len()
    }

    /// 每个主机的许可数
    pub fn permits_per_host(&self) -> usize {
        self.permits_per_host
    }

    fn get_or_create(&self, key: &str) -> Arc<Semaphore> {
        self.semaphores
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.permits_per_host)))
            .clone()
    }
}

impl Drop for HostPermit {
    fn drop(&mut self) {
        drop(self.permit.take());
        // Only the map's own reference left means no holder and no waiter.
        self.semaphores
            .remove_if(&self.key, |_, semaphore| Arc::strong_count(semaphore) == 1);
    }
}

/// 计算主机键：小写 host[:port]
///
/// 无法解析的URL整体作为键。
pub fn host_key(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => match (parsed.host_str(), parsed.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host.to_ascii_lowercase(), port),
            (Some(host), None) => host.to_ascii_lowercase(),
            _ => url.to_ascii_lowercase(),
        },
        Err(_) => url.to_ascii_lowercase(),
    }
}
