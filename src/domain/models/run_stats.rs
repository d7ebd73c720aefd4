// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::document::RejectKind;
use crate::domain::models::fetch::FailureKind;
use metrics::counter;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// 单个任务的终态结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// 结果已写入输出文件
    Saved,
    /// 抓取失败
    Failed(FailureKind),
    /// 抓取成功但处理阶段没有产出（被过滤或处理异常）
    Rejected(RejectKind),
}

/// 运行统计
///
/// 所有工作器共享的进程级计数器，只使用原子自增，不存在无保护的读改写。
#[derive(Debug, Default)]
pub struct RunStats {
    seen: AtomicU64,
    saved: AtomicU64,
    failures: [AtomicU64; 6],
    rejections: [AtomicU64; 6],
}

impl RunStats {
    /// 创建新的统计实例
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个已投入队列的任务
    pub fn record_seen(&self) {
        self.seen.fetch_add(1, Ordering::Relaxed);
        counter!("harvest_urls_total").increment(1);
    }

    /// 记录任务的终态结果
    pub fn record(&self, outcome: Outcome) {
        match outcome {
            Outcome::Saved => {
                self.saved.fetch_add(1, Ordering::Relaxed);
                counter!("harvest_saved_total").increment(1);
            }
            Outcome::Failed(kind) => {
                self.failures[kind.index()].fetch_add(1, Ordering::Relaxed);
                counter!("harvest_failed_total", "kind" => kind.as_str()).increment(1);
            }
            Outcome::Rejected(kind) => {
                self.rejections[kind.index()].fetch_add(1, Ordering::Relaxed);
                counter!("harvest_failed_total", "kind" => kind.as_str()).increment(1);
            }
        }
    }

    /// 已投入的任务数
    pub fn seen(&self) -> u64 {
        self.seen.load(Ordering::Relaxed)
    }

    /// 已保存的任务数
    pub fn saved(&self) -> u64 {
        self.saved.load(Ordering::Relaxed)
    }

    /// 被处理阶段丢弃的任务数
    pub fn rejected(&self) -> u64 {
        RejectKind::ALL.iter().map(|k| self.rejections_of(*k)).sum()
    }

    /// 指定丢弃类型的计数
    pub fn rejections_of(&self, kind: RejectKind) -> u64 {
        self.rejections[kind.index()].load(Ordering::Relaxed)
    }

    /// 指定失败类型的计数
    pub fn failures_of(&self, kind: FailureKind) -> u64 {
        self.failures[kind.index()].load(Ordering::Relaxed)
    }

    /// 失败总数（包括被丢弃的任务）
    pub fn failed(&self) -> u64 {
        self.rejected() + FailureKind::ALL.iter().map(|k| self.failures_of(*k)).sum::<u64>()
    }

    /// 已有终态的任务数
    pub fn completed(&self) -> u64 {
        self.saved() + self.failed()
    }

    /// 获取当前快照
    pub fn snapshot(&self) -> StatsSnapshot {
        let saved = self.saved();
        let failed = self.failed();
        let total = saved + failed;

        let mut breakdown: Vec<BreakdownEntry> = FailureKind::ALL
            .iter()
            .map(|kind| (kind.as_str(), self.failures_of(*kind)))
            .chain(
                RejectKind::ALL
                    .iter()
                    .map(|kind| (kind.as_str(), self.rejections_of(*kind))),
            )
            .filter(|(_, count)| *count > 0)
            .map(|(name, count)| BreakdownEntry {
                name: name.to_string(),
                count,
                percent: if total > 0 {
                    100.0 * count as f64 / total as f64
                } else {
                    0.0
                },
            })
            .collect();
        breakdown.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

        StatsSnapshot {
            seen: self.seen(),
            total,
            saved,
            failed,
            breakdown,
        }
    }
}

/// 失败分类条目
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownEntry {
    /// 类别名称
    pub name: String,
    /// 次数
    pub count: u64,
    /// 占已尝试总数的百分比
    pub percent: f64,
}

/// 统计快照
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// 投入队列的任务数
    pub seen: u64,
    /// 已尝试（有终态）的任务数
    pub total: u64,
    /// 已保存
    pub saved: u64,
    /// 已失败
    pub failed: u64,
    /// 失败分类，按次数降序
    pub breakdown: Vec<BreakdownEntry>,
}

impl StatsSnapshot {
    /// 失败分类，按次数降序、名称升序
    pub fn breakdown(&self) -> &[BreakdownEntry] {
        &self.breakdown
    }

    /// 查找某个类别的次数
    pub fn count_of(&self, name: &str) -> u64 {
        self.breakdown
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.count)
            .unwrap_or(0)
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Attempted: {}", self.total)?;
        writeln!(f, "Saved:     {}", self.saved)?;
        writeln!(f, "Failed:    {}", self.failed)?;
        if !self.breakdown.is_empty() {
            writeln!(f, "Error breakdown:")?;
            for entry in &self.breakdown {
                writeln!(f, "  - {}: {} ({:.1}%)", entry.name, entry.count, entry.percent)?;
            }
        }
        Ok(())
    }
}
