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

use crate::{
    application::use_cases::refine_use_case,
    config::settings::{HarvestMode, Settings},
    domain::{
        models::{
            document::ProcessedDocument,
            run_stats::{RunStats, StatsSnapshot},
            task::UrlTask,
        },
        services::content_pipeline::ContentPipeline,
    },
    engines::{
        reqwest_engine::{EngineConfig, ReqwestEngine},
        traits::FetchEngine,
    },
    infrastructure::storage::{
        jsonl_writer::JsonlWriter, warc_writer::WarcWriter, RecordWriter,
    },
    queue::{
        url_source::{InputMode, UrlSource},
        work_queue::WorkQueue,
    },
    utils::{
        errors::{HarvestError, SinkError},
        fd_limit::raise_fd_limit,
    },
    workers::{
        manager::WorkerManager,
        offload_pool::OffloadPool,
        progress::ProgressReporter,
        result_sink::ResultSink,
        stage::{ArchiveStage, ContentStage, ProcessingStage},
    },
};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

/// 运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// 初始化：启动写入端与工作器
    Init,
    /// 运行中：从URL源向队列投递任务
    Running,
    /// 排空中：投递结束哨兵并等待工作器与写入端退出
    Draining,
    /// 已关闭（终态）
    Closed,
}

impl RunState {
    /// 检查状态转换是否合法
    pub fn can_transition_to(&self, next: RunState) -> bool {
        matches!(
            (self, next),
            (RunState::Init, RunState::Running)
                | (RunState::Running, RunState::Draining)
                | (RunState::Init, RunState::Closed)
                | (RunState::Running, RunState::Closed)
                | (RunState::Draining, RunState::Closed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Init => "init",
            RunState::Running => "running",
            RunState::Draining => "draining",
            RunState::Closed => "closed",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 运行参数
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// 抓取工作器数量
    pub workers: usize,
    /// 单次尝试的外层截止时间
    pub deadline: Duration,
    /// 期望的文件描述符上限
    pub fd_limit: u64,
    /// 是否隐藏进度条
    pub quiet: bool,
    /// 已知的URL数量上限，用于进度条长度
    pub limit: Option<usize>,
}

impl RunOptions {
    /// 从应用配置构建
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            workers: settings.workers(),
            deadline: settings.timeouts().wrapper,
            fd_limit: settings.run.fd_limit,
            quiet: settings.run.quiet,
            limit: settings.run.limit,
        }
    }
}

/// 运行摘要
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// 最终统计
    pub stats: StatsSnapshot,
    /// 输出文件路径
    pub output_path: PathBuf,
    /// 运行耗时
    pub elapsed: Duration,
}

impl RunSummary {
    /// 渲染为人类可读的摘要文本
    pub fn render(&self) -> String {
        format!(
            "Harvest finished in {:.1}s\nOutput: {}\n{}",
            self.elapsed.as_secs_f64(),
            self.output_path.display(),
            self.stats
        )
    }
}

/// 写入端提前结束的原因
enum SinkStop {
    Failed(SinkError),
    Panicked(JoinError),
}

impl From<SinkStop> for HarvestError {
    fn from(stop: SinkStop) -> Self {
        match stop {
            SinkStop::Failed(e) => HarvestError::Sink(e),
            SinkStop::Panicked(e) => HarvestError::Join(e),
        }
    }
}

type SinkHandle = JoinHandle<Result<u64, SinkError>>;

/// URL源与协调器之间的通道容量
const SOURCE_BUFFER: usize = 256;

/// 在阻塞线程上读取URL源
///
/// 文件读取与gzip解压不占用运行时线程；接收端被丢弃后读取线程随之退出。
fn spawn_source_reader<I>(source: I) -> (mpsc::Receiver<UrlTask>, JoinHandle<()>)
where
    I: IntoIterator<Item = UrlTask> + Send + 'static,
    I::IntoIter: Send,
{
    let (tx, rx) = mpsc::channel(SOURCE_BUFFER);
    let handle = tokio::task::spawn_blocking(move || {
        for task in source {
            if tx.blocking_send(task).is_err() {
                break;
            }
        }
    });
    (rx, handle)
}

/// 等待 `fut` 完成，期间写入端若提前结束则立即返回
async fn until_sink_stops<F: Future>(
    fut: F,
    sink: &mut SinkHandle,
) -> Result<F::Output, SinkStop> {
    tokio::select! {
        out = fut => Ok(out),
        res = sink => Err(match res {
            // the coordinator still holds a sender, so an early clean exit means the channel broke
            Ok(Ok(_)) => SinkStop::Failed(SinkError::Closed),
            Ok(Err(e)) => SinkStop::Failed(e),
            Err(e) => SinkStop::Panicked(e),
        }),
    }
}

/// 采集引擎
///
/// 把URL源、工作队列、抓取工作器、处理阶段与结果写入端组装为一次完整的运行。
/// 处理阶段 `S` 与写入器 `W` 决定运行模式：归档模式写出WARC记录，
/// 内容模式写出按行JSON文档。每个实例只能运行一次。
pub struct HarvestEngine<S, W>
where
    S: ProcessingStage,
    W: RecordWriter<S::Output>,
{
    engine: Arc<dyn FetchEngine>,
    stage: Arc<S>,
    writer: Option<W>,
    output_path: PathBuf,
    options: RunOptions,
    stats: Arc<RunStats>,
    state: RunState,
}

impl<S, W> HarvestEngine<S, W>
where
    S: ProcessingStage,
    W: RecordWriter<S::Output>,
{
    pub fn new(
        engine: Arc<dyn FetchEngine>,
        stage: Arc<S>,
        writer: W,
        output_path: impl Into<PathBuf>,
        options: RunOptions,
    ) -> Self {
        Self {
            engine,
            stage,
            writer: Some(writer),
            output_path: output_path.into(),
            options,
            stats: Arc::new(RunStats::new()),
            state: RunState::Init,
        }
    }

    /// 当前状态
    pub fn state(&self) -> RunState {
        self.state
    }

    /// 共享的运行统计
    pub fn stats(&self) -> Arc<RunStats> {
        self.stats.clone()
    }

    fn transition(&mut self, next: RunState) -> Result<(), HarvestError> {
        if !self.state.can_transition_to(next) {
            return Err(HarvestError::InvalidState {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        info!("Harvest state: {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// 执行一次完整的运行
    ///
    /// # 参数
    ///
    /// * `source` - URL任务序列
    ///
    /// # 返回值
    ///
    /// * `Ok(RunSummary)` - 运行摘要
    /// * `Err(HarvestError)` - 写入端失败或状态错误
    pub async fn run<I>(mut self, source: I) -> Result<RunSummary, HarvestError>
    where
        I: IntoIterator<Item = UrlTask> + Send + 'static,
        I::IntoIter: Send,
    {
        let started = Instant::now();
        let workers = self.options.workers.max(1);
        let writer = self.writer.take().ok_or_else(|| HarvestError::InvalidState {
            from: self.state.to_string(),
            to: RunState::Running.to_string(),
        })?;

        match raise_fd_limit(self.options.fd_limit) {
            Some(limit) => info!("Open file limit: {}", limit),
            None => warn!("Could not raise the open file limit"),
        }

        let sink = ResultSink::spawn(writer, workers.saturating_mul(2), self.stats.clone());
        let (results, mut sink_handle) = sink.into_parts();

        let (producer, consumer) = WorkQueue::for_workers(workers)?.split();
        let mut manager = WorkerManager::new(
            self.engine.clone(),
            self.stage.clone(),
            results,
            self.stats.clone(),
            self.options.deadline,
        );
        manager.start_workers(workers, &consumer);
        drop(consumer);

        let progress = ProgressReporter::spawn(
            self.stats.clone(),
            producer.clone(),
            self.options.limit.map(|l| l as u64),
            self.options.quiet,
        );

        self.transition(RunState::Running)?;
        let stats = self.stats.clone();
        let (mut incoming, reader) = spawn_source_reader(source);
        let feed = async {
            while let Some(task) = incoming.recv().await {
                producer.put(task.into()).await?;
                stats.record_seen();
            }
            Ok::<(), HarvestError>(())
        };
        match until_sink_stops(feed, &mut sink_handle).await {
            Ok(fed) => fed?,
            Err(stop) => return Err(self.abort(stop, &manager, progress).await),
        }
        reader.await?;

        self.transition(RunState::Draining)?;
        info!("Input exhausted after {} URLs, draining", self.stats.seen());
        match until_sink_stops(producer.close_for_end(workers), &mut sink_handle).await {
            Ok(sent) => sent?,
            Err(stop) => return Err(self.abort(stop, &manager, progress).await),
        }

        let handled = manager.join().await;
        drop(producer);
        let written = sink_handle.await??;
        progress.finish().await;

        self.transition(RunState::Closed)?;
        let summary = RunSummary {
            stats: self.stats.snapshot(),
            output_path: self.output_path.clone(),
            elapsed: started.elapsed(),
        };
        info!(
            "Workers handled {} tasks; wrote {} records to {} in {:.1}s",
            handled,
            written,
            summary.output_path.display(),
            summary.elapsed.as_secs_f64()
        );
        Ok(summary)
    }

    async fn abort(
        &mut self,
        stop: SinkStop,
        manager: &WorkerManager<S>,
        progress: ProgressReporter,
    ) -> HarvestError {
        manager.abort_all();
        progress.finish().await;
        let err = HarvestError::from(stop);
        error!("Result sink stopped, aborting run: {}", err);
        if let Err(e) = self.transition(RunState::Closed) {
            warn!("{}", e);
        }
        err
    }
}

/// 构建某模式对应的引擎并执行运行
pub async fn run_from_settings(settings: &Settings) -> Result<RunSummary, HarvestError> {
    if !settings.run.mode.fetches() {
        return refine_use_case::run_offline(settings).await;
    }

    let options = RunOptions::from_settings(settings);
    let engine = build_engine(settings)?;
    let output = Path::new(&settings.run.output);

    info!(
        "Harvesting {} in {} mode with {} workers",
        settings.run.input,
        settings.run.mode,
        options.workers
    );

    match settings.run.mode {
        HarvestMode::Content => {
            let pipeline = ContentPipeline::from_settings(settings)
                .map_err(|e| HarvestError::Config(format!("classifier: {}", e)))?;
            let stage = ContentStage::new(
                Arc::new(pipeline),
                OffloadPool::new(settings.cpu_workers()),
            );
            let source =
                UrlSource::open(&settings.run.input, InputMode::Content, settings.run.limit)?;
            let writer = JsonlWriter::<ProcessedDocument>::create(output)?;
            HarvestEngine::new(engine, Arc::new(stage), writer, output, options)
                .run(source)
                .await
        }
        _ => {
            let source =
                UrlSource::open(&settings.run.input, InputMode::Archive, settings.run.limit)?;
            let writer = WarcWriter::create(output)?;
            HarvestEngine::new(engine, Arc::new(ArchiveStage), writer, output, options)
                .run(source)
                .await
        }
    }
}

fn build_engine(settings: &Settings) -> Result<Arc<dyn FetchEngine>, HarvestError> {
    let engine = ReqwestEngine::new(EngineConfig::from_settings(settings))
        .map_err(|e| HarvestError::Config(format!("HTTP client: {}", e)))?;
    Ok(Arc::new(engine))
}
