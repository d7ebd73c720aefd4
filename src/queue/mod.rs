// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 提供URL源和有界工作队列
/// 负责把输入文件中的URL以背压方式分发给抓取工作器
pub mod url_source;
pub mod work_queue;

pub use url_source::{InputMode, UrlSource};
pub use work_queue::{QueueConsumer, QueueProducer, WorkQueue};
