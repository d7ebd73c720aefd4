// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tracing::{debug, warn};

/// 提升进程可打开文件数上限
///
/// 软限制提升为 `min(hard, max(soft, target))`。失败只记录警告，从不中止运行。
///
/// # 返回值
///
/// 调整后的软限制；平台不支持或调用失败时返回 `None`
#[cfg(unix)]
pub fn raise_fd_limit(target: u64) -> Option<u64> {
    use rlimit::Resource;

    let (soft, hard) = match Resource::NOFILE.get() {
        Ok(limits) => limits,
        Err(e) => {
            warn!("Could not read file descriptor limit: {}", e);
            return None;
        }
    };

    let wanted = soft.max(target).min(hard);
    if wanted == soft {
        debug!("File descriptor limit already {} (hard {})", soft, hard);
        return Some(soft);
    }

    match Resource::NOFILE.set(wanted, hard) {
        Ok(()) => {
            debug!("Raised file descriptor limit {} -> {}", soft, wanted);
            Some(wanted)
        }
        Err(e) => {
            warn!("Could not raise file descriptor limit to {}: {}", wanted, e);
            Some(soft)
        }
    }
}

#[cfg(not(unix))]
pub fn raise_fd_limit(_target: u64) -> Option<u64> {
    None
}
