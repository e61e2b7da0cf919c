//! 年代任务上下文
//!
//! 封装"我正在处理哪个批次的哪个年代"这一信息

use std::fmt::Display;

use crate::models::Period;

/// 年代任务上下文
#[derive(Debug, Clone, Copy)]
pub struct PeriodCtx {
    /// 批次ID
    pub batch_id: u64,

    /// 年代
    pub period: Period,

    /// 是否为手动重试（仅用于日志显示）
    pub is_retry: bool,
}

impl PeriodCtx {
    pub fn new(batch_id: u64, period: Period) -> Self {
        Self {
            batch_id,
            period,
            is_retry: false,
        }
    }

    pub fn retry(batch_id: u64, period: Period) -> Self {
        Self {
            batch_id,
            period,
            is_retry: true,
        }
    }
}

impl Display for PeriodCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_retry {
            write!(f, "[批次 #{} 年代 {} 重试]", self.batch_id, self.period)
        } else {
            write!(f, "[批次 #{} 年代 {}]", self.batch_id, self.period)
        }
    }
}
