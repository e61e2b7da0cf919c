//! 工作队列
//!
//! 一次批量提交期间由所有 worker 共享的 FIFO，每个年代只会被取出一次

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use crate::models::Period;

/// 待处理年代的 FIFO 队列
#[derive(Debug, Default)]
pub struct WorkQueue {
    inner: Mutex<VecDeque<Period>>,
}

impl WorkQueue {
    pub fn new(periods: impl IntoIterator<Item = Period>) -> Self {
        Self {
            inner: Mutex::new(periods.into_iter().collect()),
        }
    }

    /// 取出下一个年代，队列为空时返回 None（worker 据此退出）
    pub fn pop(&self) -> Option<Period> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
