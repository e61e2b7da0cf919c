//! 批量年代处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块持有当前批次，负责把一批年代任务分发给固定数量的 worker，
//! 以及在批次之外单独运行某个年代的重试。
//!
//! ## 核心功能
//!
//! 1. **批次创建**：每个年代一个 `Pending` 任务，新批次整体替换旧批次
//! 2. **并发控制**：恰好 N 个 worker 循环"取下一个或退出"，共享同一个 FIFO 队列
//! 3. **状态发布**：每次状态转换立即通过 broadcast 发布
//! 4. **单项重试**：绕过队列和 worker 池，只对终态任务生效
//! 5. **只读快照**：给展示层读取当前状态
//!
//! ## 设计特点
//!
//! - **失败隔离**：一个年代失败只记录在它自己的任务上，不会中断批次
//! - **单写者**：队列保证每个年代只被一个 worker 取出，重试由在途标记保护
//! - **无取消**：已经发出的生成调用总会跑到成功或失败

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use futures::future::join_all;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::infrastructure::ImageGenerator;
use crate::models::{BatchSnapshot, JobEvent, JobState, Period, SourceImage};
use crate::orchestrator::{JobBoard, WorkQueue};
use crate::utils::logging::{log_batch_complete, log_batch_start};
use crate::workflow::{PeriodCtx, PeriodFlow};

/// worker 池默认大小
pub const DEFAULT_CONCURRENCY: usize = 2;

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// 批量编排器
///
/// 克隆只复制引用，所有克隆共享同一个当前批次和事件通道
#[derive(Clone)]
pub struct BatchOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    concurrency: usize,
    current: RwLock<Option<Arc<JobBoard>>>,
    next_batch_id: AtomicU64,
    events: broadcast::Sender<JobEvent>,
}

impl BatchOrchestrator {
    /// 创建编排器，`concurrency` 至少为 1
    pub fn new(concurrency: usize) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                concurrency: concurrency.max(1),
                current: RwLock::new(None),
                next_batch_id: AtomicU64::new(1),
                events,
            }),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_concurrent_jobs)
    }

    pub fn concurrency(&self) -> usize {
        self.inner.concurrency
    }

    /// 订阅状态变化事件
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.inner.events.subscribe()
    }

    /// 启动一个新批次并等待它全部完成
    ///
    /// 新批次立即替换旧批次（旧批次仍在运行的重试只会写回旧批次）。
    /// 返回时每个任务都已处于终态。
    pub async fn start_batch(
        &self,
        source: SourceImage,
        periods: &[Period],
        generator: Arc<dyn ImageGenerator>,
    ) -> BatchSnapshot {
        let batch_id = self.inner.next_batch_id.fetch_add(1, Ordering::Relaxed);
        let board = Arc::new(JobBoard::new(
            batch_id,
            source,
            periods,
            self.inner.events.clone(),
        ));

        *self
            .inner
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(board.clone());
        board.announce();

        log_batch_start(batch_id, board.len(), self.inner.concurrency);

        let queue = Arc::new(WorkQueue::new(board.periods()));
        let flow = PeriodFlow::new(generator);

        // 恰好 N 个 worker，每个循环取下一个年代，队列空了就退出
        let workers: Vec<JoinHandle<usize>> = (0..self.inner.concurrency)
            .map(|worker_id| {
                let queue = queue.clone();
                let board = board.clone();
                let flow = flow.clone();
                tokio::spawn(async move {
                    let mut handled = 0;
                    while let Some(period) = queue.pop() {
                        debug!("[批次 #{}] worker {} 取到年代 {}", batch_id, worker_id, period);
                        flow.run(&board, &PeriodCtx::new(batch_id, period)).await;
                        handled += 1;
                    }
                    debug!("[批次 #{}] worker {} 退出，共处理 {} 个", batch_id, worker_id, handled);
                    handled
                })
            })
            .collect();

        for (worker_id, result) in join_all(workers).await.into_iter().enumerate() {
            if let Err(e) = result {
                error!("[批次 #{}] worker {} 执行失败: {}", batch_id, worker_id, e);
            }
        }

        let snapshot = board.snapshot();
        log_batch_complete(batch_id, &snapshot.stats());
        snapshot
    }

    /// 单独重试某个年代
    ///
    /// 只对当前批次中处于终态的任务生效：任务回到 `Pending` 并发布，然后在独立的
    /// 任务中运行生成。任务在途（包括批次 worker 尚未完成）时静默忽略，返回 None。
    pub fn retry_job(
        &self,
        period: Period,
        generator: Arc<dyn ImageGenerator>,
    ) -> Option<JoinHandle<Option<JobState>>> {
        let board = self.current_board()?;

        if !board.try_claim_retry(period) {
            debug!("[批次 #{} 年代 {}] 任务在途，忽略重试", board.batch_id(), period);
            return None;
        }

        info!("[批次 #{} 年代 {}] 🔁 手动重试", board.batch_id(), period);

        let flow = PeriodFlow::new(generator);
        let ctx = PeriodCtx::retry(board.batch_id(), period);
        Some(tokio::spawn(async move { flow.run(&board, &ctx).await }))
    }

    /// 当前批次的快照，尚未启动任何批次时为空
    pub fn snapshot(&self) -> BatchSnapshot {
        self.current_board()
            .map(|board| board.snapshot())
            .unwrap_or_default()
    }

    fn current_board(&self) -> Option<Arc<JobBoard>> {
        self.inner
            .current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for BatchOrchestrator {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::infrastructure::generator_fn;
    use crate::models::{ImageRef, JobStatus};

    fn source() -> SourceImage {
        SourceImage::from_data_url("data:image/jpeg;base64,AA==")
    }

    #[test]
    fn test_concurrency_is_at_least_one() {
        assert_eq!(BatchOrchestrator::new(0).concurrency(), 1);
        assert_eq!(BatchOrchestrator::default().concurrency(), DEFAULT_CONCURRENCY);
    }

    #[tokio::test]
    async fn test_snapshot_before_any_batch_is_empty() {
        let orchestrator = BatchOrchestrator::default();
        assert!(orchestrator.snapshot().jobs.is_empty());
        let generator = Arc::new(generator_fn(|_, _| async { Ok(ImageRef::new("x")) }));
        assert!(orchestrator.retry_job(Period::Fifties, generator).is_none());
    }

    #[tokio::test]
    async fn test_retry_of_period_outside_batch_is_ignored() {
        let orchestrator = BatchOrchestrator::default();
        let generator: Arc<dyn ImageGenerator> =
            Arc::new(generator_fn(|_, _| async { Err(GenerationError::message("nope")) }));

        let snapshot = orchestrator
            .start_batch(source(), &[Period::Fifties], generator.clone())
            .await;
        assert_eq!(snapshot.status_of(Period::Fifties), Some(JobStatus::Failed));

        assert!(orchestrator.retry_job(Period::Nineties, generator).is_none());
    }

    #[tokio::test]
    async fn test_empty_batch_completes() {
        let orchestrator = BatchOrchestrator::default();
        let generator = Arc::new(generator_fn(|_, _| async { Ok(ImageRef::new("x")) }));
        let snapshot = orchestrator.start_batch(source(), &[], generator).await;
        assert!(snapshot.jobs.is_empty());
        assert_eq!(snapshot.batch_id, 1);
    }
}
