//! 任务看板
//!
//! 按年代索引的任务记录集合。每个年代一个槽位，槽位带"在途"标记：
//! 进入 `Pending` 前置位，只在终态写入后清除。任何时刻每个年代最多一个写者。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use tokio::sync::broadcast;
use tracing::debug;

use crate::error::GenerationError;
use crate::models::{BatchSnapshot, ImageRef, JobEvent, JobSnapshot, JobState, Period, SourceImage};

struct JobSlot {
    period: Period,
    state: Mutex<JobState>,
    in_flight: AtomicBool,
}

/// 单个批次的任务看板
pub struct JobBoard {
    batch_id: u64,
    source: SourceImage,
    slots: Vec<JobSlot>,
    events: broadcast::Sender<JobEvent>,
}

impl JobBoard {
    /// 为每个年代创建一个 `Pending` 任务（重复的年代只保留第一次出现）
    pub fn new(
        batch_id: u64,
        source: SourceImage,
        periods: &[Period],
        events: broadcast::Sender<JobEvent>,
    ) -> Self {
        let mut slots: Vec<JobSlot> = Vec::with_capacity(periods.len());
        for &period in periods {
            if slots.iter().any(|slot| slot.period == period) {
                debug!("[批次 #{}] 忽略重复的年代 {}", batch_id, period);
                continue;
            }
            slots.push(JobSlot {
                period,
                state: Mutex::new(JobState::Pending),
                in_flight: AtomicBool::new(true),
            });
        }

        Self {
            batch_id,
            source,
            slots,
            events,
        }
    }

    pub fn batch_id(&self) -> u64 {
        self.batch_id
    }

    pub fn source(&self) -> &SourceImage {
        &self.source
    }

    /// 本批次的年代，按创建顺序
    pub fn periods(&self) -> Vec<Period> {
        self.slots.iter().map(|slot| slot.period).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// 发布所有任务的初始 `Pending` 状态
    pub fn announce(&self) {
        for slot in &self.slots {
            let state = slot.state.lock().unwrap_or_else(PoisonError::into_inner);
            self.publish(slot.period, &state);
        }
    }

    pub fn state_of(&self, period: Period) -> Option<JobState> {
        self.slot(period)
            .map(|slot| slot.state.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    pub fn is_in_flight(&self, period: Period) -> bool {
        self.slot(period)
            .is_some_and(|slot| slot.in_flight.load(Ordering::Acquire))
    }

    /// 尝试为重试占用任务
    ///
    /// 只有终态且不在途的任务才能被占用；成功时任务回到 `Pending` 并立即发布。
    /// 返回 false 表示任务在途（或不属于本批次），调用方应当忽略这次重试。
    pub fn try_claim_retry(&self, period: Period) -> bool {
        let Some(slot) = self.slot(period) else {
            return false;
        };

        if slot
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let mut state = slot.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = JobState::Pending;
        self.publish(period, &state);
        true
    }

    /// 写入终态、发布，然后清除在途标记
    pub fn complete(
        &self,
        period: Period,
        outcome: Result<ImageRef, GenerationError>,
    ) -> Option<JobState> {
        let slot = self.slot(period)?;

        let new_state = match outcome {
            Ok(image) => JobState::Done(image),
            Err(err) => JobState::Failed(err.to_string()),
        };

        let mut state = slot.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = new_state.clone();
        self.publish(period, &state);
        // 终态发布之后才允许下一次重试占用，保证同一年代的事件顺序
        slot.in_flight.store(false, Ordering::Release);

        Some(new_state)
    }

    pub fn snapshot(&self) -> BatchSnapshot {
        BatchSnapshot {
            batch_id: self.batch_id,
            jobs: self
                .slots
                .iter()
                .map(|slot| {
                    let state = slot.state.lock().unwrap_or_else(PoisonError::into_inner);
                    JobSnapshot::new(slot.period, &state)
                })
                .collect(),
        }
    }

    fn slot(&self, period: Period) -> Option<&JobSlot> {
        self.slots.iter().find(|slot| slot.period == period)
    }

    fn publish(&self, period: Period, state: &JobState) {
        // 没有订阅者时发送会失败，这不影响状态本身
        let _ = self.events.send(JobEvent {
            batch_id: self.batch_id,
            period,
            state: state.clone(),
        });
    }
}
