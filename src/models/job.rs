//! 任务状态与只读视图
//!
//! 状态机：`Pending → Done | Failed`，终态只能通过重试回到 `Pending`

use serde::Serialize;

use crate::error::AppError;
use crate::models::{ImageRef, Period};

/// 单个年代任务的状态
///
/// 结果只在 `Done` 时存在，错误信息只在 `Failed` 时存在
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// 等待生成或正在生成
    Pending,
    /// 生成成功
    Done(ImageRef),
    /// 生成失败，保存原样透传的错误描述
    Failed(String),
}

impl JobState {
    pub fn is_pending(&self) -> bool {
        matches!(self, JobState::Pending)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }

    pub fn status(&self) -> JobStatus {
        match self {
            JobState::Pending => JobStatus::Pending,
            JobState::Done(_) => JobStatus::Done,
            JobState::Failed(_) => JobStatus::Failed,
        }
    }
}

/// 状态标签（对外展示用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Done,
    Failed,
}

/// 状态变化事件，每次状态转换立即发布
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobEvent {
    /// 所属批次，新批次会替换旧批次
    pub batch_id: u64,
    pub period: Period,
    pub state: JobState,
}

/// 单个任务的只读快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobSnapshot {
    pub period: Period,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ImageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JobSnapshot {
    pub fn new(period: Period, state: &JobState) -> Self {
        let (result, error) = match state {
            JobState::Pending => (None, None),
            JobState::Done(image) => (Some(image.clone()), None),
            JobState::Failed(reason) => (None, Some(reason.clone())),
        };
        Self {
            period,
            status: state.status(),
            result,
            error,
        }
    }

    /// 失败时转换为核心层错误
    pub fn failure(&self) -> Option<AppError> {
        self.error.as_ref().map(|reason| AppError::GenerationFailed {
            period: self.period,
            reason: reason.clone(),
        })
    }
}

/// 整个批次的只读快照，按年代顺序排列
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSnapshot {
    pub batch_id: u64,
    pub jobs: Vec<JobSnapshot>,
}

impl BatchSnapshot {
    pub fn get(&self, period: Period) -> Option<&JobSnapshot> {
        self.jobs.iter().find(|job| job.period == period)
    }

    pub fn status_of(&self, period: Period) -> Option<JobStatus> {
        self.get(period).map(|job| job.status)
    }

    pub fn stats(&self) -> BatchStats {
        let mut stats = BatchStats::default();
        for job in &self.jobs {
            match job.status {
                JobStatus::Pending => stats.pending += 1,
                JobStatus::Done => stats.done += 1,
                JobStatus::Failed => stats.failed += 1,
            }
        }
        stats
    }

    pub fn failures(&self) -> Vec<AppError> {
        self.jobs.iter().filter_map(JobSnapshot::failure).collect()
    }

    pub fn failed_periods(&self) -> Vec<Period> {
        self.jobs
            .iter()
            .filter(|job| job.status == JobStatus::Failed)
            .map(|job| job.period)
            .collect()
    }
}

/// 批次统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub done: usize,
    pub failed: usize,
    pub pending: usize,
}

impl BatchStats {
    pub fn total(&self) -> usize {
        self.done + self.failed + self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> BatchSnapshot {
        BatchSnapshot {
            batch_id: 3,
            jobs: vec![
                JobSnapshot::new(Period::Fifties, &JobState::Done(ImageRef::new("https://img/1.png"))),
                JobSnapshot::new(Period::Sixties, &JobState::Failed("blocked".into())),
                JobSnapshot::new(Period::Seventies, &JobState::Pending),
            ],
        }
    }

    #[test]
    fn test_snapshot_fields_match_state() {
        let snapshot = sample_snapshot();
        let done = snapshot.get(Period::Fifties).unwrap();
        assert!(done.result.is_some() && done.error.is_none());
        let failed = snapshot.get(Period::Sixties).unwrap();
        assert!(failed.result.is_none());
        assert_eq!(failed.error.as_deref(), Some("blocked"));
        let pending = snapshot.get(Period::Seventies).unwrap();
        assert!(pending.result.is_none() && pending.error.is_none());
    }

    #[test]
    fn test_stats_and_failures() {
        let snapshot = sample_snapshot();
        let stats = snapshot.stats();
        assert_eq!((stats.done, stats.failed, stats.pending), (1, 1, 1));
        assert_eq!(stats.total(), 3);
        assert_eq!(snapshot.failed_periods(), vec![Period::Sixties]);

        let failures = snapshot.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].to_string(), "年代 1960s 生成失败: blocked");
    }

    #[test]
    fn test_snapshot_json() {
        let json = serde_json::to_value(sample_snapshot()).unwrap();
        assert_eq!(json["batch_id"], 3);
        assert_eq!(json["jobs"][0]["period"], "1950s");
        assert_eq!(json["jobs"][0]["status"], "done");
        assert_eq!(json["jobs"][1]["error"], "blocked");
        assert!(json["jobs"][2].get("result").is_none());
    }
}
