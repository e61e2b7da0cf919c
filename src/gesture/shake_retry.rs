//! 摇晃重试
//!
//! 把一个检测器绑定到一个年代：检测到摇晃就对该年代发起重试。
//! 任务在途时重试会被编排器忽略，所以摇晃正在生成的卡片没有效果。

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::gesture::{MotionSample, ShakeConfig, ShakeDetector};
use crate::infrastructure::ImageGenerator;
use crate::models::{JobState, Period};
use crate::orchestrator::BatchOrchestrator;

/// 绑定到单个年代卡片的摇晃重试
pub struct ShakeRetry {
    period: Period,
    detector: ShakeDetector,
}

impl ShakeRetry {
    pub fn new(period: Period, config: ShakeConfig) -> Self {
        Self {
            period,
            detector: ShakeDetector::new(config),
        }
    }

    pub fn period(&self) -> Period {
        self.period
    }

    pub fn drag_start(&mut self) {
        self.detector.drag_start();
    }

    /// 处理一个运动采样，检测到摇晃且编排器接受重试时返回重试任务句柄
    pub fn on_motion_sample(
        &mut self,
        sample: &MotionSample,
        orchestrator: &BatchOrchestrator,
        generator: &Arc<dyn ImageGenerator>,
    ) -> Option<JoinHandle<Option<JobState>>> {
        let event = self.detector.on_motion_sample(sample)?;
        debug!("[年代 {}] 检测到摇晃 (t={:?})", self.period, event.at);
        orchestrator.retry_job(self.period, generator.clone())
    }
}
