//! 年代任务流程 - 流程层
//!
//! 核心职责：定义"一个年代"的完整处理流程
//!
//! 流程顺序：
//! 1. 取该年代的提示词
//! 2. 调用图像生成器（panic 也视为失败）
//! 3. 把结果写回任务看板（写入终态并发布）

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{info, warn};

use crate::error::GenerationError;
use crate::infrastructure::ImageGenerator;
use crate::models::JobState;
use crate::orchestrator::JobBoard;
use crate::utils::logging::truncate_text;
use crate::workflow::PeriodCtx;

/// 年代任务流程
///
/// - 不决定何时运行（由 worker 或重试决定）
/// - 不持有任务状态（由 JobBoard 持有）
/// - 只依赖生成能力
#[derive(Clone)]
pub struct PeriodFlow {
    generator: Arc<dyn ImageGenerator>,
}

impl PeriodFlow {
    pub fn new(generator: Arc<dyn ImageGenerator>) -> Self {
        Self { generator }
    }

    /// 运行一次生成并记录结果
    ///
    /// 调用方必须已经占用该年代（在途标记已置位）
    pub async fn run(&self, board: &JobBoard, ctx: &PeriodCtx) -> Option<JobState> {
        info!("{} 🎨 开始生成...", ctx);

        let prompt = ctx.period.prompt();
        let outcome = AssertUnwindSafe(self.generator.generate(board.source(), &prompt))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(GenerationError::Panicked(panic_message(panic.as_ref()))));

        match &outcome {
            Ok(image) => info!("{} ✓ 生成成功: {}", ctx, image),
            Err(e) => warn!("{} ⚠️ 生成失败: {}", ctx, truncate_text(&e.to_string(), 120)),
        }

        board.complete(ctx.period, outcome)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "未知 panic".to_string()
    }
}
