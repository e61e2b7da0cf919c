//! # Decade Portrait
//!
//! 上传一张照片，为六个固定年代各自生成一张风格化图像，并可单独重试任意一个年代
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 外部生成能力的接缝
//! - `ImageGenerator` - 输入源图片和提示词，输出图像或错误
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单张图像
//! - `LlmImageService` - 调用模型生成图像
//! - `ImageWriter` - 保存结果
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个年代"的完整处理流程
//! - `PeriodCtx` - 上下文封装（batch_id + period）
//! - `PeriodFlow` - 流程编排（prompt → generate → 写回看板）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量编排器，固定大小的 worker 池与单项重试
//! - `orchestrator/job_board` - 按年代保存任务状态，发布状态变化
//! - `orchestrator/work_queue` - worker 共享的 FIFO
//!
//! 与编排层并列的 `gesture/` 把拖拽速度采样转换为去抖后的重试信号。
//!
//! ## 模块结构

pub mod app;
pub mod config;
pub mod error;
pub mod gesture;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use app::App;
pub use config::Config;
pub use error::{AppError, GenerationError, Result};
pub use gesture::{MotionSample, RetryEvent, ShakeConfig, ShakeDetector, ShakeRetry, Velocity};
pub use infrastructure::{generator_fn, ImageGenerator};
pub use models::{BatchSnapshot, ImageRef, JobEvent, JobState, JobStatus, Period, SourceImage};
pub use orchestrator::BatchOrchestrator;
pub use workflow::{PeriodCtx, PeriodFlow};
