//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量调度和任务状态管理，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量编排器
//! - 创建批次（每个年代一个任务）
//! - 控制并发数量（固定大小的 worker 池）
//! - 单项重试（绕过 worker 池）
//! - 提供只读快照和事件订阅
//!
//! ### `job_board` - 任务看板
//! - 按年代保存任务状态
//! - 在途标记，保证每个年代同时只有一个写者
//! - 发布状态变化
//!
//! ### `work_queue` - 工作队列
//! - 一次批量提交期间共享的 FIFO
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<Period>)
//!     ↓
//! workflow::PeriodFlow (处理单个 Period)
//!     ↓
//! infrastructure::ImageGenerator (外部生成能力)
//! ```

pub mod batch_processor;
pub mod job_board;
pub mod work_queue;

// 重新导出主要类型
pub use batch_processor::{BatchOrchestrator, DEFAULT_CONCURRENCY};
pub use job_board::JobBoard;
pub use work_queue::WorkQueue;
