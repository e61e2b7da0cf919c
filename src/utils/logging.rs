/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use tracing::{info, warn};

use crate::config::Config;
use crate::models::{BatchSnapshot, BatchStats};

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 年代写真批量生成模式");
    info!("📊 最大并发数: {}", config.max_concurrent_jobs);
    info!("🤖 图像模型: {}", config.image_model_name);
    info!("{}", "=".repeat(60));
}

/// 记录批次开始信息
///
/// # 参数
/// - `batch_id`: 批次编号
/// - `total`: 任务总数
/// - `concurrency`: worker 数量
pub fn log_batch_start(batch_id: u64, total: usize, concurrency: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理批次 #{}", batch_id);
    info!("📄 年代总数: {} / worker 数量: {}", total, concurrency);
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
pub fn log_batch_complete(batch_id: u64, stats: &BatchStats) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 批次 #{} 完成: 成功 {}/{}",
        batch_id,
        stats.done,
        stats.total()
    );
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `snapshot`: 最终快照
/// - `run_dir`: 结果保存目录
pub fn print_final_stats(snapshot: &BatchSnapshot, run_dir: &str) {
    let stats = snapshot.stats();
    info!("\n{}", "=".repeat(60));
    info!("📊 批次 #{} 统计", snapshot.batch_id);
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", stats.done, stats.total());
    info!("❌ 失败: {}", stats.failed);
    for failure in snapshot.failures() {
        warn!("   - {}", truncate_text(&failure.to_string(), 100));
    }
    if stats.pending > 0 {
        info!("⏳ 进行中: {}", stats.pending);
    }
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {}", run_dir);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
