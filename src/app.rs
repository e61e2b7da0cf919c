//! 应用外壳
//!
//! 加载源图片 → 批量生成六个年代 → 交互式单项重试 → 保存结果

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::join_all;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::infrastructure::ImageGenerator;
use crate::models::{load_source_image, ImageRef, JobEvent, JobState, Period, SourceImage};
use crate::orchestrator::BatchOrchestrator;
use crate::services::{ImageWriter, LlmImageService};
use crate::utils::logging::{log_startup, print_final_stats};

/// 交互命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// 重试某个年代
    Retry(Period),
    /// 打印当前快照
    Status,
    /// 显示帮助
    Help,
    /// 退出
    Quit,
}

impl Command {
    /// 解析一行输入，无法识别时返回 None
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let cmd = parts.next()?.to_lowercase();
        let arg = parts.next();
        match (cmd.as_str(), arg) {
            ("retry" | "r", Some(arg)) => Period::from_str(arg).map(Command::Retry),
            ("status" | "s", None) => Some(Command::Status),
            ("help" | "h" | "?", None) => Some(Command::Help),
            ("quit" | "q" | "exit", None) => Some(Command::Quit),
            _ => None,
        }
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    orchestrator: BatchOrchestrator,
    generator: Arc<dyn ImageGenerator>,
    writer: Arc<ImageWriter>,
    source: SourceImage,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config, photo: &Path) -> Result<Self> {
        log_startup(&config);

        let source = load_source_image(photo)
            .await
            .with_context(|| format!("无法加载源图片: {}", photo.display()))?;

        let run_dir = Path::new(&config.output_dir)
            .join(chrono::Local::now().format("%Y%m%d-%H%M%S").to_string());
        let writer = ImageWriter::create(run_dir).await?;

        let generator: Arc<dyn ImageGenerator> = Arc::new(LlmImageService::new(&config)?);

        Ok(Self {
            orchestrator: BatchOrchestrator::from_config(&config),
            config,
            generator,
            writer: Arc::new(writer),
            source,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        let observer = self.spawn_observer();

        // 批量生成
        let snapshot = self
            .orchestrator
            .start_batch(self.source.clone(), &Period::ALL, self.generator.clone())
            .await;

        for job in &snapshot.jobs {
            if let Some(image) = &job.result {
                save_image(&self.writer, job.period, image).await;
            }
        }
        print_final_stats(&snapshot, &self.writer.dir().display().to_string());

        // 交互式重试
        let retries = self.command_loop().await?;
        if !retries.is_empty() {
            info!("⏳ 等待 {} 个重试完成...", retries.len());
            join_all(retries).await;
        }

        observer.abort();

        let snapshot = self.orchestrator.snapshot();
        let path = self.writer.write_snapshot(&snapshot).await?;
        print_final_stats(&snapshot, &self.writer.dir().display().to_string());
        info!("快照已保存至: {}", path.display());

        Ok(())
    }

    /// 读取标准输入上的命令，直到 quit 或输入结束
    async fn command_loop(&self) -> Result<Vec<JoinHandle<()>>> {
        let mut retries = Vec::new();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        print_help();

        while let Some(line) = lines.next_line().await.context("读取标准输入失败")? {
            if line.trim().is_empty() {
                continue;
            }

            match Command::parse(&line) {
                Some(Command::Retry(period)) => match self.spawn_retry(period) {
                    Some(handle) => retries.push(handle),
                    None => warn!("[年代 {}] 任务仍在进行中，忽略重试", period),
                },
                Some(Command::Status) => {
                    let snapshot = self.orchestrator.snapshot();
                    println!("{}", serde_json::to_string_pretty(&snapshot)?);
                }
                Some(Command::Help) => print_help(),
                Some(Command::Quit) => break,
                None => warn!("无法识别的命令: {}", line.trim()),
            }
        }

        Ok(retries)
    }

    /// 发起重试，完成后保存结果
    fn spawn_retry(&self, period: Period) -> Option<JoinHandle<()>> {
        let handle = self
            .orchestrator
            .retry_job(period, self.generator.clone())?;
        let writer = self.writer.clone();

        Some(tokio::spawn(async move {
            match handle.await {
                Ok(Some(JobState::Done(image))) => save_image(&writer, period, &image).await,
                Ok(_) => {}
                Err(e) => error!("[年代 {}] 重试任务执行失败: {}", period, e),
            }
        }))
    }

    /// 订阅状态变化并输出进度
    fn spawn_observer(&self) -> JoinHandle<()> {
        let mut events = self.orchestrator.subscribe();
        let total = Period::ALL.len();
        let verbose = self.config.verbose_logging;

        tokio::spawn(async move {
            let mut progress = BatchProgress::default();
            loop {
                match events.recv().await {
                    Ok(event) => {
                        let finished = progress.record(&event);
                        match &event.state {
                            JobState::Pending => {
                                if verbose {
                                    info!("[批次 #{} 年代 {}] ⏳ 等待生成", event.batch_id, event.period);
                                }
                            }
                            JobState::Done(_) | JobState::Failed(_) => {
                                info!(
                                    "📈 [批次 #{}] 年代 {} → {:?} (已完成 {}/{})",
                                    event.batch_id,
                                    event.period,
                                    event.state.status(),
                                    finished,
                                    total
                                );
                            }
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("进度事件积压，跳过 {} 条", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

/// 最新批次中处于终态的年代
///
/// 新批次的事件会清空记录；重试回到 Pending 时移出，再次完成时重新计入
#[derive(Debug, Default)]
struct BatchProgress {
    batch_id: u64,
    finished: HashSet<Period>,
}

impl BatchProgress {
    /// 记录一条事件，返回最新批次已完成的数量
    fn record(&mut self, event: &JobEvent) -> usize {
        if event.batch_id > self.batch_id {
            self.batch_id = event.batch_id;
            self.finished.clear();
        }
        if event.batch_id == self.batch_id {
            if event.state.is_terminal() {
                self.finished.insert(event.period);
            } else {
                self.finished.remove(&event.period);
            }
        }
        self.finished.len()
    }
}

async fn save_image(writer: &ImageWriter, period: Period, image: &ImageRef) {
    match writer.save(period, image).await {
        Ok(path) => info!("[年代 {}] 💾 已保存: {}", period, path.display()),
        Err(e) => error!("[年代 {}] 保存失败: {:#}", period, e),
    }
}

fn print_help() {
    info!("{}", "─".repeat(60));
    info!("可用命令:");
    info!("  retry <年代>   重试某个年代，例如 retry 1970s");
    info!("  status         打印当前状态");
    info!("  quit           等待重试完成后退出");
    info!("{}", "─".repeat(60));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("retry 1970s"), Some(Command::Retry(Period::Seventies)));
        assert_eq!(Command::parse("  R 80s "), Some(Command::Retry(Period::Eighties)));
        assert_eq!(Command::parse("status"), Some(Command::Status));
        assert_eq!(Command::parse("QUIT"), Some(Command::Quit));
        assert_eq!(Command::parse("?"), Some(Command::Help));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(Command::parse("retry"), None);
        assert_eq!(Command::parse("retry 2010s"), None);
        assert_eq!(Command::parse("status now"), None);
        assert_eq!(Command::parse("dance"), None);
        assert_eq!(Command::parse(""), None);
    }

    fn event(batch_id: u64, period: Period, state: JobState) -> JobEvent {
        JobEvent {
            batch_id,
            period,
            state,
        }
    }

    #[test]
    fn test_progress_ignores_retry_recount() {
        let mut progress = BatchProgress::default();
        let done = || JobState::Done(ImageRef::new("https://h/x.png"));

        for period in Period::ALL {
            progress.record(&event(1, period, JobState::Pending));
        }
        assert_eq!(progress.record(&event(1, Period::Fifties, done())), 1);
        assert_eq!(
            progress.record(&event(1, Period::Sixties, JobState::Failed("x".into()))),
            2
        );

        // 重试：回到 Pending 后再次完成，不重复计数
        assert_eq!(progress.record(&event(1, Period::Sixties, JobState::Pending)), 1);
        assert_eq!(progress.record(&event(1, Period::Sixties, done())), 2);
    }

    #[test]
    fn test_progress_resets_on_new_batch() {
        let mut progress = BatchProgress::default();
        let done = || JobState::Done(ImageRef::new("https://h/x.png"));

        progress.record(&event(1, Period::Fifties, done()));
        progress.record(&event(1, Period::Sixties, done()));
        assert_eq!(progress.record(&event(2, Period::Fifties, JobState::Pending)), 0);
        assert_eq!(progress.record(&event(2, Period::Fifties, done())), 1);

        // 旧批次的尾随重试不影响新批次
        assert_eq!(progress.record(&event(1, Period::Seventies, done())), 1);
    }
}
