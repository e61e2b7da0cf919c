//! 测试用的脚本化生成器

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use decade_portrait::infrastructure::{GenerateFuture, ImageGenerator};
use decade_portrait::{GenerationError, ImageRef, Period, SourceImage};

/// 每个年代的行为
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    AlwaysOk,
    AlwaysFail,
    /// 第一次失败，之后成功
    FailOnce,
}

/// 按年代脚本化的生成器，记录调用次数和并发峰值
pub struct ScriptedGenerator {
    behaviors: HashMap<Period, Behavior>,
    delay: Duration,
    calls: Mutex<HashMap<Period, usize>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new(behaviors: &[(Period, Behavior)], delay_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            behaviors: behaviors.iter().copied().collect(),
            delay: Duration::from_millis(delay_ms),
            calls: Mutex::new(HashMap::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
        })
    }

    pub fn uniform(behavior: Behavior, delay_ms: u64) -> Arc<Self> {
        let behaviors: Vec<(Period, Behavior)> =
            Period::ALL.iter().map(|&period| (period, behavior)).collect();
        Self::new(&behaviors, delay_ms)
    }

    pub fn calls(&self, period: Period) -> usize {
        self.calls.lock().unwrap().get(&period).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn as_dyn(self: &Arc<Self>) -> Arc<dyn ImageGenerator> {
        self.clone()
    }
}

impl ImageGenerator for ScriptedGenerator {
    fn generate<'a>(&'a self, _source: &'a SourceImage, prompt: &'a str) -> GenerateFuture<'a> {
        Box::pin(async move {
            let period = Period::find_in(prompt).expect("prompt names a period");
            let attempt = {
                let mut calls = self.calls.lock().unwrap();
                let count = calls.entry(period).or_insert(0);
                *count += 1;
                *count
            };

            let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(now_active, Ordering::SeqCst);

            // 不同年代耗时不同，完成顺序与出队顺序不一致
            let jitter = (Period::ALL.iter().position(|&p| p == period).unwrap() as u64 * 7) % 13;
            tokio::time::sleep(self.delay + Duration::from_millis(jitter)).await;

            self.active.fetch_sub(1, Ordering::SeqCst);

            match self.behaviors.get(&period).copied().unwrap_or(Behavior::AlwaysOk) {
                Behavior::AlwaysOk => Ok(ImageRef::new(format!("mem://{}/{}", period, attempt))),
                Behavior::AlwaysFail => Err(GenerationError::message(format!(
                    "safety filter tripped for {}",
                    period
                ))),
                Behavior::FailOnce if attempt == 1 => {
                    Err(GenerationError::message(format!("transient failure for {}", period)))
                }
                Behavior::FailOnce => Ok(ImageRef::new(format!("mem://{}/{}", period, attempt))),
            }
        })
    }
}

pub fn source() -> SourceImage {
    SourceImage::from_data_url("data:image/png;base64,iVBORw0KGgo=")
}
