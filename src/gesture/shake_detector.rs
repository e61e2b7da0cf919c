//! 摇晃检测
//!
//! 把拖拽过程中的速度采样流转换为去抖后的"重试"信号。
//! 单个高速采样不算摇晃（可能只是快速平滑拖动），必须是高速且方向反转；
//! 冷却时间内同一次摇晃产生的后续采样不会再次触发。

use std::time::Duration;

use crate::config::Config;

/// 速度向量（单位与输入源一致，通常为像素/秒）
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity {
    pub x: f64,
    pub y: f64,
}

impl Velocity {
    pub const ZERO: Velocity = Velocity { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn magnitude(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn dot(self, other: Velocity) -> f64 {
        self.x * other.x + self.y * other.y
    }
}

/// 一次运动采样
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSample {
    pub velocity: Velocity,
    /// 相对任意固定起点的时间戳
    pub timestamp: Duration,
}

impl MotionSample {
    pub fn new(velocity: Velocity, timestamp: Duration) -> Self {
        Self {
            velocity,
            timestamp,
        }
    }

    pub fn at_millis(x: f64, y: f64, millis: u64) -> Self {
        Self::new(Velocity::new(x, y), Duration::from_millis(millis))
    }
}

/// 检测到摇晃时发出的重试信号
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryEvent {
    pub at: Duration,
}

/// 检测参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShakeConfig {
    /// 速度阈值，严格大于才算高速
    pub velocity_threshold: f64,
    /// 两次触发之间的最短间隔，严格大于才允许再次触发
    pub cooldown: Duration,
}

impl Default for ShakeConfig {
    fn default() -> Self {
        Self {
            velocity_threshold: 1500.0,
            cooldown: Duration::from_millis(2000),
        }
    }
}

impl ShakeConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            velocity_threshold: config.shake_velocity_threshold,
            cooldown: Duration::from_millis(config.shake_cooldown_ms),
        }
    }
}

/// 检测器状态
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DetectorState {
    pub last_velocity: Velocity,
    pub last_trigger: Option<Duration>,
}

impl DetectorState {
    /// 拖拽开始：清空上一次拖拽留下的速度，保留触发时间
    pub fn drag_started(self) -> Self {
        Self {
            last_velocity: Velocity::ZERO,
            ..self
        }
    }
}

/// 纯函数形式的检测步骤
pub fn reduce(
    config: &ShakeConfig,
    state: DetectorState,
    sample: &MotionSample,
) -> (DetectorState, Option<RetryEvent>) {
    let velocity = sample.velocity;
    let is_fast = velocity.magnitude() > config.velocity_threshold;
    let is_reversal = velocity.dot(state.last_velocity) < 0.0;
    let cooled_down = state
        .last_trigger
        .map_or(true, |last| sample.timestamp.saturating_sub(last) > config.cooldown);

    let event = (is_fast && is_reversal && cooled_down).then_some(RetryEvent {
        at: sample.timestamp,
    });

    let next = DetectorState {
        last_velocity: velocity,
        last_trigger: event.map(|e| e.at).or(state.last_trigger),
    };

    (next, event)
}

/// 单个可拖拽元素持有的检测器
#[derive(Debug, Clone, Default)]
pub struct ShakeDetector {
    config: ShakeConfig,
    state: DetectorState,
}

impl ShakeDetector {
    pub fn new(config: ShakeConfig) -> Self {
        Self {
            config,
            state: DetectorState::default(),
        }
    }

    pub fn config(&self) -> &ShakeConfig {
        &self.config
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn drag_start(&mut self) {
        self.state = self.state.drag_started();
    }

    pub fn on_motion_sample(&mut self, sample: &MotionSample) -> Option<RetryEvent> {
        let (next, event) = reduce(&self.config, self.state, sample);
        self.state = next;
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(detector: &mut ShakeDetector, samples: &[MotionSample]) -> Vec<RetryEvent> {
        samples
            .iter()
            .filter_map(|sample| detector.on_motion_sample(sample))
            .collect()
    }

    #[test]
    fn test_slow_reversals_never_trigger() {
        let mut detector = ShakeDetector::default();
        detector.drag_start();

        let samples: Vec<MotionSample> = (0..40)
            .map(|i| {
                let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
                // 恰好等于阈值也不算高速
                MotionSample::at_millis(sign * 1500.0, 0.0, i * 3000)
            })
            .collect();

        assert!(feed(&mut detector, &samples).is_empty());
    }

    #[test]
    fn test_diagonal_below_threshold() {
        let mut detector = ShakeDetector::default();
        // |(1000, 1000)| ≈ 1414 < 1500
        let events = feed(
            &mut detector,
            &[
                MotionSample::at_millis(1000.0, 1000.0, 0),
                MotionSample::at_millis(-1000.0, -1000.0, 100),
            ],
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_reversal_cooldown_sequence() {
        let mut detector = ShakeDetector::default();
        detector.drag_start();

        // 第一个样本与零向量点积为 0，不触发
        assert_eq!(detector.on_motion_sample(&MotionSample::at_millis(2000.0, 0.0, 0)), None);

        // 反向，触发
        let fired = detector.on_motion_sample(&MotionSample::at_millis(-2000.0, 0.0, 100));
        assert_eq!(fired, Some(RetryEvent { at: Duration::from_millis(100) }));

        // 500ms 后再次反向，仍在冷却中
        assert_eq!(detector.on_motion_sample(&MotionSample::at_millis(2000.0, 0.0, 600)), None);

        // 触发后 2100ms 再次反向，再次触发
        let fired = detector.on_motion_sample(&MotionSample::at_millis(-2000.0, 0.0, 2200));
        assert_eq!(fired, Some(RetryEvent { at: Duration::from_millis(2200) }));
    }

    #[test]
    fn test_cooldown_boundary_is_exclusive() {
        let config = ShakeConfig::default();
        let state = DetectorState {
            last_velocity: Velocity::new(2000.0, 0.0),
            last_trigger: Some(Duration::from_millis(1000)),
        };

        let (_, at_boundary) = reduce(&config, state, &MotionSample::at_millis(-2000.0, 0.0, 3000));
        assert_eq!(at_boundary, None);

        let (_, past_boundary) =
            reduce(&config, state, &MotionSample::at_millis(-2000.0, 0.0, 3001));
        assert!(past_boundary.is_some());
    }

    #[test]
    fn test_fast_without_reversal_does_not_trigger() {
        let mut detector = ShakeDetector::default();
        let events = feed(
            &mut detector,
            &[
                MotionSample::at_millis(3000.0, 0.0, 0),
                MotionSample::at_millis(3000.0, 500.0, 50),
                MotionSample::at_millis(0.0, 4000.0, 100),
            ],
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_reducer_always_records_last_velocity() {
        let config = ShakeConfig::default();
        let (state, event) = reduce(
            &config,
            DetectorState::default(),
            &MotionSample::at_millis(10.0, -20.0, 5),
        );
        assert_eq!(event, None);
        assert_eq!(state.last_velocity, Velocity::new(10.0, -20.0));
        assert_eq!(state.last_trigger, None);
    }

    #[test]
    fn test_drag_start_clears_stale_velocity() {
        let mut detector = ShakeDetector::default();
        detector.on_motion_sample(&MotionSample::at_millis(2000.0, 0.0, 0));

        // 新的拖拽：上一次拖拽的速度不能和新样本组成"反转"
        detector.drag_start();
        assert_eq!(detector.state().last_velocity, Velocity::ZERO);
        assert_eq!(detector.on_motion_sample(&MotionSample::at_millis(-2000.0, 0.0, 50)), None);
    }

    #[test]
    fn test_drag_start_keeps_cooldown() {
        let mut detector = ShakeDetector::default();
        feed(
            &mut detector,
            &[
                MotionSample::at_millis(2000.0, 0.0, 0),
                MotionSample::at_millis(-2000.0, 0.0, 100),
            ],
        );

        detector.drag_start();
        let events = feed(
            &mut detector,
            &[
                MotionSample::at_millis(2000.0, 0.0, 300),
                MotionSample::at_millis(-2000.0, 0.0, 400),
            ],
        );
        assert!(events.is_empty());
    }

    #[test]
    fn test_custom_config() {
        let mut detector = ShakeDetector::new(ShakeConfig {
            velocity_threshold: 100.0,
            cooldown: Duration::from_millis(10),
        });
        let events = feed(
            &mut detector,
            &[
                MotionSample::at_millis(0.0, 200.0, 0),
                MotionSample::at_millis(0.0, -200.0, 5),
                MotionSample::at_millis(0.0, 200.0, 20),
            ],
        );
        assert_eq!(events.len(), 2);
    }
}
