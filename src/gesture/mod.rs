//! 手势层
//!
//! - `shake_detector` - 纯函数形式的摇晃检测
//! - `shake_retry` - 把检测结果接到编排器的单项重试上

pub mod shake_detector;
pub mod shake_retry;

pub use shake_detector::{
    reduce, DetectorState, MotionSample, RetryEvent, ShakeConfig, ShakeDetector, Velocity,
};
pub use shake_retry::ShakeRetry;
