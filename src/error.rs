use std::path::PathBuf;

use thiserror::Error;

use crate::models::Period;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 单个年代的生成失败（核心层唯一的错误种类）
    #[error("年代 {period} 生成失败: {reason}")]
    GenerationFailed { period: Period, reason: String },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 源图片错误
    #[error("源图片错误: {0}")]
    SourceImage(#[from] SourceImageError),
}

/// 图像生成错误
///
/// 由外部生成调用产生，原样记录到对应任务的 `Failed` 状态中
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// 请求失败（网络、鉴权、服务端错误等）
    #[error("图像生成请求失败: {0}")]
    Request(String),

    /// 模型返回了内容，但其中没有图像
    #[error("模型未返回图像: {0}")]
    NoImage(String),

    /// 生成任务在执行过程中 panic
    #[error("图像生成任务异常终止: {0}")]
    Panicked(String),

    /// 其他错误，消息原样透传
    #[error("{0}")]
    Other(String),
}

impl GenerationError {
    /// 用任意消息创建错误
    pub fn message(msg: impl Into<String>) -> Self {
        GenerationError::Other(msg.into())
    }

    /// 判断错误是否像是暂时性的（服务端 5xx、限流、过载）
    pub fn is_transient(&self) -> bool {
        match self {
            GenerationError::Request(msg) => {
                let msg = msg.to_lowercase();
                ["500", "502", "503", "429", "internal", "rate limit", "overloaded", "unavailable"]
                    .iter()
                    .any(|needle| msg.contains(needle))
            }
            _ => false,
        }
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// 源图片错误
#[derive(Debug, Error)]
pub enum SourceImageError {
    /// 读取文件失败
    #[error("读取图片失败 ({path}): {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 文件为空
    #[error("图片文件为空: {path}")]
    Empty { path: PathBuf },

    /// 不支持的图片格式
    #[error("不支持的图片格式: {path}")]
    UnsupportedFormat { path: PathBuf },
}

/// 应用程序结果类型
pub type Result<T> = std::result::Result<T, AppError>;
